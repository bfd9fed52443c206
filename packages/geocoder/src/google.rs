//! Google Geocoding API reverse geocoder client.
//!
//! Issues `GET {base_url}?latlng={lat},{lng}&key={key}` and picks the
//! `long_name` of the first address component typed `locality` in the
//! first result.
//!
//! See <https://developers.google.com/maps/documentation/geocoding/requests-reverse-geocoding>

use async_trait::async_trait;

use crate::{GeocodeError, ReverseGeocoder};

/// Reverse geocoder backed by the Google Geocoding API.
pub struct GoogleReverse {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GoogleReverse {
    /// Creates a client for `base_url` authenticated with `api_key`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl ReverseGeocoder for GoogleReverse {
    fn name(&self) -> &str {
        "google"
    }

    async fn resolve_city(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<String>, GeocodeError> {
        let latlng = format!("{latitude},{longitude}");
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("latlng", latlng.as_str()), ("key", self.api_key.as_str())])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

/// Parses a Google Geocoding JSON response.
fn parse_response(body: &serde_json::Value) -> Result<Option<String>, GeocodeError> {
    let status = body
        .get("status")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("OK");

    match status {
        "OK" => {}
        "ZERO_RESULTS" => return Ok(None),
        "OVER_QUERY_LIMIT" => return Err(GeocodeError::RateLimited),
        other => {
            let detail = body
                .get("error_message")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("no error message");
            return Err(GeocodeError::Parse {
                message: format!("Google returned status {other}: {detail}"),
            });
        }
    }

    let Some(first) = body
        .get("results")
        .and_then(serde_json::Value::as_array)
        .and_then(|results| results.first())
    else {
        return Ok(None);
    };

    let components = first
        .get("address_components")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| GeocodeError::Parse {
            message: "Result missing 'address_components' array".to_string(),
        })?;

    Ok(components
        .iter()
        .find(|component| is_locality(component))
        .and_then(|component| component.get("long_name"))
        .and_then(serde_json::Value::as_str)
        .map(String::from))
}

fn is_locality(component: &serde_json::Value) -> bool {
    component
        .get("types")
        .and_then(serde_json::Value::as_array)
        .is_some_and(|types| types.iter().any(|t| t.as_str() == Some("locality")))
}
