//! Nominatim / OpenStreetMap reverse geocoder client.
//!
//! Nominatim has strict rate limits: **1 request per second** maximum on
//! the public instance, and every request must carry an identifying
//! `User-Agent`. The client serializes requests behind a minimum delay
//! (`rate_limit_ms` in the service TOML configuration).
//!
//! See <https://nominatim.org/release-docs/develop/api/Reverse/>

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{GeocodeError, ReverseGeocoder};

/// Address keys that name a locality, most specific first.
const LOCALITY_KEYS: &[&str] = &["city", "town", "village", "municipality"];

/// Reverse geocoder backed by a Nominatim `/reverse` endpoint.
pub struct NominatimReverse {
    client: reqwest::Client,
    base_url: String,
    rate_limit: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl NominatimReverse {
    /// Creates a client for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, rate_limit_ms: u64, user_agent: &str) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            rate_limit: Duration::from_millis(rate_limit_ms),
            last_request: Mutex::new(None),
        })
    }

    /// Waits until at least `rate_limit` has passed since the previous
    /// request. Concurrent callers queue on the lock.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.rate_limit {
                tokio::time::sleep(self.rate_limit - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimReverse {
    fn name(&self) -> &str {
        "nominatim"
    }

    fn concurrency_limit(&self) -> Option<usize> {
        Some(1)
    }

    async fn resolve_city(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<String>, GeocodeError> {
        self.throttle().await;

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("format", "jsonv2".to_string()),
                ("zoom", "10".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

/// Parses a Nominatim reverse JSON response.
///
/// Nominatim answers `{"error": "Unable to geocode"}` for coordinates in
/// the sea or otherwise outside any feature; that is a miss, not an error.
fn parse_response(body: &serde_json::Value) -> Result<Option<String>, GeocodeError> {
    if body.get("error").is_some() {
        return Ok(None);
    }

    let address = body
        .get("address")
        .and_then(serde_json::Value::as_object)
        .ok_or_else(|| GeocodeError::Parse {
            message: "Nominatim response missing 'address' object".to_string(),
        })?;

    Ok(LOCALITY_KEYS
        .iter()
        .find_map(|key| address.get(*key).and_then(serde_json::Value::as_str))
        .map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_city() {
        let body = serde_json::json!({
            "display_name": "Braamfontein, Johannesburg, Gauteng, South Africa",
            "address": {
                "suburb": "Braamfontein",
                "city": "Johannesburg",
                "state": "Gauteng",
                "country": "South Africa"
            }
        });
        assert_eq!(
            parse_response(&body).unwrap().as_deref(),
            Some("Johannesburg")
        );
    }

    #[test]
    fn falls_back_to_town() {
        let body = serde_json::json!({
            "address": { "town": "Knysna", "country": "South Africa" }
        });
        assert_eq!(parse_response(&body).unwrap().as_deref(), Some("Knysna"));
    }

    #[test]
    fn no_locality_is_none() {
        let body = serde_json::json!({
            "address": { "state": "Northern Cape", "country": "South Africa" }
        });
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn unable_to_geocode_is_none() {
        let body = serde_json::json!({ "error": "Unable to geocode" });
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn missing_address_is_parse_error() {
        let body = serde_json::json!({ "lat": "1.0" });
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::Parse { .. })
        ));
    }
}
