#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reverse geocoding for disease map reports.
//!
//! Resolves a report coordinate to the name of the city (locality) it
//! falls in. Providers are configured via TOML files in `services/`:
//!
//! 1. **Google Geocoding API** (priority 1): requires an API key in
//!    `GOOGLE_MAPS_API_KEY`; skipped when the key is absent.
//! 2. **Nominatim / OpenStreetMap** (priority 2): free, roughly 1 req/sec.
//!
//! The heat-map pipeline never sees a provider error: every failure is
//! folded into [`UNKNOWN_CITY`] by [`resolve_city_or_unknown`]. A
//! [`cache::CachingGeocoder`] can be layered on top of any provider to
//! avoid repeated lookups for the same rounded coordinate.

pub mod cache;
pub mod google;
pub mod nominatim;
pub mod service_registry;

use std::sync::Arc;

use async_trait::async_trait;
use disease_map_diagnosis_models::UNKNOWN_CITY;
use thiserror::Error;

/// Errors from reverse geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Provider is misconfigured (e.g. missing API key).
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },
}

/// Maps a coordinate to a city name.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Short provider identifier used in log lines.
    fn name(&self) -> &str;

    /// Most lookups this provider should have in flight at once, if it
    /// throttles itself.
    fn concurrency_limit(&self) -> Option<usize> {
        None
    }

    /// Resolves the city containing `(latitude, longitude)`.
    ///
    /// Returns `Ok(None)` when the provider answered but found no locality.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the provider could not be reached or
    /// its response could not be understood.
    async fn resolve_city(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<String>, GeocodeError>;
}

#[async_trait]
impl<T: ReverseGeocoder + ?Sized> ReverseGeocoder for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn concurrency_limit(&self) -> Option<usize> {
        (**self).concurrency_limit()
    }

    async fn resolve_city(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<String>, GeocodeError> {
        (**self).resolve_city(latitude, longitude).await
    }
}

/// A geocoder that never resolves anything.
///
/// Used for offline runs: every point lands in [`UNKNOWN_CITY`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Unresolved;

#[async_trait]
impl ReverseGeocoder for Unresolved {
    fn name(&self) -> &str {
        "unresolved"
    }

    async fn resolve_city(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Option<String>, GeocodeError> {
        Ok(None)
    }
}

/// Resolves a city, degrading any error or missing locality to
/// [`UNKNOWN_CITY`].
pub async fn resolve_city_or_unknown(
    geocoder: &dyn ReverseGeocoder,
    latitude: f64,
    longitude: f64,
) -> String {
    match geocoder.resolve_city(latitude, longitude).await {
        Ok(Some(city)) if !city.trim().is_empty() => city,
        Ok(_) => {
            log::debug!(
                "{}: no locality for ({latitude}, {longitude})",
                geocoder.name()
            );
            UNKNOWN_CITY.to_string()
        }
        Err(e) => {
            log::warn!(
                "{}: reverse geocode failed for ({latitude}, {longitude}): {e}",
                geocoder.name()
            );
            UNKNOWN_CITY.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl ReverseGeocoder for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn resolve_city(&self, _: f64, _: f64) -> Result<Option<String>, GeocodeError> {
            Err(GeocodeError::RateLimited)
        }
    }

    struct Blank;

    #[async_trait]
    impl ReverseGeocoder for Blank {
        fn name(&self) -> &str {
            "blank"
        }

        async fn resolve_city(&self, _: f64, _: f64) -> Result<Option<String>, GeocodeError> {
            Ok(Some("  ".to_string()))
        }
    }

    #[tokio::test]
    async fn errors_degrade_to_unknown() {
        assert_eq!(
            resolve_city_or_unknown(&Failing, -26.2, 28.0).await,
            UNKNOWN_CITY
        );
    }

    #[tokio::test]
    async fn unresolved_and_blank_degrade_to_unknown() {
        assert_eq!(
            resolve_city_or_unknown(&Unresolved, -26.2, 28.0).await,
            UNKNOWN_CITY
        );
        assert_eq!(resolve_city_or_unknown(&Blank, 0.0, 0.0).await, UNKNOWN_CITY);
    }

    #[tokio::test]
    async fn arc_forwards_to_inner() {
        let shared: Arc<dyn ReverseGeocoder> = Arc::new(Unresolved);
        assert_eq!(shared.name(), "unresolved");
        assert!(shared.resolve_city(1.0, 2.0).await.unwrap().is_none());
    }
}
