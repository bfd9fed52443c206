//! Compile-time registry of reverse geocoding service configurations.
//!
//! Each provider is defined in a TOML file under `services/`. The
//! registry embeds these at compile time and exposes them via
//! [`all_services`] and [`enabled_services`]; [`default_geocoder`] turns
//! the highest-priority usable entry into a live client.

use std::sync::Arc;

use serde::Deserialize;

use crate::google::GoogleReverse;
use crate::nominatim::NominatimReverse;
use crate::{GeocodeError, ReverseGeocoder, Unresolved};

/// A geocoding service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Unique identifier (e.g., `"google"`, `"nominatim"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this service may be selected.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Selection order; lower values are tried first.
    pub priority: u32,
    /// Provider-specific configuration.
    pub provider: ProviderConfig,
}

/// Provider-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Google Geocoding API.
    Google {
        /// API base URL.
        base_url: String,
        /// Environment variable holding the API key.
        api_key_env: String,
    },
    /// Nominatim / `OpenStreetMap` reverse endpoint.
    Nominatim {
        /// API base URL (e.g., `"https://nominatim.openstreetmap.org/reverse"`).
        base_url: String,
        /// Minimum delay between requests in milliseconds.
        rate_limit_ms: u64,
        /// `User-Agent` sent with every request.
        user_agent: String,
    },
}

const fn default_true() -> bool {
    true
}

impl GeocodingService {
    /// Returns the provider's base URL regardless of variant.
    #[must_use]
    pub fn base_url(&self) -> &str {
        match &self.provider {
            ProviderConfig::Google { base_url, .. } | ProviderConfig::Nominatim { base_url, .. } => {
                base_url
            }
        }
    }

    /// Builds a live client for this service.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Config`] if a required API key is missing
    /// or empty, and [`GeocodeError::Http`] if the HTTP client cannot be
    /// built.
    pub fn build(&self) -> Result<Arc<dyn ReverseGeocoder>, GeocodeError> {
        match &self.provider {
            ProviderConfig::Google {
                base_url,
                api_key_env,
            } => {
                let api_key = std::env::var(api_key_env)
                    .ok()
                    .filter(|k| !k.is_empty())
                    .ok_or_else(|| GeocodeError::Config {
                        message: format!("{api_key_env} is not set"),
                    })?;
                let client = reqwest::Client::builder().build()?;
                Ok(Arc::new(GoogleReverse::new(client, base_url, api_key)))
            }
            ProviderConfig::Nominatim {
                base_url,
                rate_limit_ms,
                user_agent,
            } => Ok(Arc::new(NominatimReverse::new(
                base_url,
                *rate_limit_ms,
                user_agent,
            )?)),
        }
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SERVICE_TOMLS: &[(&str, &str)] = &[
    ("google", include_str!("../services/google.toml")),
    ("nominatim", include_str!("../services/nominatim.toml")),
];

#[cfg(test)]
const EXPECTED_SERVICE_COUNT: usize = 2;

/// Returns all geocoding service configurations (enabled and disabled).
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_services() -> Vec<GeocodingService> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse geocoding service '{name}': {e}"))
        })
        .collect()
}

/// Returns only enabled services, sorted by priority (ascending).
#[must_use]
pub fn enabled_services() -> Vec<GeocodingService> {
    let mut services: Vec<GeocodingService> =
        all_services().into_iter().filter(|s| s.enabled).collect();
    services.sort_by_key(|s| s.priority);
    services
}

/// Builds the highest-priority enabled service that can be constructed.
///
/// Services that fail to build (typically a missing API key) are skipped
/// with a warning. If none can be built, returns [`Unresolved`] so the
/// pipeline still runs with every city reported as unknown.
#[must_use]
pub fn default_geocoder() -> Arc<dyn ReverseGeocoder> {
    for service in enabled_services() {
        match service.build() {
            Ok(geocoder) => {
                log::info!("Using reverse geocoder: {}", service.name);
                return geocoder;
            }
            Err(e) => log::warn!("Skipping geocoder {}: {e}", service.id),
        }
    }

    log::warn!("No reverse geocoder available; all cities will be reported as unknown");
    Arc::new(Unresolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_services() {
        let services = all_services();
        assert_eq!(services.len(), EXPECTED_SERVICE_COUNT);
    }

    #[test]
    fn service_ids_are_unique() {
        let services = all_services();
        let mut seen = BTreeSet::new();
        for svc in &services {
            assert!(seen.insert(&svc.id), "Duplicate service ID: {}", svc.id);
        }
    }

    #[test]
    fn all_services_have_required_fields() {
        for svc in &all_services() {
            assert!(!svc.id.is_empty(), "Service has empty id");
            assert!(!svc.name.is_empty(), "Service {} has empty name", svc.id);
            assert!(
                !svc.base_url().is_empty(),
                "Service {} has empty base_url",
                svc.id
            );
        }
    }

    #[test]
    fn enabled_services_sorted_by_priority() {
        let services = enabled_services();
        for window in services.windows(2) {
            assert!(
                window[0].priority <= window[1].priority,
                "Services not sorted by priority: {} ({}) > {} ({})",
                window[0].id,
                window[0].priority,
                window[1].id,
                window[1].priority
            );
        }
    }

    #[test]
    fn google_without_key_is_config_error() {
        let svc = GeocodingService {
            id: "google-test".to_string(),
            name: "Google (test)".to_string(),
            enabled: true,
            priority: 1,
            provider: ProviderConfig::Google {
                base_url: "https://example.invalid/geocode/json".to_string(),
                api_key_env: "DISEASE_MAP_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            },
        };
        assert!(matches!(svc.build(), Err(GeocodeError::Config { .. })));
    }

    #[test]
    fn nominatim_builds_without_credentials() {
        let svc = all_services()
            .into_iter()
            .find(|s| s.id == "nominatim")
            .unwrap();
        let geocoder = svc.build().unwrap();
        assert_eq!(geocoder.name(), "nominatim");
    }
}
