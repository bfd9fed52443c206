//! Pipeline tuning knobs.
//!
//! Defaults reproduce the map's long-standing behavior. A TOML file can
//! override any subset of fields, and `HEATMAP_*` environment variables
//! override the file:
//!
//! ```toml
//! proximity_threshold = 0.02
//! top_k = 10
//! geocode_concurrency = 4
//! ```

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::HeatmapError;
use crate::cluster::DEFAULT_PROXIMITY_THRESHOLD;
use crate::intensity::{DEFAULT_MIN_INTENSITY, DEFAULT_SCALING_FACTOR};
use crate::rank::DEFAULT_TOP_K;

/// Configuration for one heat-map build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    /// Merge distance for clustering, in degrees.
    pub proximity_threshold: f64,
    /// Multiplier applied to `count / max_count`.
    pub scaling_factor: f64,
    /// Floor for rendered intensities, in `(0, 1]`.
    pub min_intensity: f64,
    /// Number of individually ranked cities before "Other".
    pub top_k: usize,
    /// Maximum reverse-geocoding lookups in flight.
    pub geocode_concurrency: usize,
    /// Per-lookup timeout in milliseconds.
    pub geocode_timeout_ms: u64,
    /// Decimal places used to key the geocode cache.
    pub cache_precision: u8,
    /// Most coordinates the geocode cache keeps before evicting.
    pub cache_capacity: usize,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: DEFAULT_PROXIMITY_THRESHOLD,
            scaling_factor: DEFAULT_SCALING_FACTOR,
            min_intensity: DEFAULT_MIN_INTENSITY,
            top_k: DEFAULT_TOP_K,
            geocode_concurrency: 8,
            geocode_timeout_ms: 5_000,
            cache_precision: 4,
            cache_capacity: 10_000,
        }
    }
}

impl HeatmapConfig {
    /// Loads defaults, then the TOML file at `path` (if any), then
    /// `HEATMAP_*` environment overrides, and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`HeatmapError`] if the file cannot be read or parsed, an
    /// environment override is unparseable, or a value is out of range.
    pub fn load(path: Option<&Path>) -> Result<Self, HeatmapError> {
        let mut config = match path {
            Some(path) => {
                log::info!("Loading heat-map config from {}", path.display());
                Self::from_toml_str(&std::fs::read_to_string(path)?)?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`HeatmapError::Toml`] if the document is malformed.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, HeatmapError> {
        Ok(toml::de::from_str(toml_str)?)
    }

    /// Applies overrides from a variable lookup (normally the process
    /// environment).
    ///
    /// # Errors
    ///
    /// Returns [`HeatmapError::InvalidConfig`] if a set variable cannot be
    /// parsed.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), HeatmapError> {
        override_from(&lookup, "HEATMAP_PROXIMITY_THRESHOLD", &mut self.proximity_threshold)?;
        override_from(&lookup, "HEATMAP_SCALING_FACTOR", &mut self.scaling_factor)?;
        override_from(&lookup, "HEATMAP_MIN_INTENSITY", &mut self.min_intensity)?;
        override_from(&lookup, "HEATMAP_TOP_K", &mut self.top_k)?;
        override_from(&lookup, "HEATMAP_GEOCODE_CONCURRENCY", &mut self.geocode_concurrency)?;
        override_from(&lookup, "HEATMAP_GEOCODE_TIMEOUT_MS", &mut self.geocode_timeout_ms)?;
        override_from(&lookup, "HEATMAP_CACHE_PRECISION", &mut self.cache_precision)?;
        override_from(&lookup, "HEATMAP_CACHE_CAPACITY", &mut self.cache_capacity)?;
        Ok(())
    }

    /// Checks that every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`HeatmapError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), HeatmapError> {
        if !self.proximity_threshold.is_finite() || self.proximity_threshold < 0.0 {
            return Err(invalid("proximity_threshold", "must be a non-negative number"));
        }
        if !self.scaling_factor.is_finite() || self.scaling_factor <= 0.0 {
            return Err(invalid("scaling_factor", "must be a positive number"));
        }
        if !(self.min_intensity > 0.0 && self.min_intensity <= 1.0) {
            return Err(invalid("min_intensity", "must be in (0, 1]"));
        }
        if self.geocode_concurrency == 0 {
            return Err(invalid("geocode_concurrency", "must be at least 1"));
        }
        if self.geocode_timeout_ms == 0 {
            return Err(invalid("geocode_timeout_ms", "must be at least 1"));
        }
        if self.cache_precision > 10 {
            return Err(invalid("cache_precision", "must be at most 10"));
        }
        Ok(())
    }

    /// Per-lookup geocoding timeout.
    #[must_use]
    pub const fn geocode_timeout(&self) -> Duration {
        Duration::from_millis(self.geocode_timeout_ms)
    }
}

fn override_from<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) -> Result<(), HeatmapError> {
    let Some(raw) = lookup(key) else {
        return Ok(());
    };

    *target = raw
        .trim()
        .parse()
        .map_err(|_| invalid(key, &format!("cannot parse {raw:?}")))?;
    log::debug!("{key} overridden from environment");
    Ok(())
}

fn invalid(key: &str, message: &str) -> HeatmapError {
    HeatmapError::InvalidConfig {
        key: key.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn defaults_match_map_behavior() {
        let config = HeatmapConfig::default();
        assert!((config.proximity_threshold - 0.01).abs() < f64::EPSILON);
        assert!((config.scaling_factor - 5.0).abs() < f64::EPSILON);
        assert!((config.min_intensity - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.top_k, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = HeatmapConfig::from_toml_str("proximity_threshold = 0.05\ntop_k = 3\n").unwrap();
        assert!((config.proximity_threshold - 0.05).abs() < f64::EPSILON);
        assert_eq!(config.top_k, 3);
        assert_eq!(config.geocode_concurrency, 8);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(matches!(
            HeatmapConfig::from_toml_str("top_k = \"five\""),
            Err(HeatmapError::Toml(_))
        ));
    }

    #[test]
    fn overrides_replace_values() {
        let vars: BTreeMap<&str, &str> = [
            ("HEATMAP_TOP_K", "10"),
            ("HEATMAP_PROXIMITY_THRESHOLD", " 0.002 "),
        ]
        .into_iter()
        .collect();

        let mut config = HeatmapConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(ToString::to_string))
            .unwrap();

        assert_eq!(config.top_k, 10);
        assert!((config.proximity_threshold - 0.002).abs() < f64::EPSILON);
        assert_eq!(config.geocode_timeout_ms, 5_000);
    }

    #[test]
    fn unparseable_override_names_the_variable() {
        let mut config = HeatmapConfig::default();
        let err = config
            .apply_overrides(|key| (key == "HEATMAP_GEOCODE_CONCURRENCY").then(|| "many".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("HEATMAP_GEOCODE_CONCURRENCY"));
    }

    #[test]
    fn validation_rejects_out_of_range() {
        let config = HeatmapConfig {
            min_intensity: 1.5,
            ..HeatmapConfig::default()
        };
        assert!(config.validate().is_err());

        let config = HeatmapConfig {
            geocode_concurrency: 0,
            ..HeatmapConfig::default()
        };
        assert!(config.validate().is_err());

        let config = HeatmapConfig {
            proximity_threshold: f64::NAN,
            ..HeatmapConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let config = HeatmapConfig::load(None).unwrap();
        assert_eq!(config.cache_precision, 4);
        assert_eq!(config.cache_capacity, 10_000);
    }
}
