#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types for the disease heat-map pipeline.
//!
//! Every type here is transient: it is rebuilt from raw report points on
//! each request and never persisted.

use disease_map_diagnosis_models::{GeoPoint, UNKNOWN_CITY};
use serde::{Deserialize, Serialize};

/// Name of the synthetic entry that folds every bucket beyond the top K.
pub const OTHER_ENTRY: &str = "Other";

/// A spatial grouping of nearby report points.
///
/// The centroid is the count-weighted running mean of every point merged
/// into the cluster; `count` is the sum of their counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Centroid latitude.
    pub latitude: f64,
    /// Centroid longitude.
    pub longitude: f64,
    /// Sum of merged point counts.
    pub count: u64,
    /// City of the point that seeded the cluster.
    pub city: Option<String>,
}

impl From<&GeoPoint> for Cluster {
    fn from(point: &GeoPoint) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
            count: point.count,
            city: Some(point.city.clone()),
        }
    }
}

/// Per-city sum of counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityBucket {
    /// Resolved city name.
    pub city: String,
    /// Latitude of the first point seen for this city.
    pub latitude: f64,
    /// Longitude of the first point seen for this city.
    pub longitude: f64,
    /// Summed count.
    pub count: u64,
}

/// One row of the top-K-plus-Other summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    /// City name, or [`OTHER_ENTRY`].
    pub name: String,
    /// Summed count.
    pub value: u64,
    /// Rounded share of the total, 0-100.
    pub percent: u8,
}

impl RankedEntry {
    /// Whether this is the synthetic "Other" entry.
    #[must_use]
    pub fn is_other(&self) -> bool {
        self.name == OTHER_ENTRY
    }
}

/// A heat-map sample: `(latitude, longitude, intensity)`.
///
/// Serializes as a three-element array, the shape heat-map layers expect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderPoint(pub f64, pub f64, pub f64);

impl RenderPoint {
    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.0
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.1
    }

    /// Rendering intensity.
    #[must_use]
    pub const fn intensity(&self) -> f64 {
        self.2
    }
}

/// Everything a map/report page needs for one disease selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapView {
    /// Heat-layer samples.
    pub render_points: Vec<RenderPoint>,
    /// Cluster centroids, for marker placement.
    pub clusters: Vec<Cluster>,
    /// All cities in first-seen order, unranked.
    pub city_buckets: Vec<CityBucket>,
    /// Top cities plus the "Other" entry.
    pub ranked: Vec<RankedEntry>,
}

/// Anything that carries a position, a count, and a resolved city.
///
/// Implemented for both [`GeoPoint`] and [`Cluster`] so that city
/// aggregation works on either stage of the pipeline.
pub trait CityPoint {
    /// Latitude in degrees.
    fn latitude(&self) -> f64;
    /// Longitude in degrees.
    fn longitude(&self) -> f64;
    /// Count carried by this point.
    fn count(&self) -> u64;
    /// City name; unresolved points report [`UNKNOWN_CITY`].
    fn city(&self) -> &str;
}

impl CityPoint for GeoPoint {
    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }

    fn count(&self) -> u64 {
        self.count
    }

    fn city(&self) -> &str {
        &self.city
    }
}

impl CityPoint for Cluster {
    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }

    fn count(&self) -> u64 {
        self.count
    }

    fn city(&self) -> &str {
        self.city.as_deref().unwrap_or(UNKNOWN_CITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_point_serializes_as_triple() {
        let json = serde_json::to_string(&RenderPoint(-26.2, 28.0, 0.5)).unwrap();
        assert_eq!(json, "[-26.2,28.0,0.5]");
    }

    #[test]
    fn cluster_without_city_reports_unknown() {
        let cluster = Cluster {
            latitude: 0.0,
            longitude: 0.0,
            count: 1,
            city: None,
        };
        assert_eq!(CityPoint::city(&cluster), UNKNOWN_CITY);
    }

    #[test]
    fn view_uses_camel_case() {
        let json = serde_json::to_value(HeatmapView::default()).unwrap();
        assert!(json.get("renderPoints").is_some());
        assert!(json.get("cityBuckets").is_some());
    }
}
