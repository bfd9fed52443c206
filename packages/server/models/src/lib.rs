#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the disease map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the pipeline types so the wire contract can evolve independently.

use disease_map_diagnosis_models::{Disease, ReportPoint};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// A selectable disease.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDisease {
    /// Display name, also the value to pass as `?disease=`.
    pub name: String,
    /// How long diagnoses are kept, e.g. `"14 days"`.
    pub retention: String,
}

impl From<Disease> for ApiDisease {
    fn from(disease: Disease) -> Self {
        Self {
            name: disease.to_string(),
            retention: disease.retention().to_string(),
        }
    }
}

/// Query parameters shared by the heat-map endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapQueryParams {
    /// Disease display name.
    pub disease: Option<String>,
}

impl HeatmapQueryParams {
    /// The requested disease, if present and non-blank.
    #[must_use]
    pub fn disease(&self) -> Option<&str> {
        self.disease
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

/// One grouped report coordinate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHeatmapPoint {
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Distinct users reporting at this coordinate.
    pub count: u64,
}

impl From<ReportPoint> for ApiHeatmapPoint {
    fn from(point: ReportPoint) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
            count: point.count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_disease_is_treated_as_missing() {
        let params = HeatmapQueryParams {
            disease: Some("   ".to_string()),
        };
        assert_eq!(params.disease(), None);

        let params = HeatmapQueryParams {
            disease: Some(" Malaria ".to_string()),
        };
        assert_eq!(params.disease(), Some("Malaria"));
    }

    #[test]
    fn disease_retention_is_human_readable() {
        let api = ApiDisease::from(Disease::HepatitisA);
        assert_eq!(api.name, "Hepatitis A");
        assert_eq!(api.retention, "3 months");
    }

    #[test]
    fn heatmap_point_omits_disease_name() {
        let point = ApiHeatmapPoint::from(ReportPoint {
            latitude: 1.5,
            longitude: -2.5,
            count: 3,
            disease_name: "Zika".to_string(),
        });
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "latitude": 1.5, "longitude": -2.5, "count": 3 })
        );
    }
}
