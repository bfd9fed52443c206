#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Disease taxonomy and diagnosis report point types.
//!
//! This crate defines the selectable diagnosis names shared by the API,
//! the CLI, and the persistence adapter, along with the raw point types
//! that feed the heat-map pipeline.

use chrono::{DateTime, Days, Months, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// City name used whenever reverse geocoding fails or yields no locality.
pub const UNKNOWN_CITY: &str = "Unknown";

/// A reportable disease.
///
/// The string form (used in the database, the API and CSV inputs) is the
/// display name shown to users, e.g. `"HIV-AIDS"` or `"Hepatitis A"`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Disease {
    #[serde(rename = "HIV-AIDS")]
    #[strum(serialize = "HIV-AIDS")]
    HivAids,
    Tuberculosis,
    Malaria,
    #[serde(rename = "COVID-19")]
    #[strum(serialize = "COVID-19")]
    Covid19,
    Cholera,
    Ebola,
    Zika,
    Measles,
    Mumps,
    Rubella,
    #[serde(rename = "Hepatitis A")]
    #[strum(serialize = "Hepatitis A")]
    HepatitisA,
    #[serde(rename = "Hepatitis B")]
    #[strum(serialize = "Hepatitis B")]
    HepatitisB,
    #[serde(rename = "Hepatitis C")]
    #[strum(serialize = "Hepatitis C")]
    HepatitisC,
    Dengue,
    #[serde(rename = "Yellow Fever")]
    #[strum(serialize = "Yellow Fever")]
    YellowFever,
    Polio,
    /// Diagnoses that don't match any listed disease
    Other,
}

impl Disease {
    /// Returns all variants of this enum, in menu order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::HivAids,
            Self::Tuberculosis,
            Self::Malaria,
            Self::Covid19,
            Self::Cholera,
            Self::Ebola,
            Self::Zika,
            Self::Measles,
            Self::Mumps,
            Self::Rubella,
            Self::HepatitisA,
            Self::HepatitisB,
            Self::HepatitisC,
            Self::Dengue,
            Self::YellowFever,
            Self::Polio,
            Self::Other,
        ]
    }

    /// How long diagnoses of this disease are kept before the retention
    /// job deletes them.
    #[must_use]
    pub const fn retention(self) -> Retention {
        match self {
            Self::HivAids | Self::HepatitisB | Self::HepatitisC => Retention::Years(10),
            Self::Tuberculosis | Self::Polio => Retention::Months(6),
            Self::HepatitisA => Retention::Months(3),
            Self::Other => Retention::Months(1),
            Self::Ebola => Retention::Days(21),
            Self::Covid19
            | Self::Measles
            | Self::Mumps
            | Self::Rubella
            | Self::Dengue
            | Self::YellowFever => Retention::Days(14),
            Self::Cholera | Self::Zika => Retention::Days(7),
            Self::Malaria => Retention::Days(6),
        }
    }
}

/// A retention window for stored diagnoses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Keep for this many days.
    Days(u32),
    /// Keep for this many calendar months.
    Months(u32),
    /// Keep for this many calendar years.
    Years(u32),
}

impl std::fmt::Display for Retention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Days(n) => write!(f, "{n} days"),
            Self::Months(n) => write!(f, "{n} months"),
            Self::Years(n) => write!(f, "{n} years"),
        }
    }
}

impl Retention {
    /// Returns the oldest diagnosis date still retained at `now`.
    ///
    /// Returns `None` if the subtraction would leave chrono's supported
    /// date range.
    #[must_use]
    pub fn cutoff(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Days(n) => now.checked_sub_days(Days::new(u64::from(n))),
            Self::Months(n) => now.checked_sub_months(Months::new(n)),
            Self::Years(n) => now.checked_sub_months(Months::new(n.saturating_mul(12))),
        }
    }
}

/// A raw diagnosis row as supplied by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisRecord {
    /// Reporting user.
    pub user_id: i64,
    /// Diagnosis name (see [`Disease`] for the selectable values).
    pub disease_name: String,
    /// Latitude, if the report was geotagged.
    pub latitude: Option<f64>,
    /// Longitude, if the report was geotagged.
    pub longitude: Option<f64>,
}

/// One distinct reported coordinate for a disease.
///
/// `count` is the number of distinct users who reported the disease at
/// exactly this coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Number of distinct reporting users.
    pub count: u64,
    /// Diagnosis name the point was selected by.
    pub disease_name: String,
}

impl ReportPoint {
    /// Whether this point can enter the clustering pipeline: finite
    /// coordinates and a non-zero count.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        has_valid_coordinates(self.latitude, self.longitude) && self.count > 0
    }
}

/// A [`ReportPoint`] annotated with its reverse-geocoded city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Number of distinct reporting users.
    pub count: u64,
    /// Diagnosis name.
    pub disease_name: String,
    /// Resolved city, or [`UNKNOWN_CITY`].
    pub city: String,
}

impl GeoPoint {
    /// Attaches a resolved city to a report point.
    #[must_use]
    pub fn new(point: ReportPoint, city: impl Into<String>) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
            count: point.count,
            disease_name: point.disease_name,
            city: city.into(),
        }
    }

    /// Attaches [`UNKNOWN_CITY`] to a report point.
    #[must_use]
    pub fn unknown(point: ReportPoint) -> Self {
        Self::new(point, UNKNOWN_CITY)
    }
}

/// Returns `true` if both coordinates are finite numbers.
#[must_use]
pub const fn has_valid_coordinates(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite() && longitude.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    #[test]
    fn disease_names_round_trip_through_strum() {
        for disease in Disease::all() {
            let name = disease.to_string();
            let parsed: Disease = name.parse().unwrap();
            assert_eq!(parsed, *disease, "{name} did not parse back");
        }
    }

    #[test]
    fn disease_serde_matches_display_name() {
        let json = serde_json::to_string(&Disease::HepatitisA).unwrap();
        assert_eq!(json, "\"Hepatitis A\"");
        assert_eq!(Disease::HivAids.as_ref(), "HIV-AIDS");
        assert_eq!(Disease::Covid19.to_string(), "COVID-19");
    }

    #[test]
    fn all_lists_every_menu_option() {
        assert_eq!(Disease::all().len(), 17);
        assert_eq!(Disease::all().last(), Some(&Disease::Other));
    }

    #[test]
    fn retention_cutoffs() {
        let now = Utc.with_ymd_and_hms(2024, 7, 23, 12, 0, 0).unwrap();
        assert_eq!(
            Disease::Malaria.retention().cutoff(now),
            Some(Utc.with_ymd_and_hms(2024, 7, 17, 12, 0, 0).unwrap())
        );
        assert_eq!(
            Disease::Tuberculosis.retention().cutoff(now),
            Some(Utc.with_ymd_and_hms(2024, 1, 23, 12, 0, 0).unwrap())
        );
        assert_eq!(
            Disease::HivAids.retention().cutoff(now),
            Some(Utc.with_ymd_and_hms(2014, 7, 23, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn retention_displays_with_unit() {
        assert_eq!(Disease::Ebola.retention().to_string(), "21 days");
        assert_eq!(Disease::HepatitisC.retention().to_string(), "10 years");
    }

    #[test]
    fn point_validity() {
        let mut point = ReportPoint {
            latitude: -26.2,
            longitude: 28.04,
            count: 1,
            disease_name: "Malaria".to_string(),
        };
        assert!(point.is_valid());

        point.count = 0;
        assert!(!point.is_valid());

        point.count = 2;
        point.latitude = f64::NAN;
        assert!(!point.is_valid());

        point.latitude = -26.2;
        point.longitude = f64::INFINITY;
        assert!(!point.is_valid());
    }

    #[test]
    fn unknown_geo_point_keeps_count() {
        let point = ReportPoint {
            latitude: 1.0,
            longitude: 2.0,
            count: 3,
            disease_name: "Zika".to_string(),
        };
        let geo = GeoPoint::unknown(point);
        assert_eq!(geo.city, UNKNOWN_CITY);
        assert_eq!(geo.count, 3);
    }
}
