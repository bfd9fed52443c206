#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Heat-map aggregation pipeline for disease reports.
//!
//! Turns raw per-coordinate report counts into two independent outputs:
//!
//! - **Rendering**: proximity clusters ([`cluster`]) scaled to bounded
//!   heat-layer intensities ([`intensity`]).
//! - **Reporting**: clusters summed per resolved city ([`aggregate`]) and
//!   ranked into a top-K-plus-"Other" summary ([`rank`]), exportable as
//!   CSV ([`export`]).
//!
//! [`pipeline`] sequences the stages behind a single call, fanning out the
//! reverse-geocoding lookups with bounded concurrency. Every other stage is
//! a pure, synchronous function of its input.

pub mod aggregate;
pub mod cluster;
pub mod config;
pub mod export;
pub mod group;
pub mod intensity;
pub mod pipeline;
pub mod progress;
pub mod rank;

use thiserror::Error;

pub use config::HeatmapConfig;
pub use pipeline::{build_heatmap_view, build_view_from_geocoded};

/// Errors from configuration loading and CSV export.
#[derive(Debug, Error)]
pub enum HeatmapError {
    /// Filesystem or writer failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid TOML for [`HeatmapConfig`].
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A configuration value is out of range or unparseable.
    #[error("Invalid config value for {key}: {message}")]
    InvalidConfig {
        /// Setting name (TOML key or environment variable).
        key: String,
        /// What is wrong with it.
        message: String,
    },
}
