//! End-to-end heat-map build.
//!
//! ```text
//! ReportPoint ─▶ validate ─▶ geocode (bounded, ordered) ─▶ cluster ─┬─▶ normalize ─▶ render points
//!                                                                   └─▶ aggregate ─▶ summarize ─▶ ranked
//! ```
//!
//! Only the geocoding step is async. Everything after it lives in
//! [`build_view_from_geocoded`] so callers with already-resolved points
//! (tests, offline tools) can skip the network entirely.

use std::sync::Arc;

use disease_map_diagnosis_models::{GeoPoint, ReportPoint, UNKNOWN_CITY};
use disease_map_geocoder::{ReverseGeocoder, resolve_city_or_unknown};
use disease_map_heatmap_models::HeatmapView;
use futures::StreamExt;
use futures::stream;

use crate::HeatmapConfig;
use crate::aggregate::aggregate_by_city;
use crate::cluster::cluster;
use crate::intensity::normalize;
use crate::progress::ProgressCallback;
use crate::rank::summarize;

/// Builds the full heat-map view for a set of raw report points.
///
/// Points with non-finite coordinates or a zero count are dropped before
/// geocoding. Every remaining point is resolved to a city with at most
/// `config.geocode_concurrency` lookups in flight; a lookup that fails or
/// exceeds `config.geocode_timeout_ms` is labelled "Unknown" and its count
/// is kept. Results are reassembled in input order, so clustering sees the
/// same sequence it would have seen had the lookups run one by one.
pub async fn build_heatmap_view(
    points: Vec<ReportPoint>,
    geocoder: &dyn ReverseGeocoder,
    config: &HeatmapConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> HeatmapView {
    let points = validate(points);
    log::info!(
        "Building heat map from {} points (geocoder: {})",
        points.len(),
        geocoder.name()
    );

    let geocoded = geocode_points(points, geocoder, config, progress).await;
    build_view_from_geocoded(&geocoded, config)
}

/// Runs the pure stages over points whose city is already known.
#[must_use]
pub fn build_view_from_geocoded(points: &[GeoPoint], config: &HeatmapConfig) -> HeatmapView {
    let clusters = cluster(points, config.proximity_threshold);
    let render_points = normalize(&clusters, config.scaling_factor, config.min_intensity);
    let city_buckets = aggregate_by_city(&clusters);
    let ranked = summarize(&city_buckets, config.top_k);

    log::debug!(
        "{} points -> {} clusters, {} cities",
        points.len(),
        clusters.len(),
        city_buckets.len()
    );

    HeatmapView {
        render_points,
        clusters,
        city_buckets,
        ranked,
    }
}

/// Resolves a city for every point, preserving input order.
///
/// A provider that throttles itself caps the number of lookups in flight,
/// so queued lookups don't spend their timeout waiting on the throttle.
pub async fn geocode_points(
    points: Vec<ReportPoint>,
    geocoder: &dyn ReverseGeocoder,
    config: &HeatmapConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Vec<GeoPoint> {
    progress.set_total(points.len() as u64);
    progress.set_message("Resolving cities".to_string());

    let timeout = config.geocode_timeout();
    let concurrency = geocoder
        .concurrency_limit()
        .map_or(config.geocode_concurrency, |limit| {
            limit.min(config.geocode_concurrency)
        })
        .max(1);

    let geocoded: Vec<GeoPoint> = stream::iter(points)
        .map(|point| async move {
            let lookup = resolve_city_or_unknown(geocoder, point.latitude, point.longitude);
            let geocoded = if let Ok(city) = tokio::time::timeout(timeout, lookup).await {
                GeoPoint::new(point, city)
            } else {
                log::warn!(
                    "Geocoding ({}, {}) timed out after {}ms",
                    point.latitude,
                    point.longitude,
                    timeout.as_millis()
                );
                GeoPoint::unknown(point)
            };
            progress.inc(1);
            geocoded
        })
        .buffered(concurrency)
        .collect()
        .await;

    let unknown = geocoded.iter().filter(|p| p.city == UNKNOWN_CITY).count();
    progress.finish(format!(
        "Resolved {} points ({unknown} unknown)",
        geocoded.len()
    ));

    geocoded
}

/// Drops points that cannot be placed or carry no cases.
fn validate(points: Vec<ReportPoint>) -> Vec<ReportPoint> {
    let before = points.len();
    let valid: Vec<ReportPoint> = points.into_iter().filter(ReportPoint::is_valid).collect();

    if valid.len() < before {
        log::warn!("Skipped {} invalid report points", before - valid.len());
    }

    valid
}
