//! Heat-layer intensity scaling.
//!
//! Counts are scaled relative to the largest cluster and multiplied by a
//! scaling factor, so anything at or above `1 / scaling_factor` of the
//! peak renders at full intensity. A floor keeps single reports visible.

use disease_map_diagnosis_models::has_valid_coordinates;
use disease_map_heatmap_models::{Cluster, RenderPoint};

/// Default multiplier applied to `count / max_count`.
pub const DEFAULT_SCALING_FACTOR: f64 = 5.0;

/// Default lower bound for any rendered intensity.
pub const DEFAULT_MIN_INTENSITY: f64 = 0.1;

/// Maps clusters to `(latitude, longitude, intensity)` samples.
///
/// Clusters with non-finite coordinates are dropped. The peak count is
/// taken over every cluster passed in. When the peak is zero every sample
/// gets `min_intensity` instead of dividing by zero.
#[must_use]
pub fn normalize(clusters: &[Cluster], scaling_factor: f64, min_intensity: f64) -> Vec<RenderPoint> {
    let Some(max_count) = clusters.iter().map(|c| c.count).max() else {
        return Vec::new();
    };

    clusters
        .iter()
        .filter(|c| has_valid_coordinates(c.latitude, c.longitude))
        .map(|c| {
            RenderPoint(
                c.latitude,
                c.longitude,
                intensity(c.count, max_count, scaling_factor, min_intensity),
            )
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn intensity(count: u64, max_count: u64, scaling_factor: f64, min_intensity: f64) -> f64 {
    if max_count == 0 {
        return min_intensity;
    }

    let scaled = count as f64 / max_count as f64 * scaling_factor;
    scaled.max(min_intensity).min(1.0)
}
