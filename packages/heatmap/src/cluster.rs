//! Greedy first-fit proximity clustering.
//!
//! Points are visited in input order. Each one merges into the **first**
//! existing cluster (in creation order) whose current centroid lies within
//! the threshold, not the nearest one, so the result depends on input
//! order. This is a deliberate approximation: it is linear in the number
//! of clusters per point and matches what the map has always shown.
//!
//! Distances are Euclidean in raw degree space. The threshold is therefore
//! in degrees, and its ground distance shrinks in longitude away from the
//! equator.

use disease_map_diagnosis_models::GeoPoint;
use disease_map_heatmap_models::Cluster;

/// Default merge threshold in degrees (roughly 1.1 km of latitude).
pub const DEFAULT_PROXIMITY_THRESHOLD: f64 = 0.01;

/// Merges points into clusters whose centroids lie within `threshold`
/// degrees.
///
/// A cluster starts as a copy of the first point that matched no existing
/// cluster (city included). Each later merge moves its centroid to the
/// count-weighted mean and adds the point's count. Clusters are never
/// split or removed, so the summed count always equals the input's.
#[must_use]
pub fn cluster(points: &[GeoPoint], threshold: f64) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = Vec::new();

    for point in points {
        let target = clusters.iter_mut().find(|c| {
            distance(c.latitude, c.longitude, point.latitude, point.longitude) <= threshold
        });

        match target {
            Some(existing) => merge(existing, point),
            None => clusters.push(Cluster::from(point)),
        }
    }

    log::trace!(
        "Clustered {} points into {} clusters",
        points.len(),
        clusters.len()
    );
    clusters
}

/// Euclidean distance in degree space.
#[must_use]
pub fn distance(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    ((lat_a - lat_b).powi(2) + (lon_a - lon_b).powi(2)).sqrt()
}

#[allow(clippy::cast_precision_loss)]
fn merge(cluster: &mut Cluster, point: &GeoPoint) {
    let total = cluster.count + point.count;

    if total > 0 {
        let weight_c = cluster.count as f64;
        let weight_p = point.count as f64;
        let total = total as f64;
        cluster.latitude = cluster.latitude.mul_add(weight_c, point.latitude * weight_p) / total;
        cluster.longitude = cluster.longitude.mul_add(weight_c, point.longitude * weight_p) / total;
    }

    cluster.count = total;
}
