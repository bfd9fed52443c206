//! Per-city aggregation of points or clusters.

use std::collections::BTreeMap;

use disease_map_heatmap_models::{CityBucket, CityPoint};

/// Sums counts per distinct city name.
///
/// Buckets come out in the order their city was first seen. Each bucket's
/// coordinates are those of the first point seen for that city; they are
/// not re-averaged as more points are added.
#[must_use]
pub fn aggregate_by_city<P: CityPoint>(points: &[P]) -> Vec<CityBucket> {
    let mut buckets: Vec<CityBucket> = Vec::new();
    let mut index: BTreeMap<&str, usize> = BTreeMap::new();

    for point in points {
        if let Some(&i) = index.get(point.city()) {
            buckets[i].count += point.count();
        } else {
            index.insert(point.city(), buckets.len());
            buckets.push(CityBucket {
                city: point.city().to_string(),
                latitude: point.latitude(),
                longitude: point.longitude(),
                count: point.count(),
            });
        }
    }

    buckets
}
