//! Top-K city ranking with an "Other" remainder.

use std::cmp::Reverse;

use disease_map_heatmap_models::{CityBucket, OTHER_ENTRY, RankedEntry};

/// Default number of individually ranked cities.
pub const DEFAULT_TOP_K: usize = 5;

/// Ranks buckets by count and folds everything past `top_k` into a single
/// trailing "Other" entry.
///
/// The sort is stable, so equal counts keep their input order. "Other" is
/// always appended, even when it sums to zero; dropping an empty slice is
/// left to the caller (see [`without_empty_other`]). Percentages are each
/// entry's rounded share of the grand total, or 0 when the total is 0.
#[must_use]
pub fn summarize(buckets: &[CityBucket], top_k: usize) -> Vec<RankedEntry> {
    let mut sorted: Vec<&CityBucket> = buckets.iter().collect();
    sorted.sort_by_key(|b| Reverse(b.count));

    let other: u64 = sorted.iter().skip(top_k).map(|b| b.count).sum();

    let mut values: Vec<(String, u64)> = sorted
        .iter()
        .take(top_k)
        .map(|b| (b.city.clone(), b.count))
        .collect();
    values.push((OTHER_ENTRY.to_string(), other));

    let total: u64 = values.iter().map(|(_, v)| v).sum();

    values
        .into_iter()
        .map(|(name, value)| RankedEntry {
            name,
            value,
            percent: percent_of(value, total),
        })
        .collect()
}

/// Drops the trailing "Other" entry when it is zero.
///
/// Pie charts should call this so an empty remainder doesn't render as a
/// spurious slice.
#[must_use]
pub fn without_empty_other(mut entries: Vec<RankedEntry>) -> Vec<RankedEntry> {
    if entries.last().is_some_and(|e| e.is_other() && e.value == 0) {
        entries.pop();
    }
    entries
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn percent_of(value: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    (value as f64 / total as f64 * 100.0).round() as u8
}
