//! Grouping of raw diagnosis records into per-coordinate report points.
//!
//! This is the in-memory counterpart of the database heat-map query: it
//! lets the CLI and tests build [`ReportPoint`]s from a flat export of the
//! diagnoses table.

use std::collections::{BTreeMap, BTreeSet};

use disease_map_diagnosis_models::{DiagnosisRecord, ReportPoint};

/// Bit pattern of a coordinate, with `-0.0` folded into `0.0` so the two
/// group together the way SQL equality does.
fn coordinate_key(value: f64) -> u64 {
    if value == 0.0 { 0.0_f64 } else { value }.to_bits()
}

/// Groups the records of one disease by exact coordinate.
///
/// Records without both coordinates are skipped. Each output point counts
/// the distinct users who reported at that coordinate, and points appear
/// in the order their coordinate was first seen.
#[must_use]
pub fn group_reports(records: &[DiagnosisRecord], disease_name: &str) -> Vec<ReportPoint> {
    let mut groups: Vec<(f64, f64, BTreeSet<i64>)> = Vec::new();
    let mut index: BTreeMap<(u64, u64), usize> = BTreeMap::new();

    for record in records.iter().filter(|r| r.disease_name == disease_name) {
        let (Some(latitude), Some(longitude)) = (record.latitude, record.longitude) else {
            continue;
        };

        let key = (coordinate_key(latitude), coordinate_key(longitude));
        let i = *index.entry(key).or_insert_with(|| {
            groups.push((latitude, longitude, BTreeSet::new()));
            groups.len() - 1
        });
        groups[i].2.insert(record.user_id);
    }

    groups
        .into_iter()
        .map(|(latitude, longitude, users)| ReportPoint {
            latitude,
            longitude,
            count: users.len() as u64,
            disease_name: disease_name.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user_id: i64, disease: &str, coords: Option<(f64, f64)>) -> DiagnosisRecord {
        DiagnosisRecord {
            user_id,
            disease_name: disease.to_string(),
            latitude: coords.map(|c| c.0),
            longitude: coords.map(|c| c.1),
        }
    }

    #[test]
    fn counts_distinct_users_per_coordinate() {
        let records = [
            record(1, "Malaria", Some((-25.74, 28.19))),
            record(1, "Malaria", Some((-25.74, 28.19))),
            record(2, "Malaria", Some((-25.74, 28.19))),
            record(3, "Malaria", Some((-33.92, 18.42))),
        ];
        let points = group_reports(&records, "Malaria");

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].count, 2);
        assert_eq!(points[1].count, 1);
        assert!((points[1].latitude + 33.92).abs() < f64::EPSILON);
    }

    #[test]
    fn filters_by_disease_and_skips_untagged() {
        let records = [
            record(1, "Malaria", Some((-25.74, 28.19))),
            record(2, "Cholera", Some((-25.74, 28.19))),
            record(3, "Malaria", None),
            DiagnosisRecord {
                user_id: 4,
                disease_name: "Malaria".to_string(),
                latitude: Some(-25.74),
                longitude: None,
            },
        ];
        let points = group_reports(&records, "Malaria");

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].count, 1);
        assert_eq!(points[0].disease_name, "Malaria");
    }

    #[test]
    fn negative_zero_groups_with_zero() {
        let records = [
            record(1, "Zika", Some((0.0, 10.0))),
            record(2, "Zika", Some((-0.0, 10.0))),
        ];
        let points = group_reports(&records, "Zika");

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].count, 2);
    }

    #[test]
    fn unknown_disease_yields_nothing() {
        let records = [record(1, "Malaria", Some((1.0, 1.0)))];
        assert!(group_reports(&records, "Polio").is_empty());
    }
}
