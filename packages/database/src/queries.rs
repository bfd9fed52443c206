//! Diagnosis queries backing the heat map and the retention job.

use chrono::{DateTime, Utc};
use disease_map_diagnosis_models::{Disease, ReportPoint};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};

use crate::DbError;

/// Groups every geotagged diagnosis of `disease` by exact coordinate.
///
/// `count` is the number of distinct users reporting at that coordinate.
/// Rows come back in the order each coordinate was first reported, which
/// keeps the downstream clustering deterministic across requests.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be converted.
pub async fn heatmap_points(db: &dyn Database, disease: &str) -> Result<Vec<ReportPoint>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT latitude, longitude, COUNT(DISTINCT user_id) AS count
             FROM diagnoses
             WHERE diagnosis_name = $1
               AND latitude IS NOT NULL
               AND longitude IS NOT NULL
             GROUP BY latitude, longitude
             ORDER BY MIN(diagnosis_id)",
            &[DatabaseValue::String(disease.to_string())],
        )
        .await?;

    let mut points = Vec::with_capacity(rows.len());
    for row in &rows {
        let latitude: f64 = row.to_value("latitude").map_err(|e| DbError::Conversion {
            message: format!("Failed to parse latitude: {e}"),
        })?;
        let longitude: f64 = row.to_value("longitude").map_err(|e| DbError::Conversion {
            message: format!("Failed to parse longitude: {e}"),
        })?;
        let count: i64 = row.to_value("count").map_err(|e| DbError::Conversion {
            message: format!("Failed to parse count: {e}"),
        })?;

        points.push(ReportPoint {
            latitude,
            longitude,
            count: u64::try_from(count).map_err(|_| DbError::Conversion {
                message: format!("Negative report count: {count}"),
            })?,
            disease_name: disease.to_string(),
        });
    }

    log::debug!("Loaded {} heat-map points for {disease}", points.len());
    Ok(points)
}

/// Deletes diagnoses older than their disease's retention window.
///
/// Returns the total number of rows deleted.
///
/// # Errors
///
/// Returns [`DbError`] if any delete fails. Diseases processed before the
/// failure stay purged.
pub async fn purge_expired(db: &dyn Database, now: DateTime<Utc>) -> Result<u64, DbError> {
    let mut total = 0;

    for (disease, cutoff) in purge_cutoffs(now) {
        let deleted = db
            .exec_raw_params(
                "DELETE FROM diagnoses
                 WHERE diagnosis_name = $1
                   AND date_of_diagnosis < $2",
                &[
                    DatabaseValue::String(disease.to_string()),
                    DatabaseValue::DateTime(cutoff.naive_utc()),
                ],
            )
            .await?;

        if deleted > 0 {
            log::info!("Purged {deleted} expired {disease} diagnoses (before {cutoff})");
        }
        total += deleted;
    }

    Ok(total)
}

/// Cutoff per disease at `now`; diseases whose cutoff falls outside the
/// representable date range are skipped.
fn purge_cutoffs(now: DateTime<Utc>) -> Vec<(Disease, DateTime<Utc>)> {
    Disease::all()
        .iter()
        .filter_map(|&disease| {
            let cutoff = disease.retention().cutoff(now);
            if cutoff.is_none() {
                log::warn!("No representable retention cutoff for {disease}");
            }
            cutoff.map(|cutoff| (disease, cutoff))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    #[test]
    fn every_disease_gets_a_cutoff() {
        let now = Utc.with_ymd_and_hms(2024, 7, 23, 12, 0, 0).unwrap();
        let cutoffs = purge_cutoffs(now);

        assert_eq!(cutoffs.len(), Disease::all().len());
        assert!(cutoffs.iter().all(|(_, cutoff)| *cutoff < now));
    }

    #[test]
    fn cutoffs_follow_retention_windows() {
        let now = Utc.with_ymd_and_hms(2024, 7, 23, 12, 0, 0).unwrap();
        let cutoffs = purge_cutoffs(now);

        let malaria = cutoffs.iter().find(|(d, _)| *d == Disease::Malaria).unwrap().1;
        assert_eq!(malaria, Utc.with_ymd_and_hms(2024, 7, 17, 12, 0, 0).unwrap());

        let hiv = cutoffs.iter().find(|(d, _)| *d == Disease::HivAids).unwrap().1;
        assert_eq!(hiv, Utc.with_ymd_and_hms(2014, 7, 23, 12, 0, 0).unwrap());
    }
}
