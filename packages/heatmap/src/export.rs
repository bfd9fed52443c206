//! CSV exports of the city list and the ranked summary.
//!
//! Formats match the download buttons on the analytics page:
//!
//! - all cities: `City,Cases`
//! - ranked summary: `Name,Value,Percentage`, with a `%` suffix

use std::io::Write;

use disease_map_heatmap_models::{CityBucket, RankedEntry};

use crate::HeatmapError;

/// Suggested download name for the full city list.
#[must_use]
pub fn cities_file_name(disease_name: &str) -> String {
    format!("{disease_name}_all_cities.csv")
}

/// Suggested download name for the ranked summary.
#[must_use]
pub fn ranked_file_name(disease_name: &str) -> String {
    format!("{disease_name}_top_cities.csv")
}

/// Writes every city bucket as `City,Cases`.
///
/// # Errors
///
/// Returns [`HeatmapError`] if serialization or the underlying writer fails.
pub fn write_cities_csv<W: Write>(writer: W, buckets: &[CityBucket]) -> Result<(), HeatmapError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["City", "Cases"])?;
    for bucket in buckets {
        let count = bucket.count.to_string();
        csv.write_record([bucket.city.as_str(), count.as_str()])?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes the ranked summary as `Name,Value,Percentage`.
///
/// # Errors
///
/// Returns [`HeatmapError`] if serialization or the underlying writer fails.
pub fn write_ranked_csv<W: Write>(writer: W, entries: &[RankedEntry]) -> Result<(), HeatmapError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["Name", "Value", "Percentage"])?;
    for entry in entries {
        let value = entry.value.to_string();
        let percent = format!("{}%", entry.percent);
        csv.write_record([entry.name.as_str(), value.as_str(), percent.as_str()])?;
    }
    csv.flush()?;
    Ok(())
}

/// Renders [`write_cities_csv`] into a string.
///
/// # Errors
///
/// Returns [`HeatmapError`] if serialization fails.
pub fn cities_csv(buckets: &[CityBucket]) -> Result<String, HeatmapError> {
    let mut buf = Vec::new();
    write_cities_csv(&mut buf, buckets)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Renders [`write_ranked_csv`] into a string.
///
/// # Errors
///
/// Returns [`HeatmapError`] if serialization fails.
pub fn ranked_csv(entries: &[RankedEntry]) -> Result<String, HeatmapError> {
    let mut buf = Vec::new();
    write_ranked_csv(&mut buf, entries)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cities_csv_has_header_and_rows() {
        let buckets = [
            CityBucket {
                city: "Pretoria".to_string(),
                latitude: -25.74,
                longitude: 28.19,
                count: 4,
            },
            CityBucket {
                city: "Unknown".to_string(),
                latitude: 0.0,
                longitude: 0.0,
                count: 1,
            },
        ];
        assert_eq!(
            cities_csv(&buckets).unwrap(),
            "City,Cases\nPretoria,4\nUnknown,1\n"
        );
    }

    #[test]
    fn ranked_csv_suffixes_percent() {
        let entries = [
            RankedEntry {
                name: "Pretoria".to_string(),
                value: 3,
                percent: 75,
            },
            RankedEntry {
                name: "Other".to_string(),
                value: 1,
                percent: 25,
            },
        ];
        assert_eq!(
            ranked_csv(&entries).unwrap(),
            "Name,Value,Percentage\nPretoria,3,75%\nOther,1,25%\n"
        );
    }

    #[test]
    fn city_names_with_commas_are_quoted() {
        let buckets = [CityBucket {
            city: "Washington, D.C.".to_string(),
            latitude: 38.9,
            longitude: -77.0,
            count: 2,
        }];
        assert_eq!(
            cities_csv(&buckets).unwrap(),
            "City,Cases\n\"Washington, D.C.\",2\n"
        );
    }

    #[test]
    fn empty_exports_still_have_headers() {
        assert_eq!(cities_csv(&[]).unwrap(), "City,Cases\n");
        assert_eq!(ranked_csv(&[]).unwrap(), "Name,Value,Percentage\n");
    }

    #[test]
    fn file_names_follow_disease() {
        assert_eq!(cities_file_name("Malaria"), "Malaria_all_cities.csv");
        assert_eq!(ranked_file_name("COVID-19"), "COVID-19_top_cities.csv");
    }
}
