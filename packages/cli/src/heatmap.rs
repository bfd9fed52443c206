//! `heatmap` subcommand: build a heat map from a CSV of diagnoses.
//!
//! The input has one diagnosis per row with the header
//! `userId,diseaseName,latitude,longitude`; rows without coordinates are
//! allowed and skipped.

use std::fs::File;
use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr as _;
use std::sync::Arc;
use std::time::Instant;

use disease_map_cli_utils::{IndicatifProgress, MultiProgress};
use disease_map_diagnosis_models::{DiagnosisRecord, Disease};
use disease_map_geocoder::cache::CachingGeocoder;
use disease_map_geocoder::service_registry::default_geocoder;
use disease_map_geocoder::{ReverseGeocoder, Unresolved};
use disease_map_heatmap::export::{write_cities_csv, write_ranked_csv};
use disease_map_heatmap::group::group_reports;
use disease_map_heatmap::{HeatmapConfig, build_heatmap_view};
use disease_map_heatmap_models::HeatmapView;

/// Options for one heat-map run.
pub struct HeatmapArgs {
    /// Diagnoses CSV.
    pub input: PathBuf,
    /// Disease display name to map.
    pub disease: String,
    /// Skip reverse geocoding; every city is "Unknown".
    pub offline: bool,
    /// Optional TOML config file.
    pub config: Option<PathBuf>,
    /// Where to write the `City,Cases` export.
    pub cities_csv: Option<PathBuf>,
    /// Where to write the ranked `Name,Value,Percentage` export.
    pub ranked_csv: Option<PathBuf>,
}

/// Runs the pipeline and prints a summary.
///
/// # Errors
///
/// Returns an error if the config is invalid, the input cannot be read, or
/// an export file cannot be written.
pub async fn run(args: &HeatmapArgs, multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let config = HeatmapConfig::load(args.config.as_deref())?;

    if Disease::from_str(&args.disease).is_err() {
        log::warn!("'{}' is not one of the selectable diseases", args.disease);
    }

    let records = read_records(File::open(&args.input)?)?;
    let points = group_reports(&records, &args.disease);
    log::info!(
        "Read {} diagnoses, {} distinct {} coordinates",
        records.len(),
        points.len(),
        args.disease
    );

    let geocoder: Arc<dyn ReverseGeocoder> = if args.offline {
        Arc::new(Unresolved)
    } else {
        Arc::new(CachingGeocoder::new(
            default_geocoder(),
            config.cache_precision,
            config.cache_capacity,
        ))
    };

    let progress = IndicatifProgress::lookup_bar(multi, "Resolving cities");
    let view = build_heatmap_view(points, geocoder.as_ref(), &config, &progress).await;

    print_summary(&args.disease, &view);

    if let Some(path) = &args.cities_csv {
        write_cities_csv(create(path)?, &view.city_buckets)?;
        println!("Wrote {}", path.display());
    }
    if let Some(path) = &args.ranked_csv {
        write_ranked_csv(create(path)?, &view.ranked)?;
        println!("Wrote {}", path.display());
    }

    log::info!("Heat map built in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Reads diagnosis rows from CSV.
///
/// # Errors
///
/// Returns [`csv::Error`] if a row is malformed.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<DiagnosisRecord>, csv::Error> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
        .deserialize()
        .collect()
}

fn create(path: &Path) -> std::io::Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}

fn print_summary(disease: &str, view: &HeatmapView) {
    println!();
    println!(
        "{disease}: {} clusters across {} cities",
        view.clusters.len(),
        view.city_buckets.len()
    );
    println!();
    println!("  {:<32} {:>8} {:>5}", "City", "Cases", "%");
    for entry in &view.ranked {
        println!("  {:<32} {:>8} {:>4}%", entry.name, entry.value, entry.percent);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_records_with_missing_coordinates() {
        let input = "userId,diseaseName,latitude,longitude\n\
                     1,Malaria,6.5244,3.3792\n\
                     2, Malaria ,,\n\
                     3,Hepatitis A,-1.2921,36.8219\n";

        let records = read_records(input.as_bytes()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].latitude, Some(6.5244));
        assert_eq!(records[1].disease_name, "Malaria");
        assert_eq!(records[1].latitude, None);
        assert_eq!(records[2].disease_name, "Hepatitis A");
    }

    #[test]
    fn malformed_row_is_an_error() {
        let input = "userId,diseaseName,latitude,longitude\nabc,Malaria,1.0,2.0\n";
        assert!(read_records(input.as_bytes()).is_err());
    }

    #[test]
    fn records_feed_grouping() {
        let input = "userId,diseaseName,latitude,longitude\n\
                     1,Zika,1.0,2.0\n\
                     2,Zika,1.0,2.0\n\
                     2,Zika,1.0,2.0\n\
                     3,Dengue,1.0,2.0\n";

        let records = read_records(input.as_bytes()).unwrap();
        let points = group_reports(&records, "Zika");

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].count, 2);
    }
}
