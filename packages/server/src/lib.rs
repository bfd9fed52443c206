#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the disease heat map.
//!
//! Every heat-map request loads the grouped report points for one disease
//! from Postgres and runs the full pipeline. The only state shared between
//! requests is the database handle and the reverse-geocoding cache.
//!
//! A background task deletes diagnoses past their retention window once at
//! startup and then every [`PURGE_INTERVAL`], emptying the geocode cache
//! after each successful purge. Between purges the cache is bounded by
//! `cache_capacity`.

mod handlers;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use disease_map_database::{db, queries};
use disease_map_geocoder::ReverseGeocoder;
use disease_map_geocoder::cache::CachingGeocoder;
use disease_map_geocoder::service_registry::default_geocoder;
use disease_map_heatmap::HeatmapConfig;
use switchy_database::Database;

/// How often expired diagnoses are purged.
pub const PURGE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Reverse geocoder shared by every request.
pub type SharedGeocoder = CachingGeocoder<Arc<dyn ReverseGeocoder>>;

/// Shared application state.
pub struct AppState {
    /// Postgres connection holding the diagnoses table.
    pub db: Arc<dyn Database>,
    /// Reverse geocoder, memoized across requests.
    pub geocoder: Arc<SharedGeocoder>,
    /// Pipeline settings.
    pub config: HeatmapConfig,
}

/// Starts the disease map API server.
///
/// Loads the heat-map config (from `config_path` if given, then `HEATMAP_*`
/// environment overrides), connects to the database named by
/// `DATABASE_URL`, and serves on `BIND_ADDR:PORT` (default
/// `127.0.0.1:8080`). The caller is responsible for the async runtime and
/// for initializing logging.
///
/// # Errors
///
/// Returns an error if the config is invalid, the database connection
/// fails, or the HTTP server fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = HeatmapConfig::load(config_path)?;

    log::info!("Connecting to database...");
    let db: Arc<dyn Database> = Arc::from(db::connect_from_env().await?);

    let geocoder = Arc::new(CachingGeocoder::new(
        default_geocoder(),
        config.cache_precision,
        config.cache_capacity,
    ));

    spawn_purge_task(db.clone(), geocoder.clone());

    let state = web::Data::new(AppState {
        db,
        geocoder,
        config,
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(web::scope("/api").configure(handlers::configure))
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    Ok(())
}

fn spawn_purge_task(db: Arc<dyn Database>, geocoder: Arc<SharedGeocoder>) {
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match queries::purge_expired(db.as_ref(), chrono::Utc::now()).await {
                Ok(deleted) => {
                    log::info!("Retention purge removed {deleted} diagnoses");
                    geocoder.clear().await;
                }
                Err(e) => log::error!("Retention purge failed: {e}"),
            }
        }
    });
}
