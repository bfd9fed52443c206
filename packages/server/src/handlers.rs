//! HTTP handler functions for the disease map API.

use actix_web::http::header;
use actix_web::{HttpResponse, web};
use disease_map_database::queries;
use disease_map_diagnosis_models::Disease;
use disease_map_heatmap::build_heatmap_view;
use disease_map_heatmap::progress::null_progress;
use disease_map_heatmap::export::{cities_csv, cities_file_name, ranked_csv, ranked_file_name};
use disease_map_heatmap_models::HeatmapView;
use disease_map_server_models::{
    ApiDisease, ApiError, ApiHealth, ApiHeatmapPoint, HeatmapQueryParams,
};

use crate::AppState;

/// Registers every `/api` route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/diseases", web::get().to(diseases))
        .route("/diagnosis/heatmap", web::get().to(diagnosis_heatmap))
        .route("/heatmap", web::get().to(heatmap))
        .route("/heatmap/cities.csv", web::get().to(cities_export))
        .route("/heatmap/top-cities.csv", web::get().to(top_cities_export));
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/diseases`
pub async fn diseases() -> HttpResponse {
    let diseases: Vec<ApiDisease> = Disease::all().iter().copied().map(ApiDisease::from).collect();
    HttpResponse::Ok().json(diseases)
}

/// `GET /api/diagnosis/heatmap?disease=`
///
/// Returns the grouped `{latitude, longitude, count}` points for one
/// disease without clustering or geocoding.
pub async fn diagnosis_heatmap(
    state: web::Data<AppState>,
    params: web::Query<HeatmapQueryParams>,
) -> HttpResponse {
    let disease = match require_disease(&params) {
        Ok(disease) => disease,
        Err(response) => return response,
    };

    match queries::heatmap_points(state.db.as_ref(), disease).await {
        Ok(points) => {
            let points: Vec<ApiHeatmapPoint> = points.into_iter().map(ApiHeatmapPoint::from).collect();
            HttpResponse::Ok().json(points)
        }
        Err(e) => {
            log::error!("Failed to query heat-map points for {disease}: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to query heat-map points"))
        }
    }
}

/// `GET /api/heatmap?disease=`
///
/// Runs the full pipeline and returns render points, clusters, city
/// buckets, and the ranked summary.
pub async fn heatmap(state: web::Data<AppState>, params: web::Query<HeatmapQueryParams>) -> HttpResponse {
    match load_view(&state, &params).await {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(response) => response,
    }
}

/// `GET /api/heatmap/cities.csv?disease=`
pub async fn cities_export(
    state: web::Data<AppState>,
    params: web::Query<HeatmapQueryParams>,
) -> HttpResponse {
    let view = match load_view(&state, &params).await {
        Ok(view) => view,
        Err(response) => return response,
    };
    let disease = params.disease().unwrap_or_default();

    match cities_csv(&view.city_buckets) {
        Ok(body) => csv_attachment(&cities_file_name(disease), body),
        Err(e) => {
            log::error!("Failed to export city CSV: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to export CSV"))
        }
    }
}

/// `GET /api/heatmap/top-cities.csv?disease=`
pub async fn top_cities_export(
    state: web::Data<AppState>,
    params: web::Query<HeatmapQueryParams>,
) -> HttpResponse {
    let view = match load_view(&state, &params).await {
        Ok(view) => view,
        Err(response) => return response,
    };
    let disease = params.disease().unwrap_or_default();

    match ranked_csv(&view.ranked) {
        Ok(body) => csv_attachment(&ranked_file_name(disease), body),
        Err(e) => {
            log::error!("Failed to export ranked CSV: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to export CSV"))
        }
    }
}

#[allow(clippy::result_large_err)]
async fn load_view(state: &AppState, params: &HeatmapQueryParams) -> Result<HeatmapView, HttpResponse> {
    let disease = require_disease(params)?;

    let points = queries::heatmap_points(state.db.as_ref(), disease)
        .await
        .map_err(|e| {
            log::error!("Failed to query heat-map points for {disease}: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to query heat-map points"))
        })?;

    Ok(build_heatmap_view(points, state.geocoder.as_ref(), &state.config, &null_progress()).await)
}

#[allow(clippy::result_large_err)]
fn require_disease(params: &HeatmapQueryParams) -> Result<&str, HttpResponse> {
    params
        .disease()
        .ok_or_else(|| HttpResponse::BadRequest().json(ApiError::new("Disease parameter is required")))
}

fn csv_attachment(file_name: &str, body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        ))
        .body(body)
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test};

    use super::*;

    #[actix_web::test]
    async fn health_reports_version() {
        let app = test::init_service(App::new().route("/api/health", web::get().to(health))).await;
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: ApiHealth = test::call_and_read_body_json(&app, req).await;

        assert!(body.healthy);
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn diseases_lists_every_selectable_disease() {
        let app = test::init_service(App::new().route("/api/diseases", web::get().to(diseases))).await;
        let req = test::TestRequest::get().uri("/api/diseases").to_request();
        let body: Vec<ApiDisease> = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.len(), Disease::all().len());
        assert_eq!(body[0].name, "HIV-AIDS");
    }

    #[core::prelude::v1::test]
    fn missing_disease_is_a_bad_request() {
        let params = HeatmapQueryParams::default();
        let response = require_disease(&params).unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let params = HeatmapQueryParams {
            disease: Some(String::new()),
        };
        assert!(require_disease(&params).is_err());
    }

    #[core::prelude::v1::test]
    fn csv_attachment_sets_download_headers() {
        let response = csv_attachment("Malaria_all_cities.csv", "City,Cases\n".to_string());
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert_eq!(disposition, "attachment; filename=\"Malaria_all_cities.csv\"");
    }
}
