//! Axum router construction.
//!
//! Builds the application router with all routes, middleware layers, upload
//! serving and optional static file serving for the web UI.

use std::path::PathBuf;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::context::AppContext;
use crate::middleware::edit_key::edit_key_middleware;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    info(title = "vogelvortrag", description = "Bird species, observations and images"),
    paths(
        routes::health::health_check,
        routes::species::list_species,
        routes::species::count_species,
        routes::species::get_species,
        routes::species::put_species,
        routes::species::create_species,
        routes::species::delete_species,
        routes::species::has_observations,
        routes::observations::list_observations,
        routes::observations::count_observations,
        routes::observations::get_observation,
        routes::observations::put_observation,
        routes::observations::create_observation,
        routes::observations::delete_observation,
        routes::images::upload_image,
        routes::images::serve_image,
    ),
    components(schemas(
        routes::health::HealthResponse,
        routes::images::UploadResponse,
        routes::images::UploadForm,
        vogel_store::models::BirdSpecies,
        vogel_store::models::BirdObservation,
        vogel_store::models::BirdImage,
        vogel_store::models::FitSettings,
        vogel_store::models::XenoCantoRecording,
        vogel_store::models::XenoCantoSono,
        vogel_store::models::XenoCantoOsci,
        vogel_store::models::LatLng,
        vogel_store::models::ConservationStatus,
        vogel_store::models::Count,
    ))
)]
pub struct ApiDoc;

/// GET /api-docs/openapi.json
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let upload_limit = ctx.config.server.max_upload_bytes;
    let uploads = ServeDir::new(ctx.images.upload_dir());

    let mut app = Router::new()
        .route("/health", get(routes::health::health_check))
        // Species
        .route(
            "/species",
            get(routes::species::list_species).post(routes::species::create_species),
        )
        .route("/species/count", get(routes::species::count_species))
        .route(
            "/species/{id}",
            get(routes::species::get_species)
                .put(routes::species::put_species)
                .delete(routes::species::delete_species),
        )
        .route(
            "/species/{id}/has-observations",
            get(routes::species::has_observations),
        )
        // Observations
        .route(
            "/observations",
            get(routes::observations::list_observations)
                .post(routes::observations::create_observation),
        )
        .route(
            "/observations/count",
            get(routes::observations::count_observations),
        )
        .route(
            "/observations/{id}",
            get(routes::observations::get_observation)
                .put(routes::observations::put_observation)
                .delete(routes::observations::delete_observation),
        )
        // Images
        .route(
            "/upload-image",
            post(routes::images::upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/image/{filename}", get(routes::images::serve_image))
        .nest_service("/uploads", uploads)
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn_with_state(ctx.clone(), edit_key_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx);

    // Static file serving for the web UI.
    if let Some(dir) = static_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {:?}", dir);
            let index_path = dir.join("index.html");
            app = app.fallback_service(
                ServeDir::new(&dir)
                    .append_index_html_on_directories(true)
                    .not_found_service(ServeFile::new(index_path)),
            );
        } else {
            tracing::warn!("Static directory {:?} does not exist, not serving UI", dir);
        }
    }

    app
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use vogel_core::config::Config;
    use vogel_store::JsonStore;

    fn test_app() -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.data_file = dir.path().join("birds.data.json");
        config.uploads.dir = dir.path().join("uploads");
        config.auth.edit_key = "k".into();

        let store = JsonStore::open(&config.storage.data_file).unwrap();
        let ctx = AppContext::new(config, store);
        ctx.images.ensure_dirs().unwrap();
        (dir, build_router(ctx, None))
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (_dir, app) = test_app();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn write_without_key_is_forbidden() {
        let (_dir, app) = test_app();
        let response = app
            .oneshot(
                Request::delete("/species/amsel")
                    .header("x-request-id", "req-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "forbidden");
        assert_eq!(body["request_id"], "req-1");
    }

    #[tokio::test]
    async fn key_in_query_is_accepted() {
        let (_dir, app) = test_app();
        let response = app
            .oneshot(
                Request::delete("/species/amsel?edit_key=k")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        // Past the guard: the species simply does not exist.
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn openapi_document_lists_routes() {
        let (_dir, app) = test_app();
        let response = app
            .oneshot(
                Request::get("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(doc["paths"]["/species/{id}"].is_object());
        assert!(doc["paths"]["/image/{filename}"].is_object());
    }
}
