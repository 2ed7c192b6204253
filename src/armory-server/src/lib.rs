//! Armory API Server
//!
//! REST API serving the Destiny 2 weapon catalog, resolved from the live
//! content manifest.

pub mod config;
pub mod dump;
pub mod error;
pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{get, options, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::error::ErrorResponse;
use crate::handlers::{
    get_manifest, get_snapshot, get_weapons, health, refresh_snapshot, CatalogResponse,
    HealthResponse, ManifestResponse, RefreshResponse,
};
pub use crate::state::{AppState, CatalogSource, Snapshot};

// =============================================================================
// OpenAPI Schema
// =============================================================================

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Armory API",
        description = "Destiny 2 weapon catalog resolved from the content manifest",
        version = "0.3.0",
        license(name = "BSD-2-Clause"),
    ),
    paths(
        handlers::health,
        handlers::get_manifest,
        handlers::get_weapons,
        handlers::get_snapshot,
        handlers::refresh_snapshot,
    ),
    components(schemas(
        HealthResponse,
        ManifestResponse,
        CatalogResponse,
        RefreshResponse,
        ErrorResponse,
    ))
)]
pub struct ApiDoc;

/// OPTIONS handler returns OpenAPI schema for API discovery
async fn options_schema() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

// =============================================================================
// Router
// =============================================================================

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/manifest", get(get_manifest))
        .route("/weapons", get(get_weapons))
        .route("/weapons/snapshot", get(get_snapshot))
        .route("/weapons/snapshot/refresh", post(refresh_snapshot))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state)
        .layer(cors);

    // Root OPTIONS returns OpenAPI schema (no CORS interception)
    Router::new()
        .route("/", options(options_schema))
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
}
