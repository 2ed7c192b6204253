//! Route handlers

use std::collections::BTreeMap;
use std::sync::Arc;

use armory::{DefHash, Resolution, WeaponCatalog, WeaponRecord};
use axum::{extract::State, Json};
use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::dump;
use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub success: bool,
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ManifestResponse {
    pub version: String,
    pub locales: Vec<String>,
    /// Table paths keyed by locale, then by table name
    #[schema(value_type = Object)]
    pub paths: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogResponse {
    pub success: bool,
    pub version: String,
    pub count: usize,
    /// Weapon records keyed by item hash, in manifest order
    #[schema(value_type = Object)]
    pub weapons: IndexMap<DefHash, WeaponRecord>,
}

impl From<&WeaponCatalog> for CatalogResponse {
    fn from(catalog: &WeaponCatalog) -> Self {
        Self {
            success: true,
            version: catalog.version.clone(),
            count: catalog.len(),
            weapons: catalog.weapons.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub success: bool,
    pub version: String,
    pub count: usize,
}

// =============================================================================
// Handlers
// =============================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse)),
    tag = "System"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[utoipa::path(
    get,
    path = "/manifest",
    responses(
        (status = 200, description = "Current content manifest", body = ManifestResponse),
        (status = 500, description = "Manifest unavailable", body = ErrorResponse)
    ),
    tag = "Manifest"
)]
pub async fn get_manifest(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ManifestResponse>, ApiError> {
    let manifest = state.source.manifest(state.config.fetch_timeout()).await?;

    Ok(Json(ManifestResponse {
        version: manifest.version.clone(),
        locales: manifest.locales().map(str::to_string).collect(),
        paths: manifest.json_world_component_content_paths,
    }))
}

#[utoipa::path(
    get,
    path = "/weapons",
    responses(
        (status = 200, description = "Freshly resolved weapon catalog", body = CatalogResponse),
        (status = 500, description = "Resolution failed", body = ErrorResponse)
    ),
    tag = "Weapons"
)]
pub async fn get_weapons(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CatalogResponse>, ApiError> {
    let resolution = state.source.resolve(&state.config).await?;
    let response = CatalogResponse::from(&resolution.catalog);

    if let Some(dir) = state.debug_dir.clone() {
        write_debug_dump(dir, resolution).await;
    }

    Ok(Json(response))
}

/// Dump failures are logged and otherwise ignored
async fn write_debug_dump(dir: std::path::PathBuf, resolution: Resolution) {
    let result = tokio::task::spawn_blocking(move || {
        let tables = resolution.tables.dump();
        dump::write_resolution(&dir, &tables, &resolution.catalog)
    })
    .await;

    match result {
        Ok(Ok(files)) => tracing::debug!(files = files.len(), "wrote debug dump"),
        Ok(Err(e)) => tracing::warn!(error = %e, "debug dump failed"),
        Err(e) => tracing::warn!(error = %e, "debug dump task failed"),
    }
}

#[utoipa::path(
    get,
    path = "/weapons/snapshot",
    responses(
        (status = 200, description = "Weapon catalog from the background resolution", body = CatalogResponse),
        (status = 503, description = "Snapshot not resolved yet", body = ErrorResponse)
    ),
    tag = "Weapons"
)]
pub async fn get_snapshot(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CatalogResponse>, ApiError> {
    let catalog = state.snapshot().await?;
    Ok(Json(CatalogResponse::from(catalog.as_ref())))
}

#[utoipa::path(
    post,
    path = "/weapons/snapshot/refresh",
    responses(
        (status = 200, description = "Snapshot re-resolved", body = RefreshResponse),
        (status = 500, description = "Resolution failed", body = ErrorResponse)
    ),
    tag = "Weapons"
)]
pub async fn refresh_snapshot(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let catalog = state.refresh_snapshot().await?;

    Ok(Json(RefreshResponse {
        success: true,
        version: catalog.version.clone(),
        count: catalog.len(),
    }))
}
