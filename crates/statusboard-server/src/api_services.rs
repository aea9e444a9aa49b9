//! Service registry, dashboard and history endpoints.

use crate::api::{blocking, found, ApiError, ListParams};
use crate::AppState;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use statusboard_core::{dashboard, services, Dashboard, DayGroup};
use statusboard_db::SqliteStore;
use statusboard_types::{Incident, Region, Service};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct ServiceListParams {
    /// Only enabled services when `true` or `1`.
    pub enabled: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRegionRequest {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// `GET /v1/services`
pub async fn list_services_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<ServiceListParams>,
) -> Result<Json<Vec<Service>>, ApiError> {
    let enabled_only = matches!(params.enabled.as_deref(), Some("true") | Some("1"));
    let pool = state.pool.clone();
    let list = blocking(move || {
        let conn = pool.get()?;
        services::list_services(&SqliteStore::new(&conn), enabled_only)
    })
    .await?;
    Ok(Json(list))
}

/// `POST /v1/services`
pub async fn create_service_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<Service>), ApiError> {
    let pool = state.pool.clone();
    let service = blocking(move || {
        let conn = pool.get()?;
        services::create_service(&SqliteStore::new(&conn), &payload.name, &payload.description)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(service)))
}

/// `GET /v1/services/{name}`
pub async fn get_service_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Service>, ApiError> {
    let pool = state.pool.clone();
    let service = blocking(move || {
        let conn = pool.get()?;
        services::get_service(&SqliteStore::new(&conn), &name)
    })
    .await?;
    Ok(Json(found(service, "service")?))
}

/// `DELETE /v1/services/{name}`
///
/// Also removes the service's regions.
pub async fn delete_service_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    let pool = state.pool.clone();
    blocking(move || {
        let mut conn = pool.get()?;
        statusboard_db::in_transaction(&mut conn, |store| services::delete_service(store, &name))
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /v1/services/{name}/regions`
pub async fn list_service_regions_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Region>>, ApiError> {
    let pool = state.pool.clone();
    let regions = blocking(move || {
        let conn = pool.get()?;
        services::regions_for_service(&SqliteStore::new(&conn), &name)
    })
    .await?;
    Ok(Json(regions))
}

/// `POST /v1/services/{name}/regions`
pub async fn create_region_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(name): Path<String>,
    Json(payload): Json<CreateRegionRequest>,
) -> Result<(StatusCode, Json<Region>), ApiError> {
    let pool = state.pool.clone();
    let region = blocking(move || {
        let conn = pool.get()?;
        services::create_region(
            &SqliteStore::new(&conn),
            &name,
            &payload.code,
            &payload.name,
            &payload.description,
        )
    })
    .await?;
    Ok((StatusCode::CREATED, Json(region)))
}

/// `GET /v1/regions`
pub async fn list_regions_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<Region>>, ApiError> {
    let pool = state.pool.clone();
    let regions = blocking(move || {
        let conn = pool.get()?;
        services::list_regions(&SqliteStore::new(&conn))
    })
    .await?;
    Ok(Json(regions))
}

/// `GET /v1/dashboard`
pub async fn dashboard_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Dashboard>, ApiError> {
    let view =
        blocking(move || dashboard::build(&state.pool, &state.incidents, &state.maintenance))
            .await?;
    Ok(Json(view))
}

/// `GET /v1/history?page=N`
///
/// One page of incidents grouped by day.
pub async fn history_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<DayGroup<Incident>>>, ApiError> {
    let incidents = state.incidents.clone();
    let pagination = params.pagination();
    let days = blocking(move || incidents.history_by_day(&pagination)).await?;
    Ok(Json(days))
}
