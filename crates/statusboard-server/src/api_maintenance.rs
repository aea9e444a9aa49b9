//! Scheduled maintenance endpoints under `/v1/scheduled-maintenance`.

use crate::api::{blocking, found, ApiError, ListParams};
use crate::AppState;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Json,
};
use statusboard_types::{
    NewScheduledMaintenance, NewStatusUpdate, ScheduledMaintenance, ScheduledMaintenancePatch,
    StatusUpdate,
};
use std::sync::Arc;

/// `GET /v1/scheduled-maintenance`
///
/// `?all=true` includes long finished work.
pub async fn list_maintenance_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ScheduledMaintenance>>, ApiError> {
    let maintenance = state.maintenance.clone();
    let latest = params.latest();
    Ok(Json(blocking(move || maintenance.list(latest)).await?))
}

/// `POST /v1/scheduled-maintenance`
pub async fn create_maintenance_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<NewScheduledMaintenance>,
) -> Result<(StatusCode, Json<ScheduledMaintenance>), ApiError> {
    let maintenance = state.maintenance.clone();
    let created = blocking(move || maintenance.create(payload)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /v1/scheduled-maintenance/upcoming`
pub async fn upcoming_maintenance_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<ScheduledMaintenance>, ApiError> {
    let maintenance = state.maintenance.clone();
    let upcoming = blocking(move || maintenance.upcoming()).await?;
    Ok(Json(found(upcoming, "upcoming maintenance")?))
}

/// `GET /v1/scheduled-maintenance/{id}`
pub async fn get_maintenance_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ScheduledMaintenance>, ApiError> {
    let maintenance = state.maintenance.clone();
    let item = blocking(move || maintenance.get(id)).await?;
    Ok(Json(found(item, "scheduled maintenance")?))
}

/// `PATCH /v1/scheduled-maintenance/{id}`
pub async fn patch_maintenance_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(patch): Json<ScheduledMaintenancePatch>,
) -> Result<Json<ScheduledMaintenance>, ApiError> {
    let maintenance = state.maintenance.clone();
    Ok(Json(blocking(move || maintenance.patch(id, patch)).await?))
}

/// `DELETE /v1/scheduled-maintenance/{id}`
pub async fn delete_maintenance_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let maintenance = state.maintenance.clone();
    blocking(move || maintenance.delete(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /v1/scheduled-maintenance/{id}/updates`
pub async fn list_updates_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<StatusUpdate>>, ApiError> {
    let maintenance = state.maintenance.clone();
    let updates = blocking(move || maintenance.list_updates(id)).await?;
    Ok(Json(found(updates, "scheduled maintenance")?))
}

/// `POST /v1/scheduled-maintenance/{id}/updates`
pub async fn create_update_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<NewStatusUpdate>,
) -> Result<(StatusCode, Json<ScheduledMaintenance>), ApiError> {
    let maintenance = state.maintenance.clone();
    let updated = blocking(move || maintenance.append_update(id, payload)).await?;
    Ok((StatusCode::CREATED, Json(updated)))
}

/// `GET /v1/scheduled-maintenance/{id}/updates/{update_id}`
pub async fn get_update_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((id, update_id)): Path<(i64, i64)>,
) -> Result<Json<StatusUpdate>, ApiError> {
    let maintenance = state.maintenance.clone();
    let update = blocking(move || maintenance.get_update(id, update_id)).await?;
    Ok(Json(found(update, "maintenance update")?))
}

/// `DELETE /v1/scheduled-maintenance/{id}/updates/{update_id}`
pub async fn delete_update_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((id, update_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    let maintenance = state.maintenance.clone();
    blocking(move || maintenance.delete_update(id, update_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
