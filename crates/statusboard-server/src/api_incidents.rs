//! Incident endpoints under `/v1/incidents`.

use crate::api::{blocking, found, ApiError, ListParams};
use crate::AppState;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Json,
};
use statusboard_types::{Incident, NewIncident, NewStatusUpdate, StatusUpdate};
use std::sync::Arc;

/// `GET /v1/incidents`
///
/// Newest first. `?all=true` lifts the recent window.
pub async fn list_incidents_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Incident>>, ApiError> {
    let incidents = state.incidents.clone();
    let pagination = params.pagination();
    let latest = params.latest();
    let list = blocking(move || incidents.list(latest, &pagination)).await?;
    Ok(Json(list))
}

/// `POST /v1/incidents`
pub async fn create_incident_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<NewIncident>,
) -> Result<(StatusCode, Json<Incident>), ApiError> {
    let incidents = state.incidents.clone();
    let incident = blocking(move || incidents.create(payload)).await?;
    Ok((StatusCode::CREATED, Json(incident)))
}

/// `GET /v1/incidents/{id}`
pub async fn get_incident_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Incident>, ApiError> {
    let incidents = state.incidents.clone();
    let incident = blocking(move || incidents.get(id)).await?;
    Ok(Json(found(incident, "incident")?))
}

/// `DELETE /v1/incidents/{id}`
pub async fn delete_incident_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let incidents = state.incidents.clone();
    blocking(move || incidents.delete(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /v1/incidents/{id}/updates`
pub async fn list_updates_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<StatusUpdate>>, ApiError> {
    let incidents = state.incidents.clone();
    let updates = blocking(move || incidents.list_updates(id)).await?;
    Ok(Json(found(updates, "incident")?))
}

/// `POST /v1/incidents/{id}/updates`
///
/// Responds with the updated incident.
pub async fn create_update_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<NewStatusUpdate>,
) -> Result<(StatusCode, Json<Incident>), ApiError> {
    let incidents = state.incidents.clone();
    let incident = blocking(move || incidents.append_update(id, payload)).await?;
    Ok((StatusCode::CREATED, Json(incident)))
}

/// `GET /v1/incidents/{id}/updates/{update_id}`
pub async fn get_update_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((id, update_id)): Path<(i64, i64)>,
) -> Result<Json<StatusUpdate>, ApiError> {
    let incidents = state.incidents.clone();
    let update = blocking(move || incidents.get_update(id, update_id)).await?;
    Ok(Json(found(update, "incident update")?))
}

/// `DELETE /v1/incidents/{id}/updates/{update_id}`
pub async fn delete_update_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((id, update_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    let incidents = state.incidents.clone();
    blocking(move || incidents.delete_update(id, update_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
