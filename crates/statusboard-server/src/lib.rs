//! statusboard HTTP server library logic.
//!
//! A thin JSON adapter over `statusboard-core`: handlers parse requests,
//! run the synchronous core call on the blocking pool and map the result
//! to a status code.

pub mod api;
pub mod api_incidents;
pub mod api_maintenance;
pub mod api_services;
pub mod config;

use axum::{routing::get, Extension, Json, Router};
use serde_json::{json, Value};
use statusboard_core::{CoreSettings, IncidentManager, MaintenanceManager, Notifier};
use statusboard_db::DbPool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Incident lifecycle.
    pub incidents: IncidentManager,
    /// Scheduled maintenance lifecycle.
    pub maintenance: MaintenanceManager,
}

impl AppState {
    /// Wires both lifecycle managers to one pool and notifier.
    pub fn new(
        pool: DbPool,
        settings: CoreSettings,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        Self {
            incidents: IncidentManager::new(pool.clone(), settings, notifier.clone()),
            maintenance: MaintenanceManager::new(pool.clone(), settings, notifier),
            pool,
        }
    }
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let v1 = Router::new()
        .route(
            "/incidents",
            get(api_incidents::list_incidents_handler).post(api_incidents::create_incident_handler),
        )
        .route(
            "/incidents/{id}",
            get(api_incidents::get_incident_handler).delete(api_incidents::delete_incident_handler),
        )
        .route(
            "/incidents/{id}/updates",
            get(api_incidents::list_updates_handler).post(api_incidents::create_update_handler),
        )
        .route(
            "/incidents/{id}/updates/{update_id}",
            get(api_incidents::get_update_handler).delete(api_incidents::delete_update_handler),
        )
        .route(
            "/scheduled-maintenance",
            get(api_maintenance::list_maintenance_handler)
                .post(api_maintenance::create_maintenance_handler),
        )
        .route(
            "/scheduled-maintenance/upcoming",
            get(api_maintenance::upcoming_maintenance_handler),
        )
        .route(
            "/scheduled-maintenance/{id}",
            get(api_maintenance::get_maintenance_handler)
                .patch(api_maintenance::patch_maintenance_handler)
                .delete(api_maintenance::delete_maintenance_handler),
        )
        .route(
            "/scheduled-maintenance/{id}/updates",
            get(api_maintenance::list_updates_handler).post(api_maintenance::create_update_handler),
        )
        .route(
            "/scheduled-maintenance/{id}/updates/{update_id}",
            get(api_maintenance::get_update_handler).delete(api_maintenance::delete_update_handler),
        )
        .route(
            "/services",
            get(api_services::list_services_handler).post(api_services::create_service_handler),
        )
        .route(
            "/services/{name}",
            get(api_services::get_service_handler).delete(api_services::delete_service_handler),
        )
        .route(
            "/services/{name}/regions",
            get(api_services::list_service_regions_handler)
                .post(api_services::create_region_handler),
        )
        .route("/regions", get(api_services::list_regions_handler))
        .route("/dashboard", get(api_services::dashboard_handler))
        .route("/history", get(api_services::history_handler));

    Router::new()
        .route("/health", get(health))
        .nest("/v1", v1)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
