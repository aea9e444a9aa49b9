//! Shared plumbing for the JSON API: error mapping, blocking dispatch and
//! list parameters.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use statusboard_core::CoreError;
use statusboard_types::Pagination;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(msg) => ApiError::BadRequest(msg),
            CoreError::NotFound { kind, id } => ApiError::NotFound(format!("{kind} {id} not found")),
            other => {
                tracing::error!(error = %other, "core operation failed");
                ApiError::InternalServerError("internal error".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Runs a synchronous core call on the blocking pool.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, CoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "blocking task failed");
            ApiError::InternalServerError("internal error".to_string())
        })?
        .map_err(ApiError::from)
}

/// Turns an absent record into a 404.
pub(crate) fn found<T>(value: Option<T>, what: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::NotFound(format!("{what} not found")))
}

/// Query parameters accepted by list endpoints.
///
/// Values are kept as raw strings so that malformed numbers fall back to
/// defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub all: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub page: Option<String>,
}

fn lenient(value: &Option<String>) -> i64 {
    value
        .as_deref()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

impl ListParams {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            limit: lenient(&self.limit),
            offset: lenient(&self.offset),
            page: lenient(&self.page),
        }
    }

    /// `true` unless `?all=true` (or `1`) asks for the full history.
    pub fn latest(&self) -> bool {
        !matches!(self.all.as_deref(), Some("true") | Some("1"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_numbers_fall_back_to_defaults() {
        let params = ListParams {
            limit: Some("lots".to_string()),
            offset: Some("-4".to_string()),
            page: Some("2".to_string()),
            ..ListParams::default()
        };
        let pagination = params.pagination();
        assert_eq!(pagination.limit, 0);
        assert_eq!(pagination.effective_limit(), 25);
        assert_eq!(pagination.effective_offset(), 50);
        assert!(params.latest());
    }

    #[test]
    fn core_errors_map_to_statuses() {
        let bad = ApiError::from(CoreError::Validation("nope".to_string())).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let missing = ApiError::from(CoreError::NotFound {
            kind: "incident",
            id: 4,
        })
        .into_response();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
