#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use statusboard_core::{services::sync_services, CoreSettings};
use statusboard_db::{create_pool, run_migrations, DbPool, DbRuntimeSettings, SqliteStore};
use statusboard_server::{app, AppState};
use statusboard_types::{RegionSeed, ServiceSeed};
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
    _dir: TempDir,
}

/// An app over a fresh database with service `chat` (regions `us-1`,
/// `eu-1`) and service `api` registered.
pub fn setup_app() -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("status.db");
    let pool = create_pool(path.to_str().unwrap(), DbRuntimeSettings::default()).unwrap();
    {
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();
        let region = |code: &str| RegionSeed {
            code: code.to_string(),
            name: code.to_uppercase(),
            description: String::new(),
        };
        let seeds = vec![
            ServiceSeed {
                name: "chat".to_string(),
                description: "Messaging".to_string(),
                regions: vec![region("us-1"), region("eu-1")],
            },
            ServiceSeed {
                name: "api".to_string(),
                description: "Public API".to_string(),
                regions: Vec::new(),
            },
        ];
        sync_services(&SqliteStore::new(&conn), &seeds).unwrap();
    }

    let state = AppState::new(pool.clone(), CoreSettings::default(), None);
    TestApp {
        router: app(state),
        pool,
        _dir: dir,
    }
}

impl TestApp {
    /// Sends a request and returns the status with the decoded JSON body
    /// (`Null` when the body is empty).
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }
}
