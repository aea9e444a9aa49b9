#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use statusboard_core::services::sync_services;
use statusboard_core::{
    CoreSettings, IncidentManager, MaintenanceManager, Notifier, NotifyError,
};
use statusboard_db::{
    create_pool, region_key, run_migrations, DbPool, DbRuntimeSettings, RecordStore, SqliteStore,
};
use statusboard_types::{Region, RegionSeed, Service, ServiceSeed, ServiceStatus};
use tempfile::TempDir;

/// A pool over a fresh database file. Keep the `TempDir` alive.
pub fn pool() -> (TempDir, DbPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("status.db");
    let pool = create_pool(path.to_str().unwrap(), DbRuntimeSettings::default())
        .expect("failed to create pool");
    run_migrations(&pool.get().unwrap()).expect("failed to run migrations");
    (dir, pool)
}

/// Registers services `a` and `b`, each with regions `us-1` and `eu-1`.
pub fn seed_services(pool: &DbPool) {
    let region = |code: &str| RegionSeed {
        code: code.to_string(),
        name: code.to_uppercase(),
        description: String::new(),
    };
    let seeds: Vec<ServiceSeed> = ["a", "b"]
        .into_iter()
        .map(|name| ServiceSeed {
            name: name.to_string(),
            description: String::new(),
            regions: vec![region("us-1"), region("eu-1")],
        })
        .collect();
    let conn = pool.get().unwrap();
    sync_services(&SqliteStore::new(&conn), &seeds).expect("seed services");
}

pub fn service_status(pool: &DbPool, name: &str) -> ServiceStatus {
    let conn = pool.get().unwrap();
    SqliteStore::new(&conn)
        .find_by_key::<Service>(name)
        .unwrap()
        .expect("service exists")
        .status
}

pub fn region_status(pool: &DbPool, service: &str, code: &str) -> ServiceStatus {
    let conn = pool.get().unwrap();
    SqliteStore::new(&conn)
        .find_by_key::<Region>(&region_key(service, code))
        .unwrap()
        .expect("region exists")
        .status
}

/// Records every post and hands out increasing ids from 1000.
#[derive(Default)]
pub struct RecordingNotifier {
    pub posts: Mutex<Vec<(String, Option<i64>)>>,
}

impl Notifier for RecordingNotifier {
    fn post(&self, text: &str, reply_to: Option<i64>) -> Result<i64, NotifyError> {
        let mut posts = self.posts.lock().unwrap();
        posts.push((text.to_string(), reply_to));
        Ok(999 + posts.len() as i64)
    }
}

pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn post(&self, _text: &str, _reply_to: Option<i64>) -> Result<i64, NotifyError> {
        Err(NotifyError::Status(500))
    }
}

pub fn managers(
    pool: &DbPool,
    notifier: Option<Arc<dyn Notifier>>,
) -> (IncidentManager, MaintenanceManager) {
    managers_with(pool, CoreSettings::default(), notifier)
}

pub fn managers_with(
    pool: &DbPool,
    settings: CoreSettings,
    notifier: Option<Arc<dyn Notifier>>,
) -> (IncidentManager, MaintenanceManager) {
    (
        IncidentManager::new(pool.clone(), settings, notifier.clone()),
        MaintenanceManager::new(pool.clone(), settings, notifier),
    )
}

/// Makes every write that changes `column` of a stored record in `table`
/// fail. The write filling in a freshly inserted row is let through.
pub fn reject_changes_to(pool: &DbPool, table: &str, column: &str) {
    pool.get()
        .unwrap()
        .execute_batch(&format!(
            "CREATE TRIGGER reject_{column} BEFORE UPDATE ON {table}
             WHEN json_extract(OLD.body_json, '$.{column}') IS NOT NULL
              AND json_extract(NEW.body_json, '$.{column}')
                  IS NOT json_extract(OLD.body_json, '$.{column}')
             BEGIN SELECT RAISE(ABORT, '{column} is read-only'); END;"
        ))
        .unwrap();
}
