//! Scheduled maintenance lifecycle.

use std::sync::Arc;

use statusboard_db::{in_transaction, DbPool, RecordStore, ScanControl, ScanDirection, SqliteStore};
use statusboard_types::{
    now, NewScheduledMaintenance, NewStatusUpdate, ScheduledMaintenance,
    ScheduledMaintenancePatch, StatusUpdate, Timestamp,
};

use crate::aggregate::{aggregate_maintenance, AggregatedMaintenance};
use crate::notify::{self, Notifier};
use crate::update_log::{self, UpdateLog};
use crate::{cascade, cursor, CoreError, CoreSettings};

/// Title given to maintenance created without one.
pub const DEFAULT_TITLE: &str = "Scheduled Maintenance";

/// Owns every write to scheduled maintenance.
#[derive(Clone)]
pub struct MaintenanceManager {
    pool: DbPool,
    settings: CoreSettings,
    notifier: Option<Arc<dyn Notifier>>,
}

fn ensure_future(
    start: Timestamp,
    end: Timestamp,
    created_at: Timestamp,
) -> Result<(), CoreError> {
    if start <= created_at || end <= created_at {
        return Err(CoreError::validation(
            "start and end date must be in the future",
        ));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl MaintenanceManager {
    pub fn new(pool: DbPool, settings: CoreSettings, notifier: Option<Arc<dyn Notifier>>) -> Self {
        Self {
            pool,
            settings,
            notifier,
        }
    }

    /// Schedules maintenance. No cascade runs until the first update.
    ///
    /// # Errors
    ///
    /// `Validation` unless both planned bounds are strictly in the future.
    pub fn create(&self, new: NewScheduledMaintenance) -> Result<ScheduledMaintenance, CoreError> {
        let created_at = now();
        ensure_future(new.planned_start, new.planned_end, created_at)?;

        let mut maintenance = ScheduledMaintenance {
            id: 0,
            title: non_blank(Some(new.title)).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: new.description,
            planned_start: new.planned_start,
            planned_end: new.planned_end,
            completed: false,
            services: new.services,
            updates: Vec::new(),
            next_update_id: 0,
            original_tweet_id: 0,
            latest_tweet_id: 0,
            created_at,
            updated_at: created_at,
        };

        let conn = self.pool.get()?;
        SqliteStore::new(&conn).create(&mut maintenance)?;
        tracing::info!(
            id = maintenance.id,
            start = %maintenance.planned_start,
            end = %maintenance.planned_end,
            "scheduled maintenance"
        );
        Ok(maintenance)
    }

    /// Changes title, description or planned bounds. Blank or absent
    /// values keep what is stored; every other field is untouched.
    ///
    /// # Errors
    ///
    /// `NotFound` when the record does not exist, `Validation` when the
    /// merged bounds are not after the record's creation.
    pub fn patch(
        &self,
        id: i64,
        patch: ScheduledMaintenancePatch,
    ) -> Result<ScheduledMaintenance, CoreError> {
        let mut conn = self.pool.get()?;
        let maintenance = in_transaction(&mut conn, |store| {
            let mut maintenance: ScheduledMaintenance =
                store.get(id)?.ok_or(CoreError::NotFound {
                    kind: ScheduledMaintenance::KIND,
                    id,
                })?;

            if let Some(title) = non_blank(patch.title) {
                maintenance.title = title;
            }
            if let Some(description) = non_blank(patch.description) {
                maintenance.description = description;
            }
            maintenance.planned_start = patch.planned_start.unwrap_or(maintenance.planned_start);
            maintenance.planned_end = patch.planned_end.unwrap_or(maintenance.planned_end);
            ensure_future(
                maintenance.planned_start,
                maintenance.planned_end,
                maintenance.created_at,
            )?;

            store.update(&mut maintenance)?;
            Ok::<_, CoreError>(maintenance)
        })?;

        tracing::info!(id, "patched scheduled maintenance");
        Ok(maintenance)
    }

    /// Appends an update and cascades it. A resolving update completes
    /// the maintenance.
    ///
    /// # Errors
    ///
    /// As for incidents: `Validation` for malformed input, `NotFound` for
    /// a missing record.
    pub fn append_update(
        &self,
        id: i64,
        payload: NewStatusUpdate,
    ) -> Result<ScheduledMaintenance, CoreError> {
        let status = update_log::validate(ScheduledMaintenance::KIND, id, &payload)?;

        let mut conn = self.pool.get()?;
        let (mut maintenance, update) = in_transaction(&mut conn, |store| {
            let mut maintenance: ScheduledMaintenance =
                store.get(id)?.ok_or(CoreError::NotFound {
                    kind: ScheduledMaintenance::KIND,
                    id,
                })?;
            let update = update_log::append(&mut maintenance, status, payload);
            if cascade::apply_update(store, &mut maintenance.services, &update)? {
                maintenance.completed = true;
            }
            store.update(&mut maintenance)?;
            Ok::<_, CoreError>((maintenance, update))
        })?;
        drop(conn);

        tracing::info!(
            id,
            update_id = update.id,
            status = %status,
            completed = maintenance.completed,
            "appended maintenance update"
        );

        let text = notify::maintenance_update_text(&maintenance, &update);
        let reply_to = notify::reply_target(maintenance.original_tweet_id);
        if let Some(post_id) = notify::post_best_effort(self.notifier.as_deref(), &text, reply_to)
        {
            notify::store_post_id(
                &self.pool,
                &mut maintenance,
                |m| &mut m.latest_tweet_id,
                post_id,
            );
        }

        Ok(maintenance)
    }

    /// Removes one update by local id. The cascade it caused stays.
    pub fn delete_update(&self, id: i64, update_id: i64) -> Result<(), CoreError> {
        if id <= 0 {
            return Err(CoreError::validation("invalid scheduled maintenance id"));
        }
        let mut conn = self.pool.get()?;
        in_transaction(&mut conn, |store| {
            update_log::delete::<ScheduledMaintenance, _>(store, id, update_id)?;
            Ok::<_, CoreError>(())
        })
    }

    pub fn delete(&self, id: i64) -> Result<(), CoreError> {
        let conn = self.pool.get()?;
        SqliteStore::new(&conn).delete::<ScheduledMaintenance>(id)?;
        tracing::info!(id, "deleted scheduled maintenance");
        Ok(())
    }

    pub fn get(&self, id: i64) -> Result<Option<ScheduledMaintenance>, CoreError> {
        let conn = self.pool.get()?;
        Ok(SqliteStore::new(&conn).get(id)?)
    }

    /// Newest first. `latest` leaves out work that ended before the
    /// aggregation window.
    pub fn list(&self, latest: bool) -> Result<Vec<ScheduledMaintenance>, CoreError> {
        let conn = self.pool.get()?;
        Ok(cursor::list_maintenance(
            &SqliteStore::new(&conn),
            latest,
            self.settings.days_to_aggregate,
            now(),
        )?)
    }

    pub fn list_updates(&self, id: i64) -> Result<Option<Vec<StatusUpdate>>, CoreError> {
        let conn = self.pool.get()?;
        Ok(update_log::list::<ScheduledMaintenance, _>(
            &SqliteStore::new(&conn),
            id,
        )?)
    }

    pub fn get_update(&self, id: i64, update_id: i64) -> Result<Option<StatusUpdate>, CoreError> {
        let conn = self.pool.get()?;
        Ok(update_log::find::<ScheduledMaintenance, _>(
            &SqliteStore::new(&conn),
            id,
            update_id,
        )?)
    }

    /// The newest maintenance that has not started and is not completed.
    pub fn upcoming(&self) -> Result<Option<ScheduledMaintenance>, CoreError> {
        let at = now();
        let conn = self.pool.get()?;
        let mut found = None;
        SqliteStore::new(&conn).scan(ScanDirection::Reverse, |m: ScheduledMaintenance| {
            if m.planned_start > at && !m.completed {
                found = Some(m);
                ScanControl::Stop
            } else {
                ScanControl::Continue
            }
        })?;
        Ok(found)
    }

    /// Maintenance grouped by planned start day.
    pub fn aggregated(&self, latest: bool) -> Result<AggregatedMaintenance, CoreError> {
        Ok(aggregate_maintenance(self.list(latest)?))
    }
}
