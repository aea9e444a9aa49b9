//! Incident lifecycle: create, append and delete updates, list, delete.

use std::sync::Arc;

use statusboard_db::{in_transaction, DbPool, RecordStore, SqliteStore};
use statusboard_types::{
    now, Incident, IncidentStatus, MaintenanceWindow, NewIncident, NewStatusUpdate, Pagination,
    StatusUpdate, Timestamp,
};

use crate::aggregate::{aggregate_incidents, DayGroup, EmptyDays};
use crate::notify::{self, Notifier};
use crate::update_log::{self, UpdateLog};
use crate::{cascade, cursor, CoreError, CoreSettings};

/// Title given to incidents created without one.
pub const DEFAULT_TITLE: &str = "Unknown";

/// Incidents shown on the dashboard.
const DASHBOARD_LIMIT: i64 = 30;

/// RFC 1123 with a numeric zone, e.g. `Mon, 02 Jan 2006 15:04:05 -0700`.
const RFC1123Z: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Owns every write to incidents.
#[derive(Clone)]
pub struct IncidentManager {
    pool: DbPool,
    settings: CoreSettings,
    notifier: Option<Arc<dyn Notifier>>,
}

impl IncidentManager {
    pub fn new(pool: DbPool, settings: CoreSettings, notifier: Option<Arc<dyn Notifier>>) -> Self {
        Self {
            pool,
            settings,
            notifier,
        }
    }

    /// Creates an incident, cascades its service statuses and announces it.
    ///
    /// # Errors
    ///
    /// `Validation` when the payload declares the maintenance status, or
    /// flags maintenance without a window. Storage errors roll back both
    /// the incident and its cascade.
    pub fn create(&self, new: NewIncident) -> Result<Incident, CoreError> {
        if new.status == Some(IncidentStatus::ScheduledMaintenance) {
            return Err(CoreError::validation(
                "scheduled maintenance must be created through the maintenance endpoints",
            ));
        }
        if new.is_maintenance && new.maintenance.is_none() {
            return Err(CoreError::validation(
                "maintenance incidents need a maintenance window",
            ));
        }

        let at = now();
        let status = new.status.unwrap_or(self.settings.default_incident_status);
        let time = new.time.unwrap_or(at);

        let mut updates = Vec::with_capacity(new.updates.len().max(1));
        for (n, payload) in new.updates.into_iter().enumerate() {
            updates.push(initial_update(n as i64, payload, status, time)?);
        }
        if updates.is_empty() {
            let message = match (new.is_maintenance, new.maintenance) {
                (true, Some(window)) => maintenance_message(&window),
                _ => format!("Initial status of {status}"),
            };
            updates.push(StatusUpdate {
                id: 0,
                time,
                status,
                message,
                services: new.services.clone(),
            });
        }

        let mut incident = Incident {
            id: 0,
            title: if new.title.trim().is_empty() {
                DEFAULT_TITLE.to_string()
            } else {
                new.title
            },
            status,
            time,
            is_maintenance: new.is_maintenance,
            maintenance: new.maintenance,
            services: new.services,
            next_update_id: updates.len() as i64,
            updates,
            original_tweet_id: 0,
            latest_tweet_id: 0,
            created_at: at,
            updated_at: at,
        };

        {
            let mut conn = self.pool.get()?;
            in_transaction(&mut conn, |store| {
                cascade::apply_create(store, &incident.services, incident.is_maintenance)?;
                store.create(&mut incident)?;
                Ok::<_, CoreError>(())
            })?;
        }

        tracing::info!(
            id = incident.id,
            status = %incident.status,
            services = incident.services.len(),
            "created incident"
        );

        let text = notify::incident_created_text(&incident);
        if let Some(post_id) = notify::post_best_effort(self.notifier.as_deref(), &text, None) {
            notify::store_post_id(
                &self.pool,
                &mut incident,
                |i| &mut i.original_tweet_id,
                post_id,
            );
        }

        Ok(incident)
    }

    /// Appends an update, moves the incident to the update's status and
    /// cascades it.
    ///
    /// # Errors
    ///
    /// `Validation` for a non-positive id, a blank message or status, or
    /// an unknown status. `NotFound` when the incident does not exist.
    pub fn append_update(&self, id: i64, payload: NewStatusUpdate) -> Result<Incident, CoreError> {
        let status = update_log::validate(Incident::KIND, id, &payload)?;

        let mut conn = self.pool.get()?;
        let (mut incident, update) = in_transaction(&mut conn, |store| {
            let mut incident: Incident = store.get(id)?.ok_or(CoreError::NotFound {
                kind: Incident::KIND,
                id,
            })?;
            let update = update_log::append(&mut incident, status, payload);
            incident.status = status;
            cascade::apply_update(store, &mut incident.services, &update)?;
            store.update(&mut incident)?;
            Ok::<_, CoreError>((incident, update))
        })?;

        drop(conn);
        tracing::info!(id, update_id = update.id, status = %status, "appended incident update");

        let text = notify::incident_update_text(&incident, &update);
        let reply_to = notify::reply_target(incident.original_tweet_id);
        if let Some(post_id) = notify::post_best_effort(self.notifier.as_deref(), &text, reply_to)
        {
            notify::store_post_id(
                &self.pool,
                &mut incident,
                |i| &mut i.latest_tweet_id,
                post_id,
            );
        }

        Ok(incident)
    }

    /// Removes one update by local id. The cascade it caused stays.
    pub fn delete_update(&self, id: i64, update_id: i64) -> Result<(), CoreError> {
        if id <= 0 {
            return Err(CoreError::validation("invalid incident id"));
        }
        let mut conn = self.pool.get()?;
        in_transaction(&mut conn, |store| {
            update_log::delete::<Incident, _>(store, id, update_id)?;
            Ok::<_, CoreError>(())
        })
    }

    pub fn delete(&self, id: i64) -> Result<(), CoreError> {
        let conn = self.pool.get()?;
        SqliteStore::new(&conn).delete::<Incident>(id)?;
        tracing::info!(id, "deleted incident");
        Ok(())
    }

    pub fn get(&self, id: i64) -> Result<Option<Incident>, CoreError> {
        let conn = self.pool.get()?;
        Ok(SqliteStore::new(&conn).get(id)?)
    }

    /// Newest-first incidents. `latest` restricts to the aggregation window.
    pub fn list(&self, latest: bool, pagination: &Pagination) -> Result<Vec<Incident>, CoreError> {
        self.list_at(latest, pagination, now())
    }

    fn list_at(
        &self,
        latest: bool,
        pagination: &Pagination,
        at: Timestamp,
    ) -> Result<Vec<Incident>, CoreError> {
        let conn = self.pool.get()?;
        let store = SqliteStore::new(&conn);
        Ok(cursor::page_incidents(
            &store,
            latest,
            pagination,
            self.settings.days_to_aggregate,
            at,
        )?)
    }

    pub fn list_updates(&self, id: i64) -> Result<Option<Vec<StatusUpdate>>, CoreError> {
        let conn = self.pool.get()?;
        Ok(update_log::list::<Incident, _>(&SqliteStore::new(&conn), id)?)
    }

    pub fn get_update(&self, id: i64, update_id: i64) -> Result<Option<StatusUpdate>, CoreError> {
        let conn = self.pool.get()?;
        Ok(update_log::find::<Incident, _>(
            &SqliteStore::new(&conn),
            id,
            update_id,
        )?)
    }

    /// Recent incidents by day, with the configured trailing empty days.
    pub fn recent_by_day(&self) -> Result<Vec<DayGroup<Incident>>, CoreError> {
        let at = now();
        let incidents = self.list_at(true, &Pagination::with_limit(DASHBOARD_LIMIT), at)?;
        Ok(aggregate_incidents(
            incidents,
            Some(EmptyDays {
                count: self.settings.empty_days_to_show,
                until: at,
            }),
        ))
    }

    /// One page of incident history by day.
    pub fn history_by_day(
        &self,
        pagination: &Pagination,
    ) -> Result<Vec<DayGroup<Incident>>, CoreError> {
        Ok(aggregate_incidents(self.list(false, pagination)?, None))
    }
}

fn initial_update(
    id: i64,
    payload: NewStatusUpdate,
    default_status: IncidentStatus,
    default_time: Timestamp,
) -> Result<StatusUpdate, CoreError> {
    let status = if payload.status.trim().is_empty() {
        default_status
    } else {
        payload
            .status
            .parse()
            .map_err(|_| CoreError::validation("invalid status value"))?
    };
    Ok(StatusUpdate {
        id,
        time: payload.time.unwrap_or(default_time),
        status,
        message: payload.message,
        services: payload.services,
    })
}

fn maintenance_message(window: &MaintenanceWindow) -> String {
    format!(
        "Starts at {} with a scheduled end at {}",
        window.start.format(RFC1123Z),
        window.end.format(RFC1123Z)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};

    #[test]
    fn maintenance_message_uses_rfc1123_with_numeric_zone() {
        let window = MaintenanceWindow {
            start: DateTime::<FixedOffset>::parse_from_rfc3339("2024-06-01T02:00:00-07:00")
                .unwrap(),
            end: DateTime::<FixedOffset>::parse_from_rfc3339("2024-06-01T04:30:00-07:00")
                .unwrap(),
        };
        assert_eq!(
            maintenance_message(&window),
            "Starts at Sat, 01 Jun 2024 02:00:00 -0700 with a scheduled end at Sat, 01 Jun 2024 04:30:00 -0700"
        );
    }

    #[test]
    fn supplied_updates_default_status_and_time() {
        let at = now();
        let update = initial_update(
            4,
            NewStatusUpdate::new("", "first look"),
            IncidentStatus::Identified,
            at,
        )
        .unwrap();
        assert_eq!(update.id, 4);
        assert_eq!(update.status, IncidentStatus::Identified);
        assert_eq!(update.time, at);

        assert!(initial_update(0, NewStatusUpdate::new("bogus", "x"), update.status, at).is_err());
    }
}
