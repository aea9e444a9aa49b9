//! The update log shared by incidents and scheduled maintenance.

use statusboard_db::{Entity, RecordStore, StoreError};
use statusboard_types::{
    now, Incident, IncidentStatus, NewStatusUpdate, ScheduledMaintenance, ServiceRef,
    StatusUpdate,
};

use crate::CoreError;

/// An event record carrying a locally numbered list of status updates.
pub trait UpdateLog: Entity {
    /// Record family name used in errors and logs.
    const KIND: &'static str;

    fn updates(&self) -> &[StatusUpdate];
    fn updates_mut(&mut self) -> &mut Vec<StatusUpdate>;
    fn next_update_id_mut(&mut self) -> &mut i64;
    fn services_mut(&mut self) -> &mut Vec<ServiceRef>;
}

impl UpdateLog for Incident {
    const KIND: &'static str = "incident";

    fn updates(&self) -> &[StatusUpdate] {
        &self.updates
    }

    fn updates_mut(&mut self) -> &mut Vec<StatusUpdate> {
        &mut self.updates
    }

    fn next_update_id_mut(&mut self) -> &mut i64 {
        &mut self.next_update_id
    }

    fn services_mut(&mut self) -> &mut Vec<ServiceRef> {
        &mut self.services
    }
}

impl UpdateLog for ScheduledMaintenance {
    const KIND: &'static str = "scheduled maintenance";

    fn updates(&self) -> &[StatusUpdate] {
        &self.updates
    }

    fn updates_mut(&mut self) -> &mut Vec<StatusUpdate> {
        &mut self.updates
    }

    fn next_update_id_mut(&mut self) -> &mut i64 {
        &mut self.next_update_id
    }

    fn services_mut(&mut self) -> &mut Vec<ServiceRef> {
        &mut self.services
    }
}

/// Checks an incoming update and resolves its status string.
pub(crate) fn validate(
    kind: &str,
    id: i64,
    payload: &NewStatusUpdate,
) -> Result<IncidentStatus, CoreError> {
    if id <= 0 {
        return Err(CoreError::validation(format!("invalid {kind} id")));
    }
    if payload.message.trim().is_empty() {
        return Err(CoreError::validation("message property is missing"));
    }
    if payload.status.trim().is_empty() {
        return Err(CoreError::validation("status property is missing"));
    }
    payload
        .status
        .parse()
        .map_err(|_| CoreError::validation("invalid status value"))
}

/// Appends an update under the next unused local id and returns a copy.
///
/// Ids never go backwards, even after deletes.
pub(crate) fn append<T: UpdateLog>(
    record: &mut T,
    status: IncidentStatus,
    payload: NewStatusUpdate,
) -> StatusUpdate {
    let len = record.updates().len() as i64;
    let next = record.next_update_id_mut();
    let id = (*next).max(len);
    *next = id + 1;

    let update = StatusUpdate {
        id,
        time: payload.time.unwrap_or_else(now),
        status,
        message: payload.message,
        services: payload.services,
    };
    record.updates_mut().push(update.clone());
    update
}

/// Removes the update with the given local id. Returns whether one was
/// removed.
pub(crate) fn remove<T: UpdateLog>(record: &mut T, update_id: i64) -> bool {
    let updates = record.updates_mut();
    let before = updates.len();
    updates.retain(|u| u.id != update_id);
    updates.len() != before
}

/// All updates of a record, or `None` when the record does not exist.
pub(crate) fn list<T: UpdateLog, S: RecordStore>(
    store: &S,
    id: i64,
) -> Result<Option<Vec<StatusUpdate>>, StoreError> {
    Ok(store.get::<T>(id)?.map(|r| r.updates().to_vec()))
}

/// One update by local id, or `None` when either level is missing.
pub(crate) fn find<T: UpdateLog, S: RecordStore>(
    store: &S,
    id: i64,
    update_id: i64,
) -> Result<Option<StatusUpdate>, StoreError> {
    Ok(store
        .get::<T>(id)?
        .and_then(|r| r.updates().iter().find(|u| u.id == update_id).cloned()))
}

/// Removes one update and re-persists its record. Missing records and
/// updates are not errors.
pub(crate) fn delete<T: UpdateLog, S: RecordStore>(
    store: &S,
    id: i64,
    update_id: i64,
) -> Result<(), StoreError> {
    let Some(mut record) = store.get::<T>(id)? else {
        return Ok(());
    };
    if !remove(&mut record, update_id) {
        return Ok(());
    }
    store.update(&mut record)?;
    tracing::info!(kind = T::KIND, id, update_id, "deleted status update");
    Ok(())
}
