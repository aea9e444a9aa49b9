//! Status cascade: propagates an event's status onto the services and
//! regions it references.
//!
//! Every function here writes through the [`RecordStore`] it is handed.
//! Callers pass a store bound to an open transaction so that the cascade
//! and the owning record commit or roll back together.

use statusboard_db::{region_key, RecordStore, StoreError};
use statusboard_types::{IncidentStatus, Region, Service, ServiceRef, ServiceStatus, StatusUpdate};

/// Sets a service's current status.
///
/// Returns `false` when no service with that name is registered; the
/// cascade never invents registry records.
pub fn set_service_status<S: RecordStore>(
    store: &S,
    name: &str,
    status: ServiceStatus,
) -> Result<bool, StoreError> {
    let Some(mut service) = store.find_by_key::<Service>(name)? else {
        tracing::warn!(service = name, %status, "cascade skipped unknown service");
        return Ok(false);
    };
    if service.status != status {
        service.status = status;
        store.update(&mut service)?;
    }
    Ok(true)
}

/// Sets the current status of one region of a service.
///
/// Returns `false` when the region is not registered under that service.
pub fn set_region_status<S: RecordStore>(
    store: &S,
    service: &str,
    code: &str,
    status: ServiceStatus,
) -> Result<bool, StoreError> {
    let Some(mut region) = store.find_by_key::<Region>(&region_key(service, code))? else {
        tracing::warn!(service, region = code, %status, "cascade skipped unknown region");
        return Ok(false);
    };
    if region.status != status {
        region.status = status;
        store.update(&mut region)?;
    }
    Ok(true)
}

fn apply_ref<S: RecordStore>(
    store: &S,
    service: &ServiceRef,
    status: ServiceStatus,
) -> Result<(), StoreError> {
    set_service_status(store, &service.name, status)?;
    for code in &service.regions {
        set_region_status(store, &service.name, code, status)?;
    }
    Ok(())
}

/// Cascade for a newly created event.
///
/// Ordinary events apply each reference's own status. Maintenance events
/// force every referenced service and region to
/// [`ServiceStatus::ScheduledMaintenance`].
pub fn apply_create<S: RecordStore>(
    store: &S,
    services: &[ServiceRef],
    maintenance: bool,
) -> Result<(), StoreError> {
    for service in services {
        let status = if maintenance {
            ServiceStatus::ScheduledMaintenance
        } else {
            service.status
        };
        apply_ref(store, service, status)?;
    }
    Ok(())
}

/// Cascade for an update appended to an event whose reference list is
/// `parent`.
///
/// A non-resolving update touches only the services it names and patches
/// the matching parent references. A resolving update resets every service
/// and region in `parent` to [`ServiceStatus::Nominal`].
///
/// Returns `true` when the update resolved the event.
pub fn apply_update<S: RecordStore>(
    store: &S,
    parent: &mut [ServiceRef],
    update: &StatusUpdate,
) -> Result<bool, StoreError> {
    if update.status == IncidentStatus::Resolved {
        for service in parent.iter_mut() {
            service.status = ServiceStatus::Nominal;
            apply_ref(store, service, ServiceStatus::Nominal)?;
        }
        return Ok(true);
    }

    for target in &update.services {
        apply_ref(store, target, target.status)?;
        for service in parent.iter_mut().filter(|s| s.name == target.name) {
            service.status = target.status;
        }
    }
    Ok(false)
}
