//! Service and region registry.
//!
//! The registry only creates and removes records. Their statuses are owned
//! by the cascade.

use statusboard_db::{region_key, RecordStore, ScanControl, ScanDirection};
use statusboard_types::{now, Region, Service, ServiceSeed, ServiceStatus};

use crate::CoreError;

fn collect<T: statusboard_db::Entity, S: RecordStore>(
    store: &S,
    mut keep: impl FnMut(&T) -> bool,
) -> Result<Vec<T>, CoreError> {
    let mut out = Vec::new();
    store.scan(ScanDirection::Forward, |record: T| {
        if keep(&record) {
            out.push(record);
        }
        ScanControl::Continue
    })?;
    Ok(out)
}

/// Registers a service with status [`ServiceStatus::Nominal`].
pub fn create_service<S: RecordStore>(
    store: &S,
    name: &str,
    description: &str,
) -> Result<Service, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::validation("service name is required"));
    }
    if store.find_by_key::<Service>(name)?.is_some() {
        return Err(CoreError::validation(format!(
            "service '{name}' already exists"
        )));
    }

    let at = now();
    let mut service = Service {
        id: 0,
        name: name.to_string(),
        description: description.to_string(),
        status: ServiceStatus::Nominal,
        enabled: true,
        created_at: at,
        updated_at: at,
    };
    store.create(&mut service)?;
    tracing::info!(id = service.id, service = %service.name, "registered service");
    Ok(service)
}

/// Looks a service up by name.
pub fn get_service<S: RecordStore>(store: &S, name: &str) -> Result<Option<Service>, CoreError> {
    Ok(store.find_by_key(name)?)
}

/// All services in registration order.
pub fn list_services<S: RecordStore>(
    store: &S,
    enabled_only: bool,
) -> Result<Vec<Service>, CoreError> {
    collect(store, |s: &Service| !enabled_only || s.enabled)
}

/// Removes a service and every region under it. Missing services are
/// ignored.
pub fn delete_service<S: RecordStore>(store: &S, name: &str) -> Result<(), CoreError> {
    let Some(service) = store.find_by_key::<Service>(name)? else {
        return Ok(());
    };
    for region in regions_for_service(store, name)? {
        store.delete::<Region>(region.id)?;
    }
    store.delete::<Service>(service.id)?;
    tracing::info!(id = service.id, service = name, "removed service");
    Ok(())
}

/// Registers a region under an existing service.
pub fn create_region<S: RecordStore>(
    store: &S,
    service_name: &str,
    code: &str,
    name: &str,
    description: &str,
) -> Result<Region, CoreError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(CoreError::validation("region code is required"));
    }
    if store.find_by_key::<Service>(service_name)?.is_none() {
        return Err(CoreError::validation(format!(
            "unknown service '{service_name}'"
        )));
    }
    if store
        .find_by_key::<Region>(&region_key(service_name, code))?
        .is_some()
    {
        return Err(CoreError::validation(format!(
            "region '{code}' already exists for service '{service_name}'"
        )));
    }

    let at = now();
    let mut region = Region {
        id: 0,
        service_name: service_name.to_string(),
        code: code.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        status: ServiceStatus::Nominal,
        created_at: at,
        updated_at: at,
    };
    store.create(&mut region)?;
    tracing::info!(id = region.id, service = service_name, region = code, "registered region");
    Ok(region)
}

/// All regions in registration order.
pub fn list_regions<S: RecordStore>(store: &S) -> Result<Vec<Region>, CoreError> {
    collect(store, |_: &Region| true)
}

/// Regions registered under one service.
pub fn regions_for_service<S: RecordStore>(
    store: &S,
    service_name: &str,
) -> Result<Vec<Region>, CoreError> {
    collect(store, |r: &Region| r.service_name == service_name)
}

/// Creates any seeded service or region that is not registered yet.
///
/// Existing records, including their statuses, are left alone. Returns
/// the number of records created.
pub fn sync_services<S: RecordStore>(store: &S, seeds: &[ServiceSeed]) -> Result<usize, CoreError> {
    let mut created = 0;
    for seed in seeds {
        if get_service(store, &seed.name)?.is_none() {
            create_service(store, &seed.name, &seed.description)?;
            created += 1;
        }
        for region in &seed.regions {
            let key = region_key(&seed.name, &region.code);
            if store.find_by_key::<Region>(&key)?.is_none() {
                create_region(
                    store,
                    &seed.name,
                    &region.code,
                    &region.name,
                    &region.description,
                )?;
                created += 1;
            }
        }
    }
    if created > 0 {
        tracing::info!(created, "synchronised configured services");
    }
    Ok(created)
}

/// The most critical current status across enabled services and their
/// regions. [`ServiceStatus::Unknown`] when there is nothing to report.
pub fn most_critical_status(services: &[Service], regions: &[Region]) -> ServiceStatus {
    let enabled = |name: &str| services.iter().any(|s| s.enabled && s.name == name);
    services
        .iter()
        .filter(|s| s.enabled)
        .map(|s| s.status)
        .chain(
            regions
                .iter()
                .filter(|r| enabled(&r.service_name))
                .map(|r| r.status),
        )
        .max_by_key(|status| status.criticality())
        .unwrap_or(ServiceStatus::Unknown)
}
