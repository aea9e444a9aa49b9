//! The combined view the status page is drawn from.

use serde::Serialize;
use statusboard_db::{DbPool, SqliteStore};
use statusboard_types::{Incident, Region, Service, ServiceStatus};

use crate::aggregate::{AggregatedMaintenance, DayGroup};
use crate::incidents::IncidentManager;
use crate::maintenance::MaintenanceManager;
use crate::{services, CoreError};

/// A service together with its regions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceOverview {
    #[serde(flatten)]
    pub service: Service,
    pub regions: Vec<Region>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub most_critical_status: ServiceStatus,
    pub services: Vec<ServiceOverview>,
    pub incidents: Vec<DayGroup<Incident>>,
    pub scheduled_maintenance: AggregatedMaintenance,
}

/// Builds the dashboard from enabled services, recent incidents and
/// current maintenance.
pub fn build(
    pool: &DbPool,
    incidents: &IncidentManager,
    maintenance: &MaintenanceManager,
) -> Result<Dashboard, CoreError> {
    let (service_list, regions) = {
        let conn = pool.get()?;
        let store = SqliteStore::new(&conn);
        (
            services::list_services(&store, true)?,
            services::list_regions(&store)?,
        )
    };

    let most_critical_status = services::most_critical_status(&service_list, &regions);
    let overviews = service_list
        .into_iter()
        .map(|service| ServiceOverview {
            regions: regions
                .iter()
                .filter(|r| r.service_name == service.name)
                .cloned()
                .collect(),
            service,
        })
        .collect();

    Ok(Dashboard {
        most_critical_status,
        services: overviews,
        incidents: incidents.recent_by_day()?,
        scheduled_maintenance: maintenance.aggregated(true)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use statusboard_types::now;

    #[test]
    fn service_fields_sit_beside_regions() {
        let at = now();
        let overview = ServiceOverview {
            service: Service {
                id: 1,
                name: "chat".to_string(),
                description: String::new(),
                status: ServiceStatus::Degraded,
                enabled: true,
                created_at: at,
                updated_at: at,
            },
            regions: Vec::new(),
        };

        let json = serde_json::to_value(&overview).unwrap();

        assert_eq!(json["name"], "chat");
        assert_eq!(json["status"], "Degraded");
        assert!(json["regions"].as_array().unwrap().is_empty());
        assert!(json.get("service").is_none());
    }
}
