//! Persisted record shapes and the payloads that create or change them.

use serde::{Deserialize, Serialize};

use crate::{IncidentStatus, ServiceStatus, Timestamp};

/// A service named by an event, with the status the event assigns to it
/// and the region codes (scoped to that service) it affects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRef {
    /// Service name, matched against the service registry.
    pub name: String,
    /// Status this event assigns to the service and its listed regions.
    #[serde(default)]
    pub status: ServiceStatus,
    /// Region codes under this service.
    #[serde(default)]
    pub regions: Vec<String>,
}

impl ServiceRef {
    /// Creates a reference with the given status and regions.
    pub fn new(name: impl Into<String>, status: ServiceStatus, regions: &[&str]) -> Self {
        Self {
            name: name.into(),
            status,
            regions: regions.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// Start and end of a maintenance-flagged incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

/// One entry in an event's update log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// Position in the parent's local sequence, starting at 0. Never reused.
    pub id: i64,
    pub time: Timestamp,
    pub status: IncidentStatus,
    pub message: String,
    /// Services this particular update targets; may be a subset of the
    /// parent's services.
    #[serde(default)]
    pub services: Vec<ServiceRef>,
}

/// An unplanned service-health event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    /// Sequence-assigned identifier; 0 until stored.
    pub id: i64,
    pub title: String,
    pub status: IncidentStatus,
    /// When the event started.
    pub time: Timestamp,
    #[serde(default)]
    pub is_maintenance: bool,
    #[serde(default)]
    pub maintenance: Option<MaintenanceWindow>,
    #[serde(default)]
    pub services: Vec<ServiceRef>,
    #[serde(default)]
    pub updates: Vec<StatusUpdate>,
    /// Next local update ID. Survives deletes so IDs are never recycled.
    #[serde(default)]
    pub next_update_id: i64,
    /// Post ID of the announcement; 0 when unset.
    #[serde(default)]
    pub original_tweet_id: i64,
    /// Post ID of the most recent update announcement; 0 when unset.
    #[serde(default)]
    pub latest_tweet_id: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A planned service-health event with a start/end window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledMaintenance {
    /// Sequence-assigned identifier; 0 until stored.
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub planned_start: Timestamp,
    pub planned_end: Timestamp,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub services: Vec<ServiceRef>,
    #[serde(default)]
    pub updates: Vec<StatusUpdate>,
    #[serde(default)]
    pub next_update_id: i64,
    #[serde(default)]
    pub original_tweet_id: i64,
    #[serde(default)]
    pub latest_tweet_id: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A monitored service and its current status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    /// Unique service name.
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: ServiceStatus,
    /// Disabled services are hidden from the dashboard.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A region of a service. Codes are unique per service, not globally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: i64,
    /// Name of the owning service.
    pub service_name: String,
    /// Region code, e.g. `us-1`.
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: ServiceStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

fn default_enabled() -> bool {
    true
}

/// Payload for creating an incident. Unset fields take defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIncident {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: Option<IncidentStatus>,
    #[serde(default)]
    pub time: Option<Timestamp>,
    #[serde(default)]
    pub is_maintenance: bool,
    #[serde(default)]
    pub maintenance: Option<MaintenanceWindow>,
    #[serde(default)]
    pub services: Vec<ServiceRef>,
    #[serde(default)]
    pub updates: Vec<NewStatusUpdate>,
}

/// Payload for appending an update. `status` is resolved
/// case-insensitively against [`IncidentStatus`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStatusUpdate {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub time: Option<Timestamp>,
    #[serde(default)]
    pub services: Vec<ServiceRef>,
}

impl NewStatusUpdate {
    /// Creates an update payload targeting no particular services.
    pub fn new(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// Adds a targeted service to the payload.
    pub fn with_service(mut self, service: ServiceRef) -> Self {
        self.services.push(service);
        self
    }
}

/// Payload for creating a scheduled maintenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewScheduledMaintenance {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub planned_start: Timestamp,
    pub planned_end: Timestamp,
    #[serde(default)]
    pub services: Vec<ServiceRef>,
}

/// Payload for patching a scheduled maintenance.
///
/// Only these four fields can change; absent or empty values keep the
/// stored ones. Any other field in an incoming document is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledMaintenancePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub planned_start: Option<Timestamp>,
    #[serde(default)]
    pub planned_end: Option<Timestamp>,
}

/// A service the deployment expects to exist, with its regions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSeed {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub regions: Vec<RegionSeed>,
}

/// A region the deployment expects under a seeded service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSeed {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}
