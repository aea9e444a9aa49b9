//! Shared types for the statusboard workspace.
//!
//! This crate holds the persisted record shapes (incidents, scheduled
//! maintenance, services, regions), the two status vocabularies, and the
//! pagination parameters used by list endpoints. Every other crate in the
//! workspace depends on these definitions; this crate depends on none of
//! them.
//!
//! Status values serialise to the exact display strings shown to users
//! (`"Scheduled Maintenance"`, `"Partial-outage"`, ...) and parse
//! case-insensitively, so API payloads can send `"resolved"` or
//! `"RESOLVED"`.

use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod pagination;
mod records;

pub use pagination::Pagination;
pub use records::{
    Incident, MaintenanceWindow, NewIncident, NewScheduledMaintenance, NewStatusUpdate, Region,
    RegionSeed, ScheduledMaintenance, ScheduledMaintenancePatch, Service, ServiceRef, ServiceSeed,
    StatusUpdate,
};

/// Timestamps keep the offset they were recorded with so that day
/// bucketing happens in the event's own zone.
pub type Timestamp = DateTime<FixedOffset>;

/// Returns the current wall-clock time in the local offset.
pub fn now() -> Timestamp {
    Local::now().fixed_offset()
}

/// Error returned when a status string matches no known value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} status: {value}")]
pub struct ParseStatusError {
    /// Which vocabulary was being parsed (`incident` or `service`).
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Lifecycle status of an incident or scheduled maintenance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IncidentStatus {
    /// The problem is being looked at.
    #[default]
    Investigating,
    /// The cause has been found.
    Identified,
    /// A progress note with no change of phase.
    Update,
    /// A fix is in place and being watched.
    Monitoring,
    /// The event is over.
    Resolved,
    /// Planned work. Only the scheduled maintenance manager may use it.
    ScheduledMaintenance,
}

impl IncidentStatus {
    /// Every incident status, in display order.
    pub const ALL: [IncidentStatus; 6] = [
        Self::Investigating,
        Self::Identified,
        Self::Update,
        Self::Monitoring,
        Self::Resolved,
        Self::ScheduledMaintenance,
    ];

    /// Returns the canonical display string for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Investigating => "Investigating",
            Self::Identified => "Identified",
            Self::Update => "Update",
            Self::Monitoring => "Monitoring",
            Self::Resolved => "Resolved",
            Self::ScheduledMaintenance => "Scheduled Maintenance",
        }
    }
}

impl std::fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IncidentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseStatusError {
                kind: "incident",
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for IncidentStatus {
    type Error = ParseStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IncidentStatus> for String {
    fn from(status: IncidentStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Current health of a service or region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ServiceStatus {
    /// Healthy. Restored when an event resolves.
    Nominal,
    /// Working with reduced performance.
    Degraded,
    /// Some functionality unavailable.
    PartialOutage,
    /// Unavailable.
    Outage,
    /// Under planned maintenance.
    ScheduledMaintenance,
    /// No information.
    #[default]
    Unknown,
}

impl ServiceStatus {
    /// Every service status, in display order.
    pub const ALL: [ServiceStatus; 6] = [
        Self::Nominal,
        Self::Degraded,
        Self::PartialOutage,
        Self::Outage,
        Self::ScheduledMaintenance,
        Self::Unknown,
    ];

    /// Returns the canonical display string for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nominal => "Nominal",
            Self::Degraded => "Degraded",
            Self::PartialOutage => "Partial-outage",
            Self::Outage => "Outage",
            Self::ScheduledMaintenance => "Scheduled Maintenance",
            Self::Unknown => "Unknown",
        }
    }

    /// Ranks statuses for the dashboard summary; higher is worse.
    pub fn criticality(self) -> u8 {
        match self {
            Self::Nominal => 0,
            Self::Unknown => 1,
            Self::ScheduledMaintenance => 2,
            Self::Degraded => 3,
            Self::PartialOutage => 4,
            Self::Outage => 5,
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ServiceStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseStatusError {
                kind: "service",
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for ServiceStatus {
    type Error = ParseStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServiceStatus> for String {
    fn from(status: ServiceStatus) -> Self {
        status.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incident_status_parses_case_insensitively() {
        assert_eq!("resolved".parse(), Ok(IncidentStatus::Resolved));
        assert_eq!("MONITORING".parse(), Ok(IncidentStatus::Monitoring));
        assert_eq!(
            "scheduled maintenance".parse(),
            Ok(IncidentStatus::ScheduledMaintenance)
        );
        assert!("fixed".parse::<IncidentStatus>().is_err());
        assert!("".parse::<IncidentStatus>().is_err());
    }

    #[test]
    fn service_status_serialises_as_display_string() {
        let json = serde_json::to_string(&ServiceStatus::PartialOutage).unwrap();
        assert_eq!(json, "\"Partial-outage\"");

        let parsed: ServiceStatus = serde_json::from_str("\"partial-outage\"").unwrap();
        assert_eq!(parsed, ServiceStatus::PartialOutage);

        assert!(serde_json::from_str::<ServiceStatus>("\"sideways\"").is_err());
    }

    #[test]
    fn outage_outranks_everything() {
        let worst = ServiceStatus::ALL
            .into_iter()
            .max_by_key(|s| s.criticality())
            .unwrap();
        assert_eq!(worst, ServiceStatus::Outage);
        assert!(ServiceStatus::Nominal.criticality() < ServiceStatus::Unknown.criticality());
    }
}
