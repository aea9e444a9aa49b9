//! Tunables the lifecycle managers read from process configuration.

use statusboard_types::IncidentStatus;

/// Behavioural settings for the lifecycle layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreSettings {
    /// Length of the "latest" window, in days, for incident listings.
    pub days_to_aggregate: i64,
    /// Status given to incidents created without one.
    pub default_incident_status: IncidentStatus,
    /// Number of trailing days the dashboard always shows, even when empty.
    pub empty_days_to_show: u32,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            days_to_aggregate: 7,
            default_incident_status: IncidentStatus::Investigating,
            empty_days_to_show: 7,
        }
    }
}
