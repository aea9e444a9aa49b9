//! Status lifecycle for statusboard.
//!
//! The managers in this crate are the only writers of incidents and
//! scheduled maintenance. Every write that changes an event also cascades
//! its status onto the affected services and regions, and both land in a
//! single database transaction. Announcements go out afterwards through an
//! optional [`Notifier`]; their failure never fails the operation.
//!
//! All operations are synchronous. Async callers should run them on a
//! blocking thread.

pub mod aggregate;
pub mod cascade;
pub mod cursor;
pub mod dashboard;
mod error;
pub mod incidents;
pub mod maintenance;
pub mod notify;
pub mod services;
mod settings;
pub mod update_log;

pub use aggregate::{AggregatedMaintenance, DayGroup};
pub use dashboard::Dashboard;
pub use error::CoreError;
pub use incidents::IncidentManager;
pub use maintenance::MaintenanceManager;
pub use notify::{HttpNotifier, Notifier, NotifyError};
pub use settings::CoreSettings;
