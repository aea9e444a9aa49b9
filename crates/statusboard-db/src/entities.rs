//! [`Entity`] bindings for the four persisted record families.

use statusboard_types::{Incident, Region, ScheduledMaintenance, Service, Timestamp};

use crate::store::Entity;

/// Natural key of a region: codes are only unique within their service.
///
/// The service name is prefixed with its length in characters, so names and
/// codes that contain `/` cannot produce the same key for different pairs.
pub fn region_key(service_name: &str, code: &str) -> String {
    format!("{}:{service_name}/{code}", service_name.chars().count())
}

impl Entity for Incident {
    const TABLE: &'static str = "incidents";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn set_updated_at(&mut self, at: Timestamp) {
        self.updated_at = at;
    }
}

impl Entity for ScheduledMaintenance {
    const TABLE: &'static str = "scheduled_maintenance";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn set_updated_at(&mut self, at: Timestamp) {
        self.updated_at = at;
    }
}

impl Entity for Service {
    const TABLE: &'static str = "services";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn set_updated_at(&mut self, at: Timestamp) {
        self.updated_at = at;
    }

    fn natural_key(&self) -> Option<String> {
        Some(self.name.clone())
    }
}

impl Entity for Region {
    const TABLE: &'static str = "regions";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn set_updated_at(&mut self, at: Timestamp) {
        self.updated_at = at;
    }

    fn natural_key(&self) -> Option<String> {
        Some(region_key(&self.service_name, &self.code))
    }
}
