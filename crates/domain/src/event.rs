//! Event — a fact published on the in-process bus after state has been
//! durably recorded. Consumers observe; they never feed back into the
//! transition path.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::{DeviceId, EventId};
use crate::time::Timestamp;

/// Discriminant for [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    DeviceRegistered,
    TransitionApplied,
    ScheduleFired,
    ScheduleMisfired,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeviceRegistered => f.write_str("device_registered"),
            Self::TransitionApplied => f.write_str("transition_applied"),
            Self::ScheduleFired => f.write_str("schedule_fired"),
            Self::ScheduleMisfired => f.write_str("schedule_misfired"),
        }
    }
}

/// Something that happened, with a free-form JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    pub device_id: Option<DeviceId>,
    pub data: Value,
    pub timestamp: Timestamp,
}

impl Event {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn new(event_type: EventType, device_id: Option<DeviceId>, data: Value) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            device_id,
            data,
            timestamp: crate::time::now(),
        }
    }
}
