//! Audit record — an immutable, append-only entry capturing one transition.
//!
//! Records reference devices by [`DeviceId`] only, never by row ownership,
//! so history survives device deletion.

use serde::{Deserialize, Serialize};

use crate::device::DeviceStatus;
use crate::id::{AuditRecordId, DeviceId};
use crate::time::Timestamp;

/// A historical entry describing what a device transitioned *to*.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: AuditRecordId,
    pub device_id: DeviceId,
    /// Action label, e.g. `status_changed_to_on`.
    pub action: String,
    /// Post-transition brightness.
    pub brightness: u8,
    /// Post-transition color.
    pub color: String,
    /// Watt-hours consumed since the previous transition, when known.
    pub power_consumed: Option<f64>,
    /// Minutes spent in the previous state, when known.
    pub duration_minutes: Option<i64>,
    pub created_at: Timestamp,
}

impl AuditRecord {
    /// Create a builder for constructing an [`AuditRecord`].
    #[must_use]
    pub fn builder() -> AuditRecordBuilder {
        AuditRecordBuilder::default()
    }

    /// The record written for a transition of `device_id` into `status`
    /// with the given effective values.
    #[must_use]
    pub fn for_transition(
        device_id: DeviceId,
        status: DeviceStatus,
        brightness: u8,
        color: impl Into<String>,
    ) -> Self {
        Self::builder()
            .device_id(device_id)
            .action(status.audit_action())
            .brightness(brightness)
            .color(color)
            .build()
    }
}

/// Step-by-step builder for [`AuditRecord`].
#[derive(Debug, Default)]
pub struct AuditRecordBuilder {
    id: Option<AuditRecordId>,
    device_id: Option<DeviceId>,
    action: Option<String>,
    brightness: Option<u8>,
    color: Option<String>,
    power_consumed: Option<f64>,
    duration_minutes: Option<i64>,
    created_at: Option<Timestamp>,
}

impl AuditRecordBuilder {
    #[must_use]
    pub fn id(mut self, id: AuditRecordId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn device_id(mut self, device_id: DeviceId) -> Self {
        self.device_id = Some(device_id);
        self
    }

    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    #[must_use]
    pub fn brightness(mut self, brightness: u8) -> Self {
        self.brightness = Some(brightness);
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn power_consumed(mut self, watt_hours: f64) -> Self {
        self.power_consumed = Some(watt_hours);
        self
    }

    #[must_use]
    pub fn duration_minutes(mut self, minutes: i64) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    #[must_use]
    pub fn created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Consume the builder and return an [`AuditRecord`].
    ///
    /// # Panics
    ///
    /// Panics if `device_id` was not provided; every call site derives the
    /// record from an existing device.
    #[must_use]
    pub fn build(self) -> AuditRecord {
        AuditRecord {
            id: self.id.unwrap_or_default(),
            device_id: self.device_id.expect("audit record requires a device id"),
            action: self.action.unwrap_or_default(),
            brightness: self.brightness.unwrap_or_default(),
            color: self.color.unwrap_or_default(),
            power_consumed: self.power_consumed,
            duration_minutes: self.duration_minutes,
            created_at: self.created_at.unwrap_or_else(crate::time::now),
        }
    }
}
