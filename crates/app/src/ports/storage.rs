//! Storage port — repository traits for persistence.
//!
//! Every trait also gets a blanket impl for `Arc<T>` so a single adapter
//! instance can be shared between the use-case structs that need it.

use std::future::Future;
use std::sync::Arc;

use lumen_domain::audit::AuditRecord;
use lumen_domain::device::Device;
use lumen_domain::error::LumenError;
use lumen_domain::id::{DeviceId, NotificationId, ScheduleId, UserId};
use lumen_domain::notification::Notification;
use lumen_domain::schedule::Schedule;

/// Repository for the canonical state of every [`Device`].
pub trait DeviceRepository {
    /// Create a new device in storage.
    fn create(&self, device: Device) -> impl Future<Output = Result<Device, LumenError>> + Send;

    /// Get a device by its externally-assigned id.
    fn get(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, LumenError>> + Send;

    /// Get all devices.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, LumenError>> + Send;

    /// Update an existing device.
    fn update(&self, device: Device) -> impl Future<Output = Result<Device, LumenError>> + Send;
}

impl<T: DeviceRepository + Send + Sync> DeviceRepository for Arc<T> {
    fn create(&self, device: Device) -> impl Future<Output = Result<Device, LumenError>> + Send {
        (**self).create(device)
    }

    fn get(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, LumenError>> + Send {
        (**self).get(device_id)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, LumenError>> + Send {
        (**self).get_all()
    }

    fn update(&self, device: Device) -> impl Future<Output = Result<Device, LumenError>> + Send {
        (**self).update(device)
    }
}

/// Append-only store of [`AuditRecord`]s.
///
/// `append` never checks device liveness — history must survive device
/// deletion. No update or delete is exposed.
pub trait AuditLogRepository {
    /// Append one immutable record.
    fn append(
        &self,
        record: AuditRecord,
    ) -> impl Future<Output = Result<AuditRecord, LumenError>> + Send;

    /// Records for one device, newest first, at most `limit`.
    fn find_by_device(
        &self,
        device_id: &DeviceId,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<AuditRecord>, LumenError>> + Send;
}

impl<T: AuditLogRepository + Send + Sync> AuditLogRepository for Arc<T> {
    fn append(
        &self,
        record: AuditRecord,
    ) -> impl Future<Output = Result<AuditRecord, LumenError>> + Send {
        (**self).append(record)
    }

    fn find_by_device(
        &self,
        device_id: &DeviceId,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<AuditRecord>, LumenError>> + Send {
        (**self).find_by_device(device_id, limit)
    }
}

/// Repository for persisting and querying [`Schedule`]s.
pub trait ScheduleRepository {
    /// Create a new schedule in storage.
    fn create(
        &self,
        schedule: Schedule,
    ) -> impl Future<Output = Result<Schedule, LumenError>> + Send;

    /// Get a schedule by its unique identifier.
    fn get_by_id(
        &self,
        id: ScheduleId,
    ) -> impl Future<Output = Result<Option<Schedule>, LumenError>> + Send;

    /// Get all schedules.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Schedule>, LumenError>> + Send;

    /// Get all enabled schedules.
    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Schedule>, LumenError>> + Send;

    /// Update an existing schedule.
    fn update(
        &self,
        schedule: Schedule,
    ) -> impl Future<Output = Result<Schedule, LumenError>> + Send;

    /// Delete a schedule by its unique identifier.
    fn delete(&self, id: ScheduleId) -> impl Future<Output = Result<(), LumenError>> + Send;
}

impl<T: ScheduleRepository + Send + Sync> ScheduleRepository for Arc<T> {
    fn create(
        &self,
        schedule: Schedule,
    ) -> impl Future<Output = Result<Schedule, LumenError>> + Send {
        (**self).create(schedule)
    }

    fn get_by_id(
        &self,
        id: ScheduleId,
    ) -> impl Future<Output = Result<Option<Schedule>, LumenError>> + Send {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Schedule>, LumenError>> + Send {
        (**self).get_all()
    }

    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Schedule>, LumenError>> + Send {
        (**self).get_enabled()
    }

    fn update(
        &self,
        schedule: Schedule,
    ) -> impl Future<Output = Result<Schedule, LumenError>> + Send {
        (**self).update(schedule)
    }

    fn delete(&self, id: ScheduleId) -> impl Future<Output = Result<(), LumenError>> + Send {
        (**self).delete(id)
    }
}

/// Repository for per-user [`Notification`]s.
pub trait NotificationRepository {
    /// Create a new notification in storage.
    fn create(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<Notification, LumenError>> + Send;

    /// Get a notification by its unique identifier.
    fn get_by_id(
        &self,
        id: NotificationId,
    ) -> impl Future<Output = Result<Option<Notification>, LumenError>> + Send;

    /// Notifications owned by one user, newest first.
    fn find_by_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Notification>, LumenError>> + Send;

    /// Update an existing notification (only the `read` flag ever changes).
    fn update(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<Notification, LumenError>> + Send;
}

impl<T: NotificationRepository + Send + Sync> NotificationRepository for Arc<T> {
    fn create(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<Notification, LumenError>> + Send {
        (**self).create(notification)
    }

    fn get_by_id(
        &self,
        id: NotificationId,
    ) -> impl Future<Output = Result<Option<Notification>, LumenError>> + Send {
        (**self).get_by_id(id)
    }

    fn find_by_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Notification>, LumenError>> + Send {
        (**self).find_by_user(user_id)
    }

    fn update(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<Notification, LumenError>> + Send {
        (**self).update(notification)
    }
}
