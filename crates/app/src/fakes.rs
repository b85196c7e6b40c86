//! In-memory fakes implementing the storage ports, shared by use-case tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use lumen_domain::audit::AuditRecord;
use lumen_domain::device::Device;
use lumen_domain::error::LumenError;
use lumen_domain::id::{DeviceId, NotificationId, ScheduleId, UserId};
use lumen_domain::notification::Notification;
use lumen_domain::schedule::Schedule;

use crate::ports::{
    AuditLogRepository, DeviceRepository, NotificationRepository, ScheduleRepository,
};

async fn maybe_wait(delay: Option<Duration>) {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

#[derive(Default)]
pub(crate) struct InMemoryDeviceRepo {
    store: Mutex<HashMap<DeviceId, Device>>,
    delay: Option<Duration>,
    fail_updates: bool,
    get_calls: AtomicUsize,
}

impl InMemoryDeviceRepo {
    pub(crate) fn with_devices(devices: Vec<Device>) -> Self {
        let map: HashMap<_, _> = devices
            .into_iter()
            .map(|d| (d.device_id.clone(), d))
            .collect();
        Self {
            store: Mutex::new(map),
            ..Self::default()
        }
    }

    /// Every read completes only after `delay`, for deadline tests.
    pub(crate) fn slow(devices: Vec<Device>, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::with_devices(devices)
        }
    }

    /// Reads succeed, every update fails, for inconsistency tests.
    pub(crate) fn failing_updates(devices: Vec<Device>) -> Self {
        Self {
            fail_updates: true,
            ..Self::with_devices(devices)
        }
    }

    pub(crate) fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }
}

impl DeviceRepository for InMemoryDeviceRepo {
    fn create(&self, device: Device) -> impl Future<Output = Result<Device, LumenError>> + Send {
        let mut store = self.store.lock().unwrap();
        store.insert(device.device_id.clone(), device.clone());
        async move { Ok(device) }
    }

    fn get(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, LumenError>> + Send {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.store.lock().unwrap().get(device_id).cloned();
        let delay = self.delay;
        async move {
            maybe_wait(delay).await;
            Ok(result)
        }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, LumenError>> + Send {
        let result: Vec<Device> = self.store.lock().unwrap().values().cloned().collect();
        async move { Ok(result) }
    }

    fn update(&self, device: Device) -> impl Future<Output = Result<Device, LumenError>> + Send {
        let stored = if self.fail_updates {
            None
        } else {
            let mut store = self.store.lock().unwrap();
            store.insert(device.device_id.clone(), device.clone());
            Some(device)
        };
        let delay = self.delay;
        async move {
            maybe_wait(delay).await;
            stored.ok_or_else(|| LumenError::Storage(Box::new(std::io::Error::other("update rejected"))))
        }
    }
}

#[derive(Default)]
pub(crate) struct InMemoryAuditRepo {
    store: Mutex<Vec<AuditRecord>>,
}

impl InMemoryAuditRepo {
    pub(crate) fn records(&self) -> Vec<AuditRecord> {
        self.store.lock().unwrap().clone()
    }
}

impl AuditLogRepository for InMemoryAuditRepo {
    fn append(
        &self,
        record: AuditRecord,
    ) -> impl Future<Output = Result<AuditRecord, LumenError>> + Send {
        self.store.lock().unwrap().push(record.clone());
        async move { Ok(record) }
    }

    fn find_by_device(
        &self,
        device_id: &DeviceId,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<AuditRecord>, LumenError>> + Send {
        let mut result: Vec<AuditRecord> = self
            .store
            .lock()
            .unwrap()
            .iter()
            .filter(|r| &r.device_id == device_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result.truncate(limit as usize);
        async move { Ok(result) }
    }
}

#[derive(Default)]
pub(crate) struct InMemoryScheduleRepo {
    store: Mutex<HashMap<ScheduleId, Schedule>>,
}

impl InMemoryScheduleRepo {
    pub(crate) fn with_schedules(schedules: Vec<Schedule>) -> Self {
        let map: HashMap<_, _> = schedules.into_iter().map(|s| (s.id, s)).collect();
        Self {
            store: Mutex::new(map),
        }
    }
}

impl ScheduleRepository for InMemoryScheduleRepo {
    fn create(
        &self,
        schedule: Schedule,
    ) -> impl Future<Output = Result<Schedule, LumenError>> + Send {
        let mut store = self.store.lock().unwrap();
        store.insert(schedule.id, schedule.clone());
        async move { Ok(schedule) }
    }

    fn get_by_id(
        &self,
        id: ScheduleId,
    ) -> impl Future<Output = Result<Option<Schedule>, LumenError>> + Send {
        let result = self.store.lock().unwrap().get(&id).cloned();
        async move { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Schedule>, LumenError>> + Send {
        let result: Vec<Schedule> = self.store.lock().unwrap().values().cloned().collect();
        async move { Ok(result) }
    }

    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Schedule>, LumenError>> + Send {
        let result: Vec<Schedule> = self
            .store
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.enabled)
            .cloned()
            .collect();
        async move { Ok(result) }
    }

    fn update(
        &self,
        schedule: Schedule,
    ) -> impl Future<Output = Result<Schedule, LumenError>> + Send {
        let mut store = self.store.lock().unwrap();
        store.insert(schedule.id, schedule.clone());
        async move { Ok(schedule) }
    }

    fn delete(&self, id: ScheduleId) -> impl Future<Output = Result<(), LumenError>> + Send {
        self.store.lock().unwrap().remove(&id);
        async move { Ok(()) }
    }
}

#[derive(Default)]
pub(crate) struct InMemoryNotificationRepo {
    store: Mutex<Vec<Notification>>,
}

impl InMemoryNotificationRepo {
    pub(crate) fn all(&self) -> Vec<Notification> {
        self.store.lock().unwrap().clone()
    }
}

impl NotificationRepository for InMemoryNotificationRepo {
    fn create(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<Notification, LumenError>> + Send {
        self.store.lock().unwrap().push(notification.clone());
        async move { Ok(notification) }
    }

    fn get_by_id(
        &self,
        id: NotificationId,
    ) -> impl Future<Output = Result<Option<Notification>, LumenError>> + Send {
        let result = self
            .store
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.id == id)
            .cloned();
        async move { Ok(result) }
    }

    fn find_by_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Notification>, LumenError>> + Send {
        let mut result: Vec<Notification> = self
            .store
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        async move { Ok(result) }
    }

    fn update(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<Notification, LumenError>> + Send {
        let mut store = self.store.lock().unwrap();
        if let Some(slot) = store.iter_mut().find(|n| n.id == notification.id) {
            *slot = notification.clone();
        }
        async move { Ok(notification) }
    }
}
