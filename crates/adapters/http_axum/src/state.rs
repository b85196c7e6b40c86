//! Shared application state for axum handlers.

use std::sync::Arc;

use lumen_app::event_bus::InProcessEventBus;
use lumen_app::ports::{
    AuditLogRepository, DeviceRepository, EventPublisher, NotificationRepository,
    ScheduleRepository,
};
use lumen_app::services::notification_service::NotificationService;
use lumen_app::services::registry_service::DeviceRegistry;
use lumen_app::services::schedule_service::ScheduleService;
use lumen_app::transition_engine::TransitionEngine;

/// Application state shared across all axum handlers.
///
/// Generic over the repository types and event publisher to avoid dynamic
/// dispatch. `Clone` is implemented manually so the underlying types
/// themselves do not need to be `Clone` — only the `Arc` wrappers are cloned.
pub struct AppState<DR, AL, SR, NR, P> {
    /// Device registration and lookup.
    pub registry: Arc<DeviceRegistry<DR, P>>,
    /// The orchestrator every state change goes through.
    pub engine: Arc<TransitionEngine<DR, AL, NR, P>>,
    /// Schedule CRUD service.
    pub schedules: Arc<ScheduleService<SR>>,
    /// Notification dispatch and read tracking.
    pub notifications: Arc<NotificationService<NR>>,
    /// Audit log queried directly for device history. Arrives already
    /// shareable (in practice an `Arc`-wrapped repository, shared with the
    /// engine), so no extra wrapping happens here.
    pub audit_log: AL,
    /// Event bus subscribed to by the SSE stream.
    pub event_bus: Arc<InProcessEventBus>,
}

impl<DR, AL: Clone, SR, NR, P> Clone for AppState<DR, AL, SR, NR, P> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            engine: Arc::clone(&self.engine),
            schedules: Arc::clone(&self.schedules),
            notifications: Arc::clone(&self.notifications),
            audit_log: self.audit_log.clone(),
            event_bus: Arc::clone(&self.event_bus),
        }
    }
}

impl<DR, AL, SR, NR, P> AppState<DR, AL, SR, NR, P>
where
    DR: DeviceRepository + Send + Sync + 'static,
    AL: AuditLogRepository + Send + Sync + 'static,
    SR: ScheduleRepository + Send + Sync + 'static,
    NR: NotificationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    /// Create a new application state from pre-wrapped `Arc` instances.
    ///
    /// The engine is shared with the schedule evaluator task, so it arrives
    /// already wrapped.
    pub fn new(
        registry: Arc<DeviceRegistry<DR, P>>,
        engine: Arc<TransitionEngine<DR, AL, NR, P>>,
        schedules: Arc<ScheduleService<SR>>,
        notifications: Arc<NotificationService<NR>>,
        audit_log: AL,
        event_bus: Arc<InProcessEventBus>,
    ) -> Self {
        Self {
            registry,
            engine,
            schedules,
            notifications,
            audit_log,
            event_bus,
        }
    }
}
