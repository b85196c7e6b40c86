//! Transition engine — the orchestration core for device state changes.
//!
//! Every mutation of a device flows through [`TransitionEngine::request_transition`]:
//! validate, serialize per device, append the audit record, then apply the
//! registry update. The audit append happens before the registry write, so an
//! update failure after a successful append is a detected inconsistency, never
//! a silent one.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use lumen_domain::audit::AuditRecord;
use lumen_domain::device::{Device, StateChange};
use lumen_domain::error::{InconsistencyError, LumenError, NotFoundError, TimeoutError};
use lumen_domain::event::{Event, EventType};
use lumen_domain::id::{DeviceId, UserId};
use lumen_domain::notification::{Notification, NotificationKind};
use lumen_domain::time::now;

use crate::ports::{AuditLogRepository, DeviceRepository, EventPublisher, NotificationRepository};

/// One requested state change for one device.
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub device_id: DeviceId,
    pub change: StateChange,
    /// The user the outcome notification is addressed to. Transitions with
    /// no initiator (schedule firings) notify the operator instead.
    pub initiated_by: Option<UserId>,
}

/// Orchestrator for device transitions.
///
/// Holds one async lock per device so concurrent transitions for the same
/// `device_id` never interleave, while different devices proceed in parallel.
pub struct TransitionEngine<DR, AL, NR, P> {
    device_repo: DR,
    audit_repo: AL,
    notification_repo: NR,
    publisher: P,
    /// Recipient of system-generated notifications (inconsistency alerts,
    /// schedule-driven transition outcomes).
    operator: UserId,
    storage_timeout: Duration,
    locks: Mutex<HashMap<DeviceId, Arc<tokio::sync::Mutex<()>>>>,
}

impl<DR, AL, NR, P> TransitionEngine<DR, AL, NR, P>
where
    DR: DeviceRepository,
    AL: AuditLogRepository,
    NR: NotificationRepository,
    P: EventPublisher,
{
    /// Create a new engine.
    pub fn new(
        device_repo: DR,
        audit_repo: AL,
        notification_repo: NR,
        publisher: P,
        operator: UserId,
        storage_timeout: Duration,
    ) -> Self {
        Self {
            device_repo,
            audit_repo,
            notification_repo,
            publisher,
            operator,
            storage_timeout,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Apply one transition: resolve the device, compute effective values,
    /// append the audit record, then update the registry.
    ///
    /// The audit record carries the *post-transition* brightness and color:
    /// the supplied values when present, the device's current values
    /// otherwise.
    ///
    /// # Errors
    ///
    /// - [`LumenError::Validation`] before any write when the change is
    ///   malformed.
    /// - [`LumenError::NotFound`] when the device does not exist.
    /// - [`LumenError::Timeout`] when a storage call misses its deadline
    ///   twice (each call is retried once).
    /// - [`LumenError::Inconsistency`] when the registry update fails after
    ///   the audit record was appended; an operator alert is dispatched.
    #[tracing::instrument(skip_all, fields(device_id = %request.device_id, status = %request.change.status))]
    pub async fn request_transition(
        &self,
        request: TransitionRequest,
    ) -> Result<Device, LumenError> {
        request.change.validate()?;

        let lock = self.device_lock(&request.device_id);
        let _guard = lock.lock().await;

        let device = self
            .bounded("device lookup", || self.device_repo.get(&request.device_id))
            .await?
            .ok_or_else(|| NotFoundError {
                entity: "Device",
                id: request.device_id.to_string(),
            })?;

        let brightness = request.change.brightness.unwrap_or(device.brightness);
        let color = request
            .change
            .color
            .clone()
            .unwrap_or_else(|| device.color.clone());
        let record = AuditRecord::for_transition(
            request.device_id.clone(),
            request.change.status,
            brightness,
            color,
        );
        self.bounded("audit append", || self.audit_repo.append(record.clone()))
            .await?;

        let mut updated = device;
        updated.apply(&request.change, now());
        let updated = match self
            .bounded("registry update", || self.device_repo.update(updated.clone()))
            .await
        {
            Ok(device) => device,
            Err(cause) => {
                return Err(self
                    .report_inconsistency(request.device_id.clone(), &cause)
                    .await);
            }
        };

        self.notify_outcome(&request, &updated).await;
        let _ = self
            .publisher
            .publish(Event::new(
                EventType::TransitionApplied,
                Some(updated.device_id.clone()),
                serde_json::json!({
                    "status": updated.status,
                    "brightness": updated.brightness,
                    "color": updated.color,
                    "power": updated.reported_power(),
                }),
            ))
            .await;

        Ok(updated)
    }

    /// The lock serializing transitions for one device.
    fn device_lock(&self, device_id: &DeviceId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(device_id.clone()).or_default().clone()
    }

    /// Run a storage call with a deadline, retrying once on timeout.
    /// Non-timeout failures propagate immediately.
    async fn bounded<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T, LumenError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LumenError>>,
    {
        match tokio::time::timeout(self.storage_timeout, call()).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, "storage call missed its deadline, retrying once");
                match tokio::time::timeout(self.storage_timeout, call()).await {
                    Ok(result) => result,
                    Err(_) => Err(TimeoutError { operation }.into()),
                }
            }
        }
    }

    /// A registry update failed after the audit record was appended. Alert
    /// the operator and surface the inconsistency; never retried.
    async fn report_inconsistency(&self, device_id: DeviceId, cause: &LumenError) -> LumenError {
        tracing::error!(
            device_id = %device_id,
            %cause,
            "registry update failed after audit append"
        );
        let alert = Notification::new(
            self.operator,
            NotificationKind::Error,
            "Inconsistency Detected",
            format!("Device '{device_id}' has an audit record with no matching state update"),
        );
        if let Err(err) = self.notification_repo.create(alert).await {
            tracing::warn!(%err, "failed to store operator alert");
        }
        InconsistencyError {
            device_id,
            detail: format!("registry update failed after audit append: {cause}"),
        }
        .into()
    }

    /// Dispatch the outcome notification. Best effort: a dispatcher failure
    /// is logged and never fails the transition.
    async fn notify_outcome(&self, request: &TransitionRequest, device: &Device) {
        let (recipient, kind) = match request.initiated_by {
            Some(user) => (user, NotificationKind::Success),
            None => (self.operator, NotificationKind::Info),
        };
        let notification = Notification::new(
            recipient,
            kind,
            "Device Update",
            format!("{} turned {}", device.name, device.status),
        );
        if let Err(err) = self.notification_repo.create(notification).await {
            tracing::warn!(%err, "failed to store transition notification");
        }
    }
}
