//! Device registry — use-cases for registering and reading devices.
//!
//! The registry never mutates device state itself; all state changes flow
//! through the transition engine.

use lumen_domain::device::Device;
use lumen_domain::error::{LumenError, NotFoundError, ValidationError};
use lumen_domain::event::{Event, EventType};
use lumen_domain::id::DeviceId;

use crate::ports::{DeviceRepository, EventPublisher};

/// Application service holding the canonical state of every device.
pub struct DeviceRegistry<R, P> {
    repo: R,
    publisher: P,
}

impl<R: DeviceRepository, P: EventPublisher> DeviceRegistry<R, P> {
    /// Create a new registry backed by the given repository.
    pub fn new(repo: R, publisher: P) -> Self {
        Self { repo, publisher }
    }

    /// Register a new device after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::Validation`] if invariants fail or a device
    /// with the same id already exists, or a storage error from the
    /// repository.
    #[tracing::instrument(skip_all, fields(device_id = %device.device_id))]
    pub async fn register(&self, device: Device) -> Result<Device, LumenError> {
        device.validate()?;
        if self.repo.get(&device.device_id).await?.is_some() {
            return Err(
                ValidationError::DuplicateDeviceId(device.device_id.to_string()).into(),
            );
        }
        let created = self.repo.create(device).await?;
        let _ = self
            .publisher
            .publish(Event::new(
                EventType::DeviceRegistered,
                Some(created.device_id.clone()),
                serde_json::json!({"name": created.name}),
            ))
            .await;
        Ok(created)
    }

    /// Look up a device by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::NotFound`] when no device with `device_id`
    /// exists, or a storage error from the repository.
    pub async fn get(&self, device_id: &DeviceId) -> Result<Device, LumenError> {
        self.repo.get(device_id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Device",
                id: device_id.to_string(),
            }
            .into()
        })
    }

    /// List all devices.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list(&self) -> Result<Vec<Device>, LumenError> {
        self.repo.get_all().await
    }
}
