//! Device — an addressable lighting fixture with mutable on/off/dim/color state.
//!
//! Devices are created at registration and mutated only through the
//! transition engine; they hold no back-references to their audit history.

use serde::{Deserialize, Serialize};

use crate::error::{LumenError, ValidationError};
use crate::id::DeviceId;
use crate::time::Timestamp;

/// Discrete operational status of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    On,
    #[default]
    Off,
    Dimmed,
    Error,
}

impl DeviceStatus {
    /// The audit-log action label recorded when a device transitions to
    /// this status (e.g. `status_changed_to_on`).
    #[must_use]
    pub fn audit_action(self) -> String {
        format!("status_changed_to_{self}")
    }

    /// Whether the device draws power in this status.
    #[must_use]
    pub fn draws_power(self) -> bool {
        !matches!(self, Self::Off)
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
            Self::Dimmed => f.write_str("dimmed"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// A requested partial update to a device's mutable state.
///
/// `status` is always present; `brightness` and `color` fall back to the
/// device's current values when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub status: DeviceStatus,
    pub brightness: Option<u8>,
    pub color: Option<String>,
}

impl StateChange {
    /// A status-only change, leaving brightness and color untouched.
    #[must_use]
    pub fn status(status: DeviceStatus) -> Self {
        Self {
            status,
            brightness: None,
            color: None,
        }
    }

    /// Check domain invariants. Out-of-range values are rejected, never
    /// silently clamped.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::BrightnessOutOfRange`] or
    /// [`ValidationError::InvalidColor`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(brightness) = self.brightness {
            validate_brightness(brightness)?;
        }
        if let Some(color) = &self.color {
            validate_color(color)?;
        }
        Ok(())
    }
}

/// An addressable lighting fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub device_id: DeviceId,
    pub name: String,
    pub status: DeviceStatus,
    /// Percentage in `0..=100`.
    pub brightness: u8,
    /// Hex color string, e.g. `#ffd700`.
    pub color: String,
    /// Rated draw in watts; reported as 0 while the device is off.
    pub power_consumption: f64,
    pub location: Option<String>,
    /// Refreshed on every successful transition.
    pub last_seen: Option<Timestamp>,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::Validation`] when the name is empty, brightness
    /// is out of range, or the color is not a hex string.
    pub fn validate(&self) -> Result<(), LumenError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        validate_brightness(self.brightness)?;
        validate_color(&self.color)?;
        Ok(())
    }

    /// Apply a validated [`StateChange`], refreshing `last_seen`.
    pub fn apply(&mut self, change: &StateChange, at: Timestamp) {
        self.status = change.status;
        if let Some(brightness) = change.brightness {
            self.brightness = brightness;
        }
        if let Some(color) = &change.color {
            self.color.clone_from(color);
        }
        self.last_seen = Some(at);
    }

    /// Power draw as reported to callers: 0 while off, the rated
    /// consumption otherwise. Policy lives here, not in storage.
    #[must_use]
    pub fn reported_power(&self) -> f64 {
        if self.status.draws_power() {
            self.power_consumption
        } else {
            0.0
        }
    }
}

fn validate_brightness(brightness: u8) -> Result<(), ValidationError> {
    if brightness > 100 {
        return Err(ValidationError::BrightnessOutOfRange(brightness));
    }
    Ok(())
}

fn validate_color(color: &str) -> Result<(), ValidationError> {
    let digits = color.strip_prefix('#');
    let valid = matches!(digits, Some(d) if (d.len() == 3 || d.len() == 6)
        && d.chars().all(|c| c.is_ascii_hexdigit()));
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidColor(color.to_string()))
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    device_id: Option<DeviceId>,
    name: Option<String>,
    status: Option<DeviceStatus>,
    brightness: Option<u8>,
    color: Option<String>,
    power_consumption: Option<f64>,
    location: Option<String>,
    last_seen: Option<Timestamp>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn device_id(mut self, device_id: DeviceId) -> Self {
        self.device_id = Some(device_id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: DeviceStatus) -> Self {
        self.status = Some(status);
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
    pub fn power_consumption(mut self, watts: f64) -> Self {
        self.power_consumption = Some(watts);
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn last_seen(mut self, ts: Timestamp) -> Self {
        self.last_seen = Some(ts);
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// Defaults match a freshly-registered fixture: off, full brightness,
    /// warm white.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::Validation`] if required fields are missing
    /// or invariants fail.
    pub fn build(self) -> Result<Device, LumenError> {
        let device = Device {
            device_id: self
                .device_id
                .ok_or(ValidationError::EmptyDeviceId)?,
            name: self.name.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            brightness: self.brightness.unwrap_or(100),
            color: self.color.unwrap_or_else(|| "#ffffff".to_string()),
            power_consumption: self.power_consumption.unwrap_or(0.0),
            location: self.location,
            last_seen: self.last_seen,
        };
        device.validate()?;
        Ok(device)
    }
}
