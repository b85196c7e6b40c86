//! Schedule — a recurring time-of-day rule that triggers a transition.
//!
//! A schedule stores a wall-clock time and a set of weekdays; it never
//! encodes a calendar date and is re-evaluated daily. Matching is pure —
//! the once-per-minute re-fire guard is evaluator state, not schedule state.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::device::{DeviceStatus, StateChange};
use crate::error::{LumenError, ValidationError};
use crate::id::{DeviceId, ScheduleId};

/// What the schedule does to its device when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleAction {
    On,
    Off,
    Dim,
}

impl ScheduleAction {
    /// Map this action to the transition input, using the schedule's
    /// brightness only for `Dim`.
    #[must_use]
    pub fn to_state_change(self, brightness: u8) -> StateChange {
        match self {
            Self::On => StateChange::status(DeviceStatus::On),
            Self::Off => StateChange::status(DeviceStatus::Off),
            Self::Dim => StateChange {
                status: DeviceStatus::Dimmed,
                brightness: Some(brightness),
                color: None,
            },
        }
    }
}

impl fmt::Display for ScheduleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
            Self::Dim => f.write_str("dim"),
        }
    }
}

/// Set of weekdays a schedule runs on, stored as a bitmask and written in
/// the `mon,wed,fri` form used by configuration and storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySet(u8);

const ALL_DAYS: u8 = 0b0111_1111;

impl DaySet {
    /// Every day of the week — the default for new schedules.
    #[must_use]
    pub fn every_day() -> Self {
        Self(ALL_DAYS)
    }

    /// An empty set; invalid on a schedule, useful as a fold seed.
    #[must_use]
    pub fn empty() -> Self {
        Self(0)
    }

    /// Add a weekday to the set.
    #[must_use]
    pub fn with(mut self, day: Weekday) -> Self {
        self.0 |= 1 << day.num_days_from_monday();
        self
    }

    /// Whether `day` is in the set.
    #[must_use]
    pub fn contains(self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn days(self) -> impl Iterator<Item = Weekday> {
        [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .into_iter()
        .filter(move |day| self.contains(*day))
    }
}

impl Default for DaySet {
    fn default() -> Self {
        Self::every_day()
    }
}

impl fmt::Display for DaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for day in self.days() {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            let tag = match day {
                Weekday::Mon => "mon",
                Weekday::Tue => "tue",
                Weekday::Wed => "wed",
                Weekday::Thu => "thu",
                Weekday::Fri => "fri",
                Weekday::Sat => "sat",
                Weekday::Sun => "sun",
            };
            f.write_str(tag)?;
        }
        Ok(())
    }
}

impl FromStr for DaySet {
    type Err = ValidationError;

    /// Parse a comma-separated day list such as `mon,wed,fri`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoDays`] for an empty or unrecognized list.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = Self::empty();
        for tag in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let day = match tag.to_ascii_lowercase().as_str() {
                "mon" => Weekday::Mon,
                "tue" => Weekday::Tue,
                "wed" => Weekday::Wed,
                "thu" => Weekday::Thu,
                "fri" => Weekday::Fri,
                "sat" => Weekday::Sat,
                "sun" => Weekday::Sun,
                _ => return Err(ValidationError::NoDays),
            };
            set = set.with(day);
        }
        if set.is_empty() {
            return Err(ValidationError::NoDays);
        }
        Ok(set)
    }
}

impl Serialize for DaySet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DaySet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A recurring time-of-day transition rule for one device.
///
/// `device_id` is a weak reference — it must resolve to a live device at
/// evaluation time, otherwise the schedule is skipped and flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub name: String,
    pub device_id: DeviceId,
    pub action: ScheduleAction,
    /// Used when `action` is `dim`.
    pub brightness: u8,
    /// Wall-clock time of day; no date component.
    pub scheduled_time: NaiveTime,
    pub days: DaySet,
    pub enabled: bool,
}

impl Schedule {
    /// Create a builder for constructing a [`Schedule`].
    #[must_use]
    pub fn builder() -> ScheduleBuilder {
        ScheduleBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::Validation`] when the name is empty, brightness
    /// is out of range, or the day set is empty.
    pub fn validate(&self) -> Result<(), LumenError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.brightness > 100 {
            return Err(ValidationError::BrightnessOutOfRange(self.brightness).into());
        }
        if self.days.is_empty() {
            return Err(ValidationError::NoDays.into());
        }
        Ok(())
    }

    /// Whether this schedule matches the wall-clock minute of `now`:
    /// today's weekday is in `days` and `now` falls inside the scheduled
    /// minute. Ignores `enabled` — callers filter disabled schedules first.
    #[must_use]
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.days.contains(now.weekday())
            && now.time().hour() == self.scheduled_time.hour()
            && now.time().minute() == self.scheduled_time.minute()
    }

    /// The transition this schedule requests when it fires.
    #[must_use]
    pub fn state_change(&self) -> StateChange {
        self.action.to_state_change(self.brightness)
    }
}

/// Step-by-step builder for [`Schedule`].
#[derive(Debug, Default)]
pub struct ScheduleBuilder {
    id: Option<ScheduleId>,
    name: Option<String>,
    device_id: Option<DeviceId>,
    action: Option<ScheduleAction>,
    brightness: Option<u8>,
    scheduled_time: Option<NaiveTime>,
    days: Option<DaySet>,
    enabled: Option<bool>,
}

impl ScheduleBuilder {
    #[must_use]
    pub fn id(mut self, id: ScheduleId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn device_id(mut self, device_id: DeviceId) -> Self {
        self.device_id = Some(device_id);
        self
    }

    #[must_use]
    pub fn action(mut self, action: ScheduleAction) -> Self {
        self.action = Some(action);
        self
    }

    #[must_use]
    pub fn brightness(mut self, brightness: u8) -> Self {
        self.brightness = Some(brightness);
        self
    }

    #[must_use]
    pub fn scheduled_time(mut self, time: NaiveTime) -> Self {
        self.scheduled_time = Some(time);
        self
    }

    #[must_use]
    pub fn days(mut self, days: DaySet) -> Self {
        self.days = Some(days);
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Consume the builder, validate, and return a [`Schedule`].
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::Validation`] if required fields are missing or
    /// invariants fail.
    pub fn build(self) -> Result<Schedule, LumenError> {
        let schedule = Schedule {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            device_id: self.device_id.ok_or(ValidationError::EmptyDeviceId)?,
            action: self.action.unwrap_or(ScheduleAction::On),
            brightness: self.brightness.unwrap_or(100),
            scheduled_time: self.scheduled_time.unwrap_or_default(),
            days: self.days.unwrap_or_default(),
            enabled: self.enabled.unwrap_or(true),
        };
        schedule.validate()?;
        Ok(schedule)
    }
}
