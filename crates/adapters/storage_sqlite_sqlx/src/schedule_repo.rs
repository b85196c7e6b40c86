//! `SQLite` implementation of [`ScheduleRepository`].

use std::str::FromStr;

use chrono::NaiveTime;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use lumen_app::ports::ScheduleRepository;
use lumen_domain::error::LumenError;
use lumen_domain::id::{DeviceId, ScheduleId};
use lumen_domain::schedule::{DaySet, Schedule, ScheduleAction};

use crate::error::StorageError;

const TIME_FORMAT: &str = "%H:%M:%S";

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(Schedule);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Schedule> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let device_id: String = row.try_get("device_id")?;
        let action_str: String = row.try_get("action")?;
        let brightness: u8 = row.try_get("brightness")?;
        let scheduled_time_str: String = row.try_get("scheduled_time")?;
        let days_str: String = row.try_get("days")?;
        let enabled: bool = row.try_get("enabled")?;

        let id = ScheduleId::from_str(&id).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let device_id =
            DeviceId::from_str(&device_id).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let action: ScheduleAction = serde_json::from_str(&format!("\"{action_str}\""))
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let scheduled_time = NaiveTime::parse_from_str(&scheduled_time_str, TIME_FORMAT)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let days =
            DaySet::from_str(&days_str).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(Schedule {
            id,
            name,
            device_id,
            action,
            brightness,
            scheduled_time,
            days,
            enabled,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO schedules (id, name, device_id, action, brightness, scheduled_time, days, enabled)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM schedules WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM schedules";
const SELECT_ENABLED: &str = "SELECT * FROM schedules WHERE enabled = 1";

const UPDATE: &str = r"
    UPDATE schedules
    SET name = ?, device_id = ?, action = ?, brightness = ?, scheduled_time = ?,
        days = ?, enabled = ?
    WHERE id = ?
";

const DELETE_BY_ID: &str = "DELETE FROM schedules WHERE id = ?";

/// `SQLite`-backed schedule repository.
pub struct SqliteScheduleRepository {
    pool: SqlitePool,
}

impl SqliteScheduleRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ScheduleRepository for SqliteScheduleRepository {
    async fn create(&self, schedule: Schedule) -> Result<Schedule, LumenError> {
        sqlx::query(INSERT)
            .bind(schedule.id.to_string())
            .bind(&schedule.name)
            .bind(schedule.device_id.as_str())
            .bind(schedule.action.to_string())
            .bind(schedule.brightness)
            .bind(schedule.scheduled_time.format(TIME_FORMAT).to_string())
            .bind(schedule.days.to_string())
            .bind(schedule.enabled)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(schedule)
    }

    async fn get_by_id(&self, id: ScheduleId) -> Result<Option<Schedule>, LumenError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<Schedule>, LumenError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn get_enabled(&self) -> Result<Vec<Schedule>, LumenError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ENABLED)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update(&self, schedule: Schedule) -> Result<Schedule, LumenError> {
        sqlx::query(UPDATE)
            .bind(&schedule.name)
            .bind(schedule.device_id.as_str())
            .bind(schedule.action.to_string())
            .bind(schedule.brightness)
            .bind(schedule.scheduled_time.format(TIME_FORMAT).to_string())
            .bind(schedule.days.to_string())
            .bind(schedule.enabled)
            .bind(schedule.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(schedule)
    }

    async fn delete(&self, id: ScheduleId) -> Result<(), LumenError> {
        sqlx::query(DELETE_BY_ID)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}
