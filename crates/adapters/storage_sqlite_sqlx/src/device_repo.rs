//! `SQLite` implementation of [`DeviceRepository`].

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use lumen_app::ports::DeviceRepository;
use lumen_domain::device::{Device, DeviceStatus};
use lumen_domain::error::LumenError;
use lumen_domain::id::DeviceId;

use crate::error::StorageError;

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(Device);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Device> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let device_id: String = row.try_get("device_id")?;
        let name: String = row.try_get("name")?;
        let status_str: String = row.try_get("status")?;
        let brightness: u8 = row.try_get("brightness")?;
        let color: String = row.try_get("color")?;
        let power_consumption: f64 = row.try_get("power_consumption")?;
        let location: Option<String> = row.try_get("location")?;
        let last_seen_str: Option<String> = row.try_get("last_seen")?;

        let device_id =
            DeviceId::from_str(&device_id).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let status: DeviceStatus = serde_json::from_str(&format!("\"{status_str}\""))
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let last_seen = last_seen_str
            .map(|raw| {
                chrono::DateTime::parse_from_rfc3339(&raw)
                    .map(|ts| ts.to_utc())
                    .map_err(|err| sqlx::Error::Decode(Box::new(err)))
            })
            .transpose()?;

        Ok(Self(Device {
            device_id,
            name,
            status,
            brightness,
            color,
            power_consumption,
            location,
            last_seen,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO devices (device_id, name, status, brightness, color, power_consumption, location, last_seen)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM devices WHERE device_id = ?";
const SELECT_ALL: &str = "SELECT * FROM devices ORDER BY device_id";

const UPDATE: &str = r"
    UPDATE devices
    SET name = ?, status = ?, brightness = ?, color = ?, power_consumption = ?,
        location = ?, last_seen = ?
    WHERE device_id = ?
";

/// `SQLite`-backed device repository.
pub struct SqliteDeviceRepository {
    pool: SqlitePool,
}

impl SqliteDeviceRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl DeviceRepository for SqliteDeviceRepository {
    async fn create(&self, device: Device) -> Result<Device, LumenError> {
        sqlx::query(INSERT)
            .bind(device.device_id.as_str())
            .bind(&device.name)
            .bind(device.status.to_string())
            .bind(device.brightness)
            .bind(&device.color)
            .bind(device.power_consumption)
            .bind(&device.location)
            .bind(device.last_seen.map(|ts| ts.to_rfc3339()))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(device)
    }

    async fn get(&self, device_id: &DeviceId) -> Result<Option<Device>, LumenError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(device_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<Device>, LumenError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update(&self, device: Device) -> Result<Device, LumenError> {
        sqlx::query(UPDATE)
            .bind(&device.name)
            .bind(device.status.to_string())
            .bind(device.brightness)
            .bind(&device.color)
            .bind(device.power_consumption)
            .bind(&device.location)
            .bind(device.last_seen.map(|ts| ts.to_rfc3339()))
            .bind(device.device_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(device)
    }
}
