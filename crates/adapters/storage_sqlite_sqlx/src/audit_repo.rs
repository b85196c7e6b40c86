//! `SQLite` implementation of [`AuditLogRepository`].
//!
//! Append-only: no update or delete statement exists in this module.

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use lumen_app::ports::AuditLogRepository;
use lumen_domain::audit::AuditRecord;
use lumen_domain::error::LumenError;
use lumen_domain::id::{AuditRecordId, DeviceId};

use crate::error::StorageError;

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(AuditRecord);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let device_id: String = row.try_get("device_id")?;
        let action: String = row.try_get("action")?;
        let brightness: u8 = row.try_get("brightness")?;
        let color: String = row.try_get("color")?;
        let power_consumed: Option<f64> = row.try_get("power_consumed")?;
        let duration_minutes: Option<i64> = row.try_get("duration_minutes")?;
        let created_at_str: String = row.try_get("created_at")?;

        let id =
            AuditRecordId::from_str(&id).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let device_id =
            DeviceId::from_str(&device_id).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?
            .to_utc();

        Ok(Self(AuditRecord {
            id,
            device_id,
            action,
            brightness,
            color,
            power_consumed,
            duration_minutes,
            created_at,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO audit_log (id, device_id, action, brightness, color, power_consumed, duration_minutes, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_DEVICE: &str = r"
    SELECT * FROM audit_log
    WHERE device_id = ?
    ORDER BY created_at DESC, id
    LIMIT ?
";

/// `SQLite`-backed audit log repository.
pub struct SqliteAuditLogRepository {
    pool: SqlitePool,
}

impl SqliteAuditLogRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AuditLogRepository for SqliteAuditLogRepository {
    async fn append(&self, record: AuditRecord) -> Result<AuditRecord, LumenError> {
        sqlx::query(INSERT)
            .bind(record.id.to_string())
            .bind(record.device_id.as_str())
            .bind(&record.action)
            .bind(record.brightness)
            .bind(&record.color)
            .bind(record.power_consumed)
            .bind(record.duration_minutes)
            .bind(record.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(record)
    }

    async fn find_by_device(
        &self,
        device_id: &DeviceId,
        limit: u32,
    ) -> Result<Vec<AuditRecord>, LumenError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_DEVICE)
            .bind(device_id.as_str())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}
