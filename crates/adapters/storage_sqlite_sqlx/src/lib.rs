//! # lumen-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `lumen-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `lumen-app` (for port traits) and `lumen-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod audit_repo;
pub mod device_repo;
pub mod error;
pub mod notification_repo;
pub mod pool;
pub mod schedule_repo;

pub use audit_repo::SqliteAuditLogRepository;
pub use device_repo::SqliteDeviceRepository;
pub use notification_repo::SqliteNotificationRepository;
pub use pool::{Config, Database};
pub use schedule_repo::SqliteScheduleRepository;
