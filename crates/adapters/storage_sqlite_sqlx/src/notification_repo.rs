//! `SQLite` implementation of [`NotificationRepository`].

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use lumen_app::ports::NotificationRepository;
use lumen_domain::error::LumenError;
use lumen_domain::id::{NotificationId, UserId};
use lumen_domain::notification::{Notification, NotificationKind};

use crate::error::StorageError;

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(Notification);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Notification> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let title: String = row.try_get("title")?;
        let message: String = row.try_get("message")?;
        let kind_str: String = row.try_get("kind")?;
        let read: bool = row.try_get("is_read")?;
        let created_at_str: String = row.try_get("created_at")?;

        let id =
            NotificationId::from_str(&id).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let user_id =
            UserId::from_str(&user_id).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let kind: NotificationKind = serde_json::from_str(&format!("\"{kind_str}\""))
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?
            .to_utc();

        Ok(Self(Notification {
            id,
            user_id,
            title,
            message,
            kind,
            read,
            created_at,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO notifications (id, user_id, title, message, kind, is_read, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM notifications WHERE id = ?";

const SELECT_BY_USER: &str = r"
    SELECT * FROM notifications
    WHERE user_id = ?
    ORDER BY created_at DESC, id
";

const UPDATE: &str = "UPDATE notifications SET is_read = ? WHERE id = ?";

/// `SQLite`-backed notification repository.
pub struct SqliteNotificationRepository {
    pool: SqlitePool,
}

impl SqliteNotificationRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl NotificationRepository for SqliteNotificationRepository {
    async fn create(&self, notification: Notification) -> Result<Notification, LumenError> {
        sqlx::query(INSERT)
            .bind(notification.id.to_string())
            .bind(notification.user_id.to_string())
            .bind(&notification.title)
            .bind(&notification.message)
            .bind(notification.kind.to_string())
            .bind(notification.read)
            .bind(notification.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(notification)
    }

    async fn get_by_id(&self, id: NotificationId) -> Result<Option<Notification>, LumenError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Notification>, LumenError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_USER)
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update(&self, notification: Notification) -> Result<Notification, LumenError> {
        sqlx::query(UPDATE)
            .bind(notification.read)
            .bind(notification.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;

    async fn setup() -> SqliteNotificationRepository {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteNotificationRepository::new(db.pool().clone())
    }

    #[tokio::test]
    async fn should_create_and_retrieve_notification() {
        let repo = setup().await;
        let notification = Notification::new(
            UserId::new(),
            NotificationKind::Success,
            "Device Update",
            "Living Room Light turned on",
        );
        let id = notification.id;

        repo.create(notification).await.unwrap();

        let fetched = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Device Update");
        assert_eq!(fetched.kind, NotificationKind::Success);
        assert!(!fetched.read);
    }

    #[tokio::test]
    async fn should_return_none_when_notification_not_found() {
        let repo = setup().await;
        let result = repo.get_by_id(NotificationId::new()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn should_list_user_notifications_newest_first() {
        let repo = setup().await;
        let user = UserId::new();

        let mut older = Notification::new(user, NotificationKind::Info, "First", "first");
        older.created_at -= chrono::Duration::seconds(60);
        repo.create(older).await.unwrap();
        repo.create(Notification::new(
            user,
            NotificationKind::Info,
            "Second",
            "second",
        ))
        .await
        .unwrap();
        repo.create(Notification::new(
            UserId::new(),
            NotificationKind::Info,
            "Other",
            "someone else's",
        ))
        .await
        .unwrap();

        let listed = repo.find_by_user(user).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "Second");
        assert_eq!(listed[1].title, "First");
    }

    #[tokio::test]
    async fn should_persist_read_flag_on_update() {
        let repo = setup().await;
        let mut notification =
            Notification::new(UserId::new(), NotificationKind::Warning, "W", "warned");
        let id = notification.id;
        repo.create(notification.clone()).await.unwrap();

        notification.mark_read();
        repo.update(notification).await.unwrap();

        let fetched = repo.get_by_id(id).await.unwrap().unwrap();
        assert!(fetched.read);
    }
}
