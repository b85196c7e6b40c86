//! Notification service — per-user notification dispatch and read tracking.

use lumen_domain::error::{LumenError, NotFoundError};
use lumen_domain::id::{NotificationId, UserId};
use lumen_domain::notification::{Notification, NotificationKind};

use crate::ports::NotificationRepository;

/// Application service for creating and reading notifications.
pub struct NotificationService<R> {
    repo: R,
}

impl<R: NotificationRepository> NotificationService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Create an unread notification for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn notify(
        &self,
        user_id: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<Notification, LumenError> {
        self.repo
            .create(Notification::new(user_id, kind, title, message))
            .await
    }

    /// List one user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Notification>, LumenError> {
        self.repo.find_by_user(user_id).await
    }

    /// Flip a notification's `read` flag. Idempotent: marking an
    /// already-read notification returns it unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::NotFound`] when no notification with `id`
    /// exists or it belongs to another user.
    pub async fn mark_read(
        &self,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<Notification, LumenError> {
        let mut notification = self
            .repo
            .get_by_id(id)
            .await?
            .filter(|n| n.user_id == user_id)
            .ok_or_else(|| NotFoundError {
                entity: "Notification",
                id: id.to_string(),
            })?;
        if notification.read {
            return Ok(notification);
        }
        notification.mark_read();
        self.repo.update(notification).await
    }
}
