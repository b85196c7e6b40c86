//! Schedule service — configuration CRUD for schedules.

use lumen_domain::error::{LumenError, NotFoundError};
use lumen_domain::id::ScheduleId;
use lumen_domain::schedule::Schedule;

use crate::ports::ScheduleRepository;

/// Application service for managing schedules.
pub struct ScheduleService<R> {
    repo: R,
}

impl<R: ScheduleRepository> ScheduleService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Create a new schedule after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::Validation`] if invariants fail, or a storage
    /// error propagated from the repository.
    pub async fn create(&self, schedule: Schedule) -> Result<Schedule, LumenError> {
        schedule.validate()?;
        self.repo.create(schedule).await
    }

    /// Look up a schedule by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::NotFound`] when no schedule with `id` exists.
    pub async fn get(&self, id: ScheduleId) -> Result<Schedule, LumenError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Schedule",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all schedules.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list(&self) -> Result<Vec<Schedule>, LumenError> {
        self.repo.get_all().await
    }

    /// Replace an existing schedule.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::NotFound`] if the schedule does not exist and
    /// [`LumenError::Validation`] if invariants fail.
    pub async fn update(&self, schedule: Schedule) -> Result<Schedule, LumenError> {
        schedule.validate()?;
        self.get(schedule.id).await?;
        self.repo.update(schedule).await
    }

    /// Delete a schedule by id.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::NotFound`] if the schedule does not exist.
    pub async fn delete(&self, id: ScheduleId) -> Result<(), LumenError> {
        self.get(id).await?;
        self.repo.delete(id).await
    }
}
