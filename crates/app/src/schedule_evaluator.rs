//! Schedule evaluator — the periodic tick that turns schedules into
//! transition requests.
//!
//! Each enabled schedule fires at most once per matching minute: the
//! evaluator keys every firing by schedule id + calendar minute and skips a
//! schedule whose key was already recorded, even when the firing itself
//! failed. One schedule's failure never aborts the rest of the tick.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::NaiveDateTime;

use lumen_domain::error::LumenError;
use lumen_domain::event::{Event, EventType};
use lumen_domain::id::{ScheduleId, UserId};
use lumen_domain::notification::{Notification, NotificationKind};
use lumen_domain::schedule::Schedule;
use lumen_domain::time::{local_now, minute_key};

use crate::ports::{
    AuditLogRepository, DeviceRepository, EventPublisher, NotificationRepository,
    ScheduleRepository,
};
use crate::transition_engine::{TransitionEngine, TransitionRequest};

/// Periodic evaluator issuing transition requests for due schedules.
pub struct ScheduleEvaluator<SR, DR, AL, NR, P> {
    schedule_repo: SR,
    engine: Arc<TransitionEngine<DR, AL, NR, P>>,
    notification_repo: NR,
    publisher: P,
    /// Recipient of misfire warnings.
    operator: UserId,
    /// Last minute key each schedule fired in.
    fired: Mutex<HashMap<ScheduleId, String>>,
}

impl<SR, DR, AL, NR, P> ScheduleEvaluator<SR, DR, AL, NR, P>
where
    SR: ScheduleRepository,
    DR: DeviceRepository,
    AL: AuditLogRepository,
    NR: NotificationRepository,
    P: EventPublisher,
{
    /// Create a new evaluator issuing its requests through `engine`.
    pub fn new(
        schedule_repo: SR,
        engine: Arc<TransitionEngine<DR, AL, NR, P>>,
        notification_repo: NR,
        publisher: P,
        operator: UserId,
    ) -> Self {
        Self {
            schedule_repo,
            engine,
            notification_repo,
            publisher,
            operator,
            fired: Mutex::new(HashMap::new()),
        }
    }

    /// Run the evaluator forever on a fixed tick. Tick failures are logged
    /// and the loop continues.
    pub async fn run(&self, tick: Duration) {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            match self.evaluate_tick(local_now()).await {
                Ok(fired) if !fired.is_empty() => {
                    tracing::info!(count = fired.len(), "schedules fired");
                }
                Ok(_) => {}
                Err(err) => tracing::error!(%err, "schedule evaluation tick failed"),
            }
        }
    }

    /// Evaluate all enabled schedules against the wall-clock `now`, firing
    /// each due schedule at most once for its matching minute.
    ///
    /// Returns the schedules that fired successfully.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the schedules themselves cannot be
    /// loaded. Failures of individual firings are reported, not returned.
    #[tracing::instrument(skip(self), fields(at = %now))]
    pub async fn evaluate_tick(
        &self,
        now: NaiveDateTime,
    ) -> Result<Vec<ScheduleId>, LumenError> {
        let schedules = self.schedule_repo.get_enabled().await?;
        let key = minute_key(now);
        let mut fired_now = Vec::new();

        for schedule in &schedules {
            if !schedule.is_due(now) {
                continue;
            }
            if !self.claim(schedule.id, &key) {
                continue;
            }
            if self.fire(schedule).await {
                fired_now.push(schedule.id);
            }
        }

        // Keys from earlier minutes can never suppress anything again.
        self.fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, fired_key| fired_key == &key);

        Ok(fired_now)
    }

    /// Record the minute key for `id`, returning false when it was already
    /// recorded. Claimed before firing so a failed firing is not retried
    /// within the same minute.
    fn claim(&self, id: ScheduleId, key: &str) -> bool {
        let mut fired = self.fired.lock().unwrap_or_else(PoisonError::into_inner);
        if fired.get(&id).is_some_and(|prev| prev == key) {
            return false;
        }
        fired.insert(id, key.to_string());
        true
    }

    /// Issue the schedule's transition request. Returns whether it applied.
    async fn fire(&self, schedule: &Schedule) -> bool {
        let request = TransitionRequest {
            device_id: schedule.device_id.clone(),
            change: schedule.state_change(),
            initiated_by: None,
        };
        match self.engine.request_transition(request).await {
            Ok(_) => {
                let _ = self
                    .publisher
                    .publish(Event::new(
                        EventType::ScheduleFired,
                        Some(schedule.device_id.clone()),
                        serde_json::json!({
                            "schedule_id": schedule.id,
                            "name": schedule.name,
                            "action": schedule.action,
                        }),
                    ))
                    .await;
                true
            }
            Err(LumenError::NotFound(err)) => {
                tracing::warn!(
                    schedule_id = %schedule.id,
                    device_id = %schedule.device_id,
                    "schedule skipped, device not found"
                );
                let warning = Notification::new(
                    self.operator,
                    NotificationKind::Warning,
                    "Schedule Skipped",
                    format!(
                        "Schedule '{}' was skipped: {err}",
                        schedule.name
                    ),
                );
                if let Err(err) = self.notification_repo.create(warning).await {
                    tracing::warn!(%err, "failed to store misfire warning");
                }
                let _ = self
                    .publisher
                    .publish(Event::new(
                        EventType::ScheduleMisfired,
                        Some(schedule.device_id.clone()),
                        serde_json::json!({
                            "schedule_id": schedule.id,
                            "name": schedule.name,
                        }),
                    ))
                    .await;
                false
            }
            Err(err) => {
                tracing::error!(
                    schedule_id = %schedule.id,
                    device_id = %schedule.device_id,
                    %err,
                    "schedule firing failed"
                );
                false
            }
        }
    }
}
