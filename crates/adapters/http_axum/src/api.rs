//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod devices;
#[allow(clippy::missing_errors_doc)]
pub mod notifications;
#[allow(clippy::missing_errors_doc)]
pub mod schedules;
pub mod sse;

use std::str::FromStr;

use axum::Router;
use axum::http::HeaderMap;
use axum::routing::{get, put};

use lumen_app::ports::{
    AuditLogRepository, DeviceRepository, EventPublisher, NotificationRepository,
    ScheduleRepository,
};
use lumen_domain::error::{LumenError, ValidationError};
use lumen_domain::id::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the collaborator's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extract the caller's [`UserId`] from the `x-user-id` header.
///
/// # Errors
///
/// Returns a 400-mapped validation error when the header is absent or not a
/// valid UUID.
pub fn require_user_id(headers: &HeaderMap) -> Result<UserId, ApiError> {
    let raw = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| invalid_user_id(""))?;
    UserId::from_str(raw).map_err(|_| invalid_user_id(raw))
}

/// Extract the caller's [`UserId`] when the header is present. An absent
/// header is fine; a malformed one is still a 400.
pub fn optional_user_id(headers: &HeaderMap) -> Result<Option<UserId>, ApiError> {
    match headers.get(USER_ID_HEADER) {
        None => Ok(None),
        Some(value) => {
            let raw = value.to_str().map_err(|_| invalid_user_id(""))?;
            UserId::from_str(raw)
                .map(Some)
                .map_err(|_| invalid_user_id(raw))
        }
    }
}

fn invalid_user_id(raw: &str) -> ApiError {
    ApiError::from(LumenError::Validation(ValidationError::InvalidUserId(
        raw.to_owned(),
    )))
}

/// Build the `/api` sub-router.
pub fn routes<DR, AL, SR, NR, P>() -> Router<AppState<DR, AL, SR, NR, P>>
where
    DR: DeviceRepository + Send + Sync + 'static,
    AL: AuditLogRepository + Clone + Send + Sync + 'static,
    SR: ScheduleRepository + Send + Sync + 'static,
    NR: NotificationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        // Devices
        .route(
            "/devices",
            get(devices::list::<DR, AL, SR, NR, P>).post(devices::create::<DR, AL, SR, NR, P>),
        )
        .route("/devices/{id}", get(devices::get::<DR, AL, SR, NR, P>))
        .route(
            "/devices/{id}/status",
            put(devices::update_status::<DR, AL, SR, NR, P>),
        )
        .route(
            "/devices/{id}/history",
            get(devices::history::<DR, AL, SR, NR, P>),
        )
        // Schedules
        .route(
            "/schedules",
            get(schedules::list::<DR, AL, SR, NR, P>).post(schedules::create::<DR, AL, SR, NR, P>),
        )
        .route(
            "/schedules/{id}",
            get(schedules::get::<DR, AL, SR, NR, P>)
                .put(schedules::update::<DR, AL, SR, NR, P>)
                .delete(schedules::delete::<DR, AL, SR, NR, P>),
        )
        // Notifications
        .route(
            "/notifications",
            get(notifications::list::<DR, AL, SR, NR, P>)
                .post(notifications::create::<DR, AL, SR, NR, P>),
        )
        .route(
            "/notifications/{id}/read",
            put(notifications::mark_read::<DR, AL, SR, NR, P>),
        )
        // Events
        .route("/events/stream", get(sse::stream::<DR, AL, SR, NR, P>))
}
