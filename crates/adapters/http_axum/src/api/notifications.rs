//! JSON REST handlers for per-user notifications. Every endpoint requires
//! the `x-user-id` header.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use lumen_app::ports::{
    AuditLogRepository, DeviceRepository, EventPublisher, NotificationRepository,
    ScheduleRepository,
};
use lumen_domain::error::{LumenError, NotFoundError};
use lumen_domain::id::NotificationId;
use lumen_domain::notification::{Notification, NotificationKind};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating a notification.
#[derive(Deserialize)]
pub struct CreateNotificationRequest {
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub kind: NotificationKind,
}

fn parse_notification_id(raw: &str) -> Result<NotificationId, ApiError> {
    NotificationId::from_str(raw).map_err(|_| {
        ApiError::from(LumenError::NotFound(NotFoundError {
            entity: "Notification",
            id: raw.to_owned(),
        }))
    })
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Notification>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Notification>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the mark-read endpoint.
pub enum MarkReadResponse {
    Ok(Json<Notification>),
}

impl IntoResponse for MarkReadResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/notifications` — the caller's notifications, newest first.
pub async fn list<DR, AL, SR, NR, P>(
    State(state): State<AppState<DR, AL, SR, NR, P>>,
    headers: HeaderMap,
) -> Result<ListResponse, ApiError>
where
    DR: DeviceRepository + Send + Sync + 'static,
    AL: AuditLogRepository + Send + Sync + 'static,
    SR: ScheduleRepository + Send + Sync + 'static,
    NR: NotificationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let user_id = crate::api::require_user_id(&headers)?;
    let notifications = state.notifications.list(user_id).await?;
    Ok(ListResponse::Ok(Json(notifications)))
}

/// `POST /api/notifications` — self-addressed notification, e.g. reminders.
pub async fn create<DR, AL, SR, NR, P>(
    State(state): State<AppState<DR, AL, SR, NR, P>>,
    headers: HeaderMap,
    Json(req): Json<CreateNotificationRequest>,
) -> Result<CreateResponse, ApiError>
where
    DR: DeviceRepository + Send + Sync + 'static,
    AL: AuditLogRepository + Send + Sync + 'static,
    SR: ScheduleRepository + Send + Sync + 'static,
    NR: NotificationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let user_id = crate::api::require_user_id(&headers)?;
    let created = state
        .notifications
        .notify(user_id, req.kind, req.title, req.message)
        .await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PUT /api/notifications/{id}/read`
///
/// Only the owner can mark a notification; anyone else gets a 404 rather
/// than a hint the notification exists.
pub async fn mark_read<DR, AL, SR, NR, P>(
    State(state): State<AppState<DR, AL, SR, NR, P>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<MarkReadResponse, ApiError>
where
    DR: DeviceRepository + Send + Sync + 'static,
    AL: AuditLogRepository + Send + Sync + 'static,
    SR: ScheduleRepository + Send + Sync + 'static,
    NR: NotificationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let user_id = crate::api::require_user_id(&headers)?;
    let notification_id = parse_notification_id(&id)?;
    let updated = state
        .notifications
        .mark_read(user_id, notification_id)
        .await?;
    Ok(MarkReadResponse::Ok(Json(updated)))
}
