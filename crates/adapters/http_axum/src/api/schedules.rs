//! JSON REST handlers for schedules.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveTime;
use serde::Deserialize;

use lumen_app::ports::{
    AuditLogRepository, DeviceRepository, EventPublisher, NotificationRepository,
    ScheduleRepository,
};
use lumen_domain::error::{LumenError, ValidationError};
use lumen_domain::id::{DeviceId, ScheduleId};
use lumen_domain::schedule::{DaySet, Schedule, ScheduleAction, ScheduleBuilder};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating or replacing a schedule.
#[derive(Deserialize)]
pub struct ScheduleRequest {
    pub name: String,
    pub device_id: String,
    pub action: ScheduleAction,
    pub brightness: Option<u8>,
    /// Time of day, `HH:MM` or `HH:MM:SS`.
    pub scheduled_time: String,
    /// Comma-separated weekday tags, e.g. `mon,wed,fri`. Defaults to every day.
    pub days: Option<String>,
    pub enabled: Option<bool>,
}

impl ScheduleRequest {
    fn into_builder(self) -> Result<ScheduleBuilder, ApiError> {
        let device_id = DeviceId::from_str(&self.device_id)
            .map_err(|err| ApiError::from(LumenError::Validation(err)))?;
        let scheduled_time = parse_time(&self.scheduled_time)?;

        let mut builder = Schedule::builder()
            .name(self.name)
            .device_id(device_id)
            .action(self.action)
            .scheduled_time(scheduled_time);
        if let Some(brightness) = self.brightness {
            builder = builder.brightness(brightness);
        }
        if let Some(days) = self.days {
            let days = DaySet::from_str(&days)
                .map_err(|err| ApiError::from(LumenError::Validation(err)))?;
            builder = builder.days(days);
        }
        if let Some(enabled) = self.enabled {
            builder = builder.enabled(enabled);
        }
        Ok(builder)
    }
}

fn parse_time(raw: &str) -> Result<NaiveTime, ApiError> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| {
            ApiError::from(LumenError::Validation(ValidationError::InvalidTime(
                raw.to_owned(),
            )))
        })
}

fn parse_schedule_id(raw: &str) -> Result<ScheduleId, ApiError> {
    ScheduleId::from_str(raw).map_err(|_| {
        ApiError::from(LumenError::NotFound(lumen_domain::error::NotFoundError {
            entity: "Schedule",
            id: raw.to_owned(),
        }))
    })
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Schedule>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get and update endpoints.
pub enum GetResponse {
    Ok(Json<Schedule>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Schedule>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/schedules`
pub async fn list<DR, AL, SR, NR, P>(
    State(state): State<AppState<DR, AL, SR, NR, P>>,
) -> Result<ListResponse, ApiError>
where
    DR: DeviceRepository + Send + Sync + 'static,
    AL: AuditLogRepository + Send + Sync + 'static,
    SR: ScheduleRepository + Send + Sync + 'static,
    NR: NotificationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let schedules = state.schedules.list().await?;
    Ok(ListResponse::Ok(Json(schedules)))
}

/// `GET /api/schedules/{id}`
pub async fn get<DR, AL, SR, NR, P>(
    State(state): State<AppState<DR, AL, SR, NR, P>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    DR: DeviceRepository + Send + Sync + 'static,
    AL: AuditLogRepository + Send + Sync + 'static,
    SR: ScheduleRepository + Send + Sync + 'static,
    NR: NotificationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let schedule_id = parse_schedule_id(&id)?;
    let schedule = state.schedules.get(schedule_id).await?;
    Ok(GetResponse::Ok(Json(schedule)))
}

/// `POST /api/schedules`
pub async fn create<DR, AL, SR, NR, P>(
    State(state): State<AppState<DR, AL, SR, NR, P>>,
    Json(req): Json<ScheduleRequest>,
) -> Result<CreateResponse, ApiError>
where
    DR: DeviceRepository + Send + Sync + 'static,
    AL: AuditLogRepository + Send + Sync + 'static,
    SR: ScheduleRepository + Send + Sync + 'static,
    NR: NotificationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let schedule = req.into_builder()?.build()?;
    let created = state.schedules.create(schedule).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PUT /api/schedules/{id}` — full replacement of an existing schedule.
pub async fn update<DR, AL, SR, NR, P>(
    State(state): State<AppState<DR, AL, SR, NR, P>>,
    Path(id): Path<String>,
    Json(req): Json<ScheduleRequest>,
) -> Result<GetResponse, ApiError>
where
    DR: DeviceRepository + Send + Sync + 'static,
    AL: AuditLogRepository + Send + Sync + 'static,
    SR: ScheduleRepository + Send + Sync + 'static,
    NR: NotificationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let schedule_id = parse_schedule_id(&id)?;
    let schedule = req.into_builder()?.id(schedule_id).build()?;
    let updated = state.schedules.update(schedule).await?;
    Ok(GetResponse::Ok(Json(updated)))
}

/// `DELETE /api/schedules/{id}`
pub async fn delete<DR, AL, SR, NR, P>(
    State(state): State<AppState<DR, AL, SR, NR, P>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    DR: DeviceRepository + Send + Sync + 'static,
    AL: AuditLogRepository + Send + Sync + 'static,
    SR: ScheduleRepository + Send + Sync + 'static,
    NR: NotificationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let schedule_id = parse_schedule_id(&id)?;
    state.schedules.delete(schedule_id).await?;
    Ok(DeleteResponse::NoContent)
}
