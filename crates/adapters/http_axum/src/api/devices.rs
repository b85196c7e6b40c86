//! JSON REST handlers for devices: registration, lookup, transitions and
//! audit history.

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
use lumen_app::transition_engine::TransitionRequest;
use lumen_domain::audit::AuditRecord;
use lumen_domain::device::{Device, DeviceStatus, StateChange};
use lumen_domain::error::LumenError;
use lumen_domain::id::DeviceId;

use crate::error::ApiError;
use crate::state::AppState;

/// History responses never exceed this many records.
const HISTORY_LIMIT: u32 = 50;

/// Request body for registering a device.
#[derive(Deserialize)]
pub struct CreateDeviceRequest {
    pub device_id: String,
    pub name: String,
    pub power_consumption: Option<f64>,
    pub location: Option<String>,
}

/// Request body for requesting a transition.
#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: DeviceStatus,
    pub brightness: Option<u8>,
    pub color: Option<String>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Device>>),
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
    Ok(Json<Device>),
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
    Created(Json<Device>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the history endpoint.
pub enum HistoryResponse {
    Ok(Json<Vec<AuditRecord>>),
}

impl IntoResponse for HistoryResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

fn parse_device_id(raw: &str) -> Result<DeviceId, ApiError> {
    DeviceId::from_str(raw).map_err(|err| ApiError::from(LumenError::Validation(err)))
}

/// `GET /api/devices`
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
    let devices = state.registry.list().await?;
    Ok(ListResponse::Ok(Json(devices)))
}

/// `GET /api/devices/{id}`
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
    let device_id = parse_device_id(&id)?;
    let device = state.registry.get(&device_id).await?;
    Ok(GetResponse::Ok(Json(device)))
}

/// `POST /api/devices`
pub async fn create<DR, AL, SR, NR, P>(
    State(state): State<AppState<DR, AL, SR, NR, P>>,
    Json(req): Json<CreateDeviceRequest>,
) -> Result<CreateResponse, ApiError>
where
    DR: DeviceRepository + Send + Sync + 'static,
    AL: AuditLogRepository + Send + Sync + 'static,
    SR: ScheduleRepository + Send + Sync + 'static,
    NR: NotificationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let device_id = parse_device_id(&req.device_id)?;

    let mut builder = Device::builder().device_id(device_id).name(req.name);
    if let Some(watts) = req.power_consumption {
        builder = builder.power_consumption(watts);
    }
    if let Some(location) = req.location {
        builder = builder.location(location);
    }
    let device = builder.build()?;

    let created = state.registry.register(device).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PUT /api/devices/{id}/status`
///
/// Invokes the transition engine. The optional `x-user-id` header addresses
/// the outcome notification; without it the operator is notified.
pub async fn update_status<DR, AL, SR, NR, P>(
    State(state): State<AppState<DR, AL, SR, NR, P>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<GetResponse, ApiError>
where
    DR: DeviceRepository + Send + Sync + 'static,
    AL: AuditLogRepository + Send + Sync + 'static,
    SR: ScheduleRepository + Send + Sync + 'static,
    NR: NotificationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let device_id = parse_device_id(&id)?;
    let initiated_by = crate::api::optional_user_id(&headers)?;

    let updated = state
        .engine
        .request_transition(TransitionRequest {
            device_id,
            change: StateChange {
                status: req.status,
                brightness: req.brightness,
                color: req.color,
            },
            initiated_by,
        })
        .await?;
    Ok(GetResponse::Ok(Json(updated)))
}

/// `GET /api/devices/{id}/history` — up to 50 most-recent audit records,
/// newest first. 404 when the device is not registered.
pub async fn history<DR, AL, SR, NR, P>(
    State(state): State<AppState<DR, AL, SR, NR, P>>,
    Path(id): Path<String>,
) -> Result<HistoryResponse, ApiError>
where
    DR: DeviceRepository + Send + Sync + 'static,
    AL: AuditLogRepository + Send + Sync + 'static,
    SR: ScheduleRepository + Send + Sync + 'static,
    NR: NotificationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let device_id = parse_device_id(&id)?;
    state.registry.get(&device_id).await?;
    let records = state
        .audit_log
        .find_by_device(&device_id, HISTORY_LIMIT)
        .await?;
    Ok(HistoryResponse::Ok(Json(records)))
}
