//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use lumen_app::ports::{
    AuditLogRepository, DeviceRepository, EventPublisher, NotificationRepository,
    ScheduleRepository,
};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Mounts the JSON API under `/api` and a bare `/health` probe.
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem.
pub fn build<DR, AL, SR, NR, P>(state: AppState<DR, AL, SR, NR, P>) -> Router
where
    DR: DeviceRepository + Send + Sync + 'static,
    AL: AuditLogRepository + Clone + Send + Sync + 'static,
    SR: ScheduleRepository + Send + Sync + 'static,
    NR: NotificationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex, PoisonError};
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use lumen_app::event_bus::InProcessEventBus;
    use lumen_app::services::notification_service::NotificationService;
    use lumen_app::services::registry_service::DeviceRegistry;
    use lumen_app::services::schedule_service::ScheduleService;
    use lumen_app::transition_engine::TransitionEngine;
    use lumen_domain::audit::AuditRecord;
    use lumen_domain::device::{Device, DeviceStatus};
    use lumen_domain::error::LumenError;
    use lumen_domain::id::{DeviceId, NotificationId, ScheduleId, UserId};
    use lumen_domain::notification::Notification;
    use lumen_domain::schedule::Schedule;

    #[derive(Default)]
    struct MemDeviceRepo {
        devices: Mutex<HashMap<DeviceId, Device>>,
    }

    impl lumen_app::ports::DeviceRepository for MemDeviceRepo {
        async fn create(&self, device: Device) -> Result<Device, LumenError> {
            self.lock()
                .insert(device.device_id.clone(), device.clone());
            Ok(device)
        }
        async fn get(&self, device_id: &DeviceId) -> Result<Option<Device>, LumenError> {
            Ok(self.lock().get(device_id).cloned())
        }
        async fn get_all(&self) -> Result<Vec<Device>, LumenError> {
            Ok(self.lock().values().cloned().collect())
        }
        async fn update(&self, device: Device) -> Result<Device, LumenError> {
            self.lock()
                .insert(device.device_id.clone(), device.clone());
            Ok(device)
        }
    }

    impl MemDeviceRepo {
        fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<DeviceId, Device>> {
            self.devices
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
        }
    }

    #[derive(Default)]
    struct MemAuditRepo {
        records: Mutex<Vec<AuditRecord>>,
    }

    impl lumen_app::ports::AuditLogRepository for MemAuditRepo {
        async fn append(&self, record: AuditRecord) -> Result<AuditRecord, LumenError> {
            self.records
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(record.clone());
            Ok(record)
        }
        async fn find_by_device(
            &self,
            device_id: &DeviceId,
            limit: u32,
        ) -> Result<Vec<AuditRecord>, LumenError> {
            let records = self
                .records
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Ok(records
                .iter()
                .rev()
                .filter(|r| &r.device_id == device_id)
                .take(limit as usize)
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct MemScheduleRepo {
        schedules: Mutex<HashMap<ScheduleId, Schedule>>,
    }

    impl lumen_app::ports::ScheduleRepository for MemScheduleRepo {
        async fn create(&self, schedule: Schedule) -> Result<Schedule, LumenError> {
            self.lock().insert(schedule.id, schedule.clone());
            Ok(schedule)
        }
        async fn get_by_id(&self, id: ScheduleId) -> Result<Option<Schedule>, LumenError> {
            Ok(self.lock().get(&id).cloned())
        }
        async fn get_all(&self) -> Result<Vec<Schedule>, LumenError> {
            Ok(self.lock().values().cloned().collect())
        }
        async fn get_enabled(&self) -> Result<Vec<Schedule>, LumenError> {
            Ok(self
                .lock()
                .values()
                .filter(|s| s.enabled)
                .cloned()
                .collect())
        }
        async fn update(&self, schedule: Schedule) -> Result<Schedule, LumenError> {
            self.lock().insert(schedule.id, schedule.clone());
            Ok(schedule)
        }
        async fn delete(&self, id: ScheduleId) -> Result<(), LumenError> {
            self.lock().remove(&id);
            Ok(())
        }
    }

    impl MemScheduleRepo {
        fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ScheduleId, Schedule>> {
            self.schedules
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
        }
    }

    #[derive(Default)]
    struct MemNotificationRepo {
        notifications: Mutex<Vec<Notification>>,
    }

    impl lumen_app::ports::NotificationRepository for MemNotificationRepo {
        async fn create(&self, notification: Notification) -> Result<Notification, LumenError> {
            self.lock().push(notification.clone());
            Ok(notification)
        }
        async fn get_by_id(
            &self,
            id: NotificationId,
        ) -> Result<Option<Notification>, LumenError> {
            Ok(self.lock().iter().find(|n| n.id == id).cloned())
        }
        async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Notification>, LumenError> {
            Ok(self
                .lock()
                .iter()
                .rev()
                .filter(|n| n.user_id == user_id)
                .cloned()
                .collect())
        }
        async fn update(&self, notification: Notification) -> Result<Notification, LumenError> {
            let mut notifications = self.lock();
            if let Some(slot) = notifications.iter_mut().find(|n| n.id == notification.id) {
                *slot = notification.clone();
            }
            Ok(notification)
        }
    }

    impl MemNotificationRepo {
        fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
            self.notifications
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
        }
    }

    type TestState = AppState<
        Arc<MemDeviceRepo>,
        Arc<MemAuditRepo>,
        Arc<MemScheduleRepo>,
        Arc<MemNotificationRepo>,
        Arc<InProcessEventBus>,
    >;

    struct Harness {
        state: TestState,
        audit_repo: Arc<MemAuditRepo>,
    }

    fn harness(devices: Vec<Device>) -> Harness {
        let device_repo = Arc::new(MemDeviceRepo::default());
        for device in devices {
            device_repo
                .lock()
                .insert(device.device_id.clone(), device);
        }
        let audit_repo = Arc::new(MemAuditRepo::default());
        let schedule_repo = Arc::new(MemScheduleRepo::default());
        let notification_repo = Arc::new(MemNotificationRepo::default());
        let event_bus = Arc::new(InProcessEventBus::new(16));

        let registry = Arc::new(DeviceRegistry::new(
            Arc::clone(&device_repo),
            Arc::clone(&event_bus),
        ));
        let engine = Arc::new(TransitionEngine::new(
            Arc::clone(&device_repo),
            Arc::clone(&audit_repo),
            Arc::clone(&notification_repo),
            Arc::clone(&event_bus),
            UserId::new(),
            Duration::from_millis(500),
        ));
        let schedules = Arc::new(ScheduleService::new(Arc::clone(&schedule_repo)));
        let notifications = Arc::new(NotificationService::new(Arc::clone(&notification_repo)));

        let state = AppState::new(
            registry,
            engine,
            schedules,
            notifications,
            Arc::clone(&audit_repo),
            event_bus,
        );
        Harness { state, audit_repo }
    }

    fn seeded_device() -> Device {
        Device::builder()
            .device_id(DeviceId::new("lr1").unwrap())
            .name("Living Room Light")
            .power_consumption(9.5)
            .build()
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let app = build(harness(vec![]).state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_create_device_and_return_201() {
        let app = build(harness(vec![]).state);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/devices",
                serde_json::json!({
                    "device_id": "lr1",
                    "name": "Living Room Light",
                    "power_consumption": 9.5,
                    "location": "living room"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["device_id"], "lr1");
        assert_eq!(body["status"], "off");
        assert_eq!(body["brightness"], 100);
    }

    #[tokio::test]
    async fn should_reject_duplicate_device_registration() {
        let app = build(harness(vec![seeded_device()]).state);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/devices",
                serde_json::json!({"device_id": "lr1", "name": "Duplicate"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_return_404_for_unknown_device() {
        let app = build(harness(vec![]).state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/devices/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_apply_transition_and_return_updated_device() {
        let harness = harness(vec![seeded_device()]);
        let app = build(harness.state.clone());

        let response = app
            .oneshot(json_request(
                "PUT",
                "/api/devices/lr1/status",
                serde_json::json!({"status": "on", "brightness": 80}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "on");
        assert_eq!(body["brightness"], 80);
        assert!(!body["last_seen"].is_null());

        let records = harness
            .audit_repo
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, "status_changed_to_on");
    }

    #[tokio::test]
    async fn should_reject_out_of_range_brightness_with_400() {
        let app = build(harness(vec![seeded_device()]).state);

        let response = app
            .oneshot(json_request(
                "PUT",
                "/api/devices/lr1/status",
                serde_json::json!({"status": "dimmed", "brightness": 150}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("150"));
    }

    #[tokio::test]
    async fn should_reject_malformed_user_id_header_with_400() {
        let app = build(harness(vec![seeded_device()]).state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/devices/lr1/status")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header("x-user-id", "not-a-uuid")
                    .body(Body::from(r#"{"status": "on"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_list_device_history_newest_first() {
        let harness = harness(vec![seeded_device()]);
        let app = build(harness.state.clone());
        let device_id = DeviceId::new("lr1").unwrap();

        for status in [DeviceStatus::On, DeviceStatus::Off, DeviceStatus::Dimmed] {
            harness
                .audit_repo
                .records
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(AuditRecord::for_transition(
                    device_id.clone(),
                    status,
                    50,
                    "#ffffff",
                ));
        }

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/devices/lr1/history")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let records = body.as_array().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["action"], "status_changed_to_dimmed");
        assert_eq!(records[2]["action"], "status_changed_to_on");
    }

    #[tokio::test]
    async fn should_return_404_for_history_of_unknown_device() {
        let app = build(harness(vec![]).state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/devices/ghost/history")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_create_schedule_and_return_201() {
        let app = build(harness(vec![seeded_device()]).state);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/schedules",
                serde_json::json!({
                    "name": "Evening lights",
                    "device_id": "lr1",
                    "action": "dim",
                    "brightness": 30,
                    "scheduled_time": "18:30",
                    "days": "mon,wed,fri"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["scheduled_time"], "18:30:00");
        assert_eq!(body["days"], "mon,wed,fri");
        assert_eq!(body["enabled"], true);
    }

    #[tokio::test]
    async fn should_reject_schedule_with_malformed_time() {
        let app = build(harness(vec![seeded_device()]).state);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/schedules",
                serde_json::json!({
                    "name": "Broken",
                    "device_id": "lr1",
                    "action": "on",
                    "scheduled_time": "25:99"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_delete_schedule_and_return_204() {
        let app = build(harness(vec![seeded_device()]).state);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/schedules",
                serde_json::json!({
                    "name": "Nightly off",
                    "device_id": "lr1",
                    "action": "off",
                    "scheduled_time": "23:00:00"
                }),
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        let id = body["id"].as_str().unwrap().to_owned();

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/schedules/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn should_require_user_id_header_for_notifications() {
        let app = build(harness(vec![]).state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/notifications")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_create_and_mark_notification_read() {
        let app = build(harness(vec![]).state);
        let user = UserId::new().to_string();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/notifications")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header("x-user-id", &user)
                    .body(Body::from(
                        r#"{"title": "Reminder", "message": "check the hallway light"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "info");
        assert_eq!(body["read"], false);
        let id = body["id"].as_str().unwrap().to_owned();

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/api/notifications/{id}/read"))
                    .header("x-user-id", &user)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["read"], true);
    }

    #[tokio::test]
    async fn should_open_event_stream_with_sse_content_type() {
        let app = build(harness(vec![]).state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/events/stream")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );
    }

    #[tokio::test]
    async fn should_return_404_when_marking_foreign_notification() {
        let app = build(harness(vec![]).state);
        let owner = UserId::new().to_string();
        let stranger = UserId::new().to_string();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/notifications")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header("x-user-id", &owner)
                    .body(Body::from(r#"{"title": "Private", "message": "mine"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        let id = body["id"].as_str().unwrap().to_owned();

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/api/notifications/{id}/read"))
                    .header("x-user-id", &stranger)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
