//! Server-sent event stream of domain events.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};

use lumen_app::ports::{
    AuditLogRepository, DeviceRepository, EventPublisher, NotificationRepository,
    ScheduleRepository,
};

use crate::state::AppState;

/// `GET /api/events/stream`
///
/// Streams every event published on the bus as a JSON-encoded SSE data
/// frame. A subscriber that falls behind the channel capacity misses the
/// lagged events; the stream itself stays open.
pub async fn stream<DR, AL, SR, NR, P>(
    State(state): State<AppState<DR, AL, SR, NR, P>>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>>
where
    DR: DeviceRepository + Send + Sync + 'static,
    AL: AuditLogRepository + Send + Sync + 'static,
    SR: ScheduleRepository + Send + Sync + 'static,
    NR: NotificationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let receiver = state.event_bus.subscribe();
    let stream = BroadcastStream::new(receiver).filter_map(|item| match item {
        Ok(event) => match SseEvent::default()
            .event(event.event_type.to_string())
            .json_data(&event)
        {
            Ok(frame) => Some(Ok(frame)),
            Err(error) => {
                tracing::error!(%error, "failed to serialize event for sse");
                None
            }
        },
        Err(lagged) => {
            tracing::warn!(%lagged, "sse subscriber lagging, events dropped");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
