//! Server-Sent Events support

use crate::runtime::{ConversationSnapshot, SseEvent};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream, starting with the current snapshot
pub fn sse_stream(
    init: ConversationSnapshot,
    broadcast_rx: tokio::sync::broadcast::Receiver<SseEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move {
        Ok(to_axum_event(
            "init",
            json!({ "type": "init", "snapshot": init }),
        ))
    });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(sse_event_to_axum(event))),
        Err(_) => None, // Skip lagged messages
    });

    let combined = init.chain(broadcasts);

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn sse_event_to_axum(event: SseEvent) -> Event {
    match event {
        SseEvent::Snapshot { snapshot } => to_axum_event(
            "snapshot",
            json!({
                "type": "snapshot",
                "snapshot": snapshot
            }),
        ),
        SseEvent::GenerationDone {
            success,
            question_count,
            error_kind,
        } => to_axum_event(
            "generation_done",
            json!({
                "type": "generation_done",
                "success": success,
                "question_count": question_count,
                "error_kind": error_kind
            }),
        ),
        SseEvent::Error { message } => to_axum_event(
            "error",
            json!({
                "type": "error",
                "message": message
            }),
        ),
    }
}

fn to_axum_event(event_type: &'static str, data: serde_json::Value) -> Event {
    Event::default().event(event_type).data(data.to_string())
}
