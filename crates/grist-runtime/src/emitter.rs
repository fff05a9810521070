//! Server-push framing for the turn event stream.
//!
//! Each event becomes one `data: <json>\n\n` frame. Serialization failure
//! substitutes a well-formed `error` frame rather than propagating, so
//! every emitted frame is parseable by a conforming client. A terminal
//! `end` frame is appended exactly once per turn, success or failure, so
//! clients can distinguish orderly closure from a dropped transport.

use async_stream::stream;
use futures::{Stream, StreamExt};
use grist_core::events::TurnEvent;
use tracing::warn;

/// Serialize one event into a transport frame.
#[must_use]
pub fn frame(event: &TurnEvent) -> String {
    match serde_json::to_string(event) {
        Ok(json) => format!("data: {json}\n\n"),
        Err(e) => {
            warn!(event_type = event.event_type(), error = %e, "event serialization failed");
            fallback_frame(event.thread_id().unwrap_or_default(), &e.to_string())
        }
    }
}

/// Build the substitute `error` frame for a serialization failure.
fn fallback_frame(thread_id: &str, detail: &str) -> String {
    let substitute = TurnEvent::error(format!("Event serialization error: {detail}"), thread_id);
    serde_json::to_string(&substitute).map_or_else(
        |_| "data: {\"type\":\"error\",\"content\":\"event serialization error\"}\n\n".to_owned(),
        |json| format!("data: {json}\n\n"),
    )
}

/// Frame a turn's event stream for transport.
///
/// Appends the terminal `end` frame after the source is exhausted; any
/// `end` the source itself produces is dropped so the marker appears
/// exactly once.
pub fn into_sse<S>(events: S) -> impl Stream<Item = String> + Send
where
    S: Stream<Item = TurnEvent> + Send + 'static,
{
    stream! {
        let mut events = std::pin::pin!(events);
        while let Some(event) = events.next().await {
            if matches!(event, TurnEvent::End) {
                continue;
            }
            yield frame(&event);
        }
        yield frame(&TurnEvent::End);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
