use axum::response::sse::{Event, KeepAlive, Sse};
use colloquy_core::ColloquyResult;
use colloquy_session::{EventStream, TurnEvent};
use futures_util::{Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use std::time::Duration;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Serialize)]
struct ErrorData {
    message: String,
}

/// Encode one engine item as an SSE frame named after its event type.
pub fn to_sse_event(item: ColloquyResult<TurnEvent>) -> Event {
    match item {
        Ok(event) => {
            let kind = event.kind();
            Event::default()
                .event(kind)
                .json_data(&event)
                .unwrap_or_else(|_| Event::default().event(kind).data("{}"))
        }
        Err(e) => Event::default()
            .event("error")
            .json_data(ErrorData {
                message: e.to_string(),
            })
            .unwrap_or_else(|_| Event::default().event("error").data("{}")),
    }
}

/// Wrap a dialog's event stream as an SSE response body with keep-alive comments.
pub fn dialog_sse(
    events: EventStream,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let keep_alive = KeepAlive::new()
        .interval(KEEP_ALIVE_INTERVAL)
        .text("keep-alive");
    Sse::new(events.map(|item| Ok(to_sse_event(item)))).keep_alive(keep_alive)
}
