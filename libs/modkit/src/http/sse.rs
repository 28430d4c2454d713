use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::{convert::Infallible, time::Duration};

/// Turn a typed stream into an SSE response with JSON payloads.
///
/// `event_name` picks the `event:` field per item. Items that fail to serialize
/// become a `serialization_error` data marker instead of ending the stream.
/// Keep-alive comments are emitted every `keepalive` to avoid idle timeouts.
pub fn typed_sse<S, T, F>(
    stream: S,
    keepalive: Duration,
    event_name: F,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize,
    F: Fn(&T) -> &'static str + Send + 'static,
{
    let events = stream.map(move |item| {
        let name = event_name(&item);
        let ev = Event::default()
            .event(name)
            .json_data(&item)
            .unwrap_or_else(|_| Event::default().event(name).data("serialization_error"));
        Ok(ev)
    });
    Sse::new(events).keep_alive(KeepAlive::new().interval(keepalive).text("keepalive"))
}
