//! `GET /v1/events` — a Server-Sent-Events stream of live events (spec §6,
//! §4.5). Unfiltered: every subscriber sees every action's events and
//! filters client-side, matching the original's single unfiltered stream.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use serde_json::json;
use tokio_stream::StreamExt;

use crate::event_bus::BusMessage;
use crate::state::AppState;

pub async fn stream_events(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = state.event_bus.subscribe().map(|message| {
        let event = match message {
            BusMessage::Event { action_id, event_type, meta } => {
                Event::default().event(event_type).json_data(json!({"action_id": action_id, "meta": meta})).unwrap()
            }
            BusMessage::Lagged { skipped } => {
                Event::default().event("lagged").json_data(json!({"skipped": skipped})).unwrap()
            }
        };
        Ok(event)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
