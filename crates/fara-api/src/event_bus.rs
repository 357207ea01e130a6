//! The Event Bus (spec §4.5): writes events through the Store
//! (best-effort, already enforced inside `ActionStore::append_event`) and
//! fans them out live to subscribers. Fan-out is at-most-once and
//! best-effort — the Store remains the authoritative record; subscribers
//! reconcile gaps via `get_events`.

use std::sync::Arc;

use fara_core::ActionEvent;
use fara_storage::ActionStore;
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

/// One fanned-out notification. `Lagged` replaces whatever events a slow
/// subscriber missed because its buffer overflowed (spec §4.5: "drop-oldest
/// on overflow and mark the stream as lagged").
#[derive(Debug, Clone)]
pub enum BusMessage {
    Event { action_id: String, event_type: String, meta: Map<String, Value> },
    Lagged { skipped: u64 },
}

/// Bounded per-subscriber buffer. Sized generously since subscribers are
/// expected to be SSE clients draining promptly, not a backpressure valve.
const CHANNEL_CAPACITY: usize = 1024;

pub struct EventBus {
    store: Arc<dyn ActionStore>,
    sender: broadcast::Sender<BusMessage>,
}

impl EventBus {
    pub fn new(store: Arc<dyn ActionStore>) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { store, sender }
    }

    /// Persist (best-effort, handled inside the store) and fan out.
    pub async fn emit(&self, action_id: &str, event_type: &str, meta: Map<String, Value>) {
        self.store.append_event(action_id, event_type, meta.clone()).await;
        // No receivers is not an error — it just means nobody is watching.
        let _ = self.sender.send(BusMessage::Event {
            action_id: action_id.to_string(),
            event_type: event_type.to_string(),
            meta,
        });
    }

    /// A live stream of events for this action (and every other action —
    /// callers filter client-side, matching the original's single
    /// unfiltered `/v1/events` stream).
    pub fn subscribe(&self) -> impl Stream<Item = BusMessage> + Send + 'static {
        BroadcastStream::new(self.sender.subscribe()).map(|result| match result {
            Ok(message) => message,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => BusMessage::Lagged { skipped },
        })
    }

    pub async fn events_for(&self, action_id: &str) -> Result<Vec<ActionEvent>, fara_core::GovernorError> {
        self.store.get_events(action_id).await
    }
}
