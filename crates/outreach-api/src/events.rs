//! Server-Sent Events stream of record changes at `GET /persons/events`.
//!
//! Each connection gets its own broadcast receiver. A viewer that falls too
//! far behind skips the events it missed and keeps going.

use std::convert::Infallible;

use axum::{
  extract::State,
  response::sse::{Event, KeepAlive, Sse},
};
use outreach_core::{
  events::{EncounterEvent, EncounterObserver},
  store::{BlobStore, EncounterStore},
};
use tokio::sync::broadcast;
use tokio_stream::{
  Stream, StreamExt as _,
  wrappers::{BroadcastStream, errors::BroadcastStreamRecvError},
};
use tracing::warn;

use crate::AppState;

/// SSE event name carried by every message.
pub const EVENT_NAME: &str = "encounter";

/// Forwards service events into a broadcast channel.
pub struct BroadcastObserver(pub broadcast::Sender<EncounterEvent>);

impl EncounterObserver for BroadcastObserver {
  fn notify(&self, event: &EncounterEvent) {
    // No connected viewers is not an error.
    let _ = self.0.send(*event);
  }
}

pub async fn stream<S, B>(
  State(state): State<AppState<S, B>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
  S: EncounterStore + 'static,
  B: BlobStore + 'static,
{
  let events = BroadcastStream::new(state.events.subscribe()).filter_map(|msg| {
    match msg {
      Ok(event) => Event::default()
        .event(EVENT_NAME)
        .json_data(event)
        .ok()
        .map(Ok),
      Err(BroadcastStreamRecvError::Lagged(skipped)) => {
        warn!(skipped, "event viewer lagged");
        None
      }
    }
  });

  Sse::new(events).keep_alive(KeepAlive::default())
}
