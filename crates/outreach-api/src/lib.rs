//! JSON REST API for the outreach encounter log.
//!
//! Exposes an axum [`Router`] backed by an [`EncounterService`] over any
//! [`EncounterStore`] and [`BlobStore`]. TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/v1", outreach_api::api_router(service))
//! ```

pub mod dashboard;
pub mod error;
pub mod events;
pub mod payload;
pub mod persons;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::get,
};
use outreach_core::{
  events::EncounterEvent,
  service::EncounterService,
  store::{BlobStore, EncounterStore},
};
use tokio::sync::broadcast;

pub use error::ApiError;

/// Largest accepted request body; attachments travel inline.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Events buffered per viewer before the slowest starts skipping.
pub const EVENT_BUFFER: usize = 64;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, B> {
  pub service: Arc<EncounterService<S, B>>,
  pub events:  broadcast::Sender<EncounterEvent>,
}

impl<S, B> Clone for AppState<S, B> {
  fn clone(&self) -> Self {
    Self {
      service: Arc::clone(&self.service),
      events:  self.events.clone(),
    }
  }
}

impl<S, B> AppState<S, B>
where
  S: EncounterStore,
  B: BlobStore,
{
  /// Wrap `service` and subscribe a broadcast bridge to its observers.
  pub fn new(service: EncounterService<S, B>) -> Self {
    let (events, _) = broadcast::channel(EVENT_BUFFER);
    service
      .observers()
      .subscribe(Arc::new(events::BroadcastObserver(events.clone())));
    Self {
      service: Arc::new(service),
      events,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, B>(service: EncounterService<S, B>) -> Router<()>
where
  S: EncounterStore + 'static,
  B: BlobStore + 'static,
{
  router(AppState::new(service))
}

/// Like [`api_router`], for callers that keep a handle on the state.
pub fn router<S, B>(state: AppState<S, B>) -> Router<()>
where
  S: EncounterStore + 'static,
  B: BlobStore + 'static,
{
  Router::new()
    // Persons
    .route(
      "/persons",
      get(persons::list::<S, B>).post(persons::create::<S, B>),
    )
    .route("/persons/events", get(events::stream::<S, B>))
    .route(
      "/persons/{id}",
      get(persons::get_one::<S, B>)
        .put(persons::update::<S, B>)
        .patch(persons::update::<S, B>)
        .delete(persons::delete::<S, B>),
    )
    .route("/persons/{id}/photo", get(persons::photo::<S, B>))
    .route("/persons/{id}/document", get(persons::document::<S, B>))
    // Dashboard
    .route("/dashboard/stats", get(dashboard::stats::<S, B>))
    .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests;
