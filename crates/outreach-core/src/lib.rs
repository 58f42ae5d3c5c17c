//! Core types, validation, normalization and orchestration for the outreach
//! encounter log.
//!
//! No HTTP or database code lives here. Storage backends implement
//! [`store::EncounterStore`] and [`store::BlobStore`]; the API crate drives
//! everything through [`service::EncounterService`].

// Store implementations use `async fn` against the `Send` futures the
// traits declare.
#![allow(async_fn_in_trait)]

pub mod draft;
pub mod encounter;
pub mod error;
pub mod events;
pub mod normalize;
pub mod service;
pub mod stats;
pub mod store;
pub mod validate;
pub mod wire;

pub use error::{Error, Result};
