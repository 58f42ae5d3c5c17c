//! SQLite backend for the outreach encounter log, plus a local-directory
//! store for attachment payloads.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod blob;
mod encode;
mod schema;
mod store;

pub mod error;

pub use blob::DiskBlobStore;
pub use error::{Error, Result};
pub use store::SqliteStore;
