//! Error types for `outreach-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{encounter::AttachmentKind, validate::ValidationErrors};

#[derive(Debug, Error)]
pub enum Error {
  /// The candidate record broke one or more field rules. Nothing was written.
  #[error("validation failed: {0}")]
  ValidationFailed(ValidationErrors),

  #[error("encounter not found: {0}")]
  NotFound(Uuid),

  #[error("encounter {id} has no {kind}")]
  AttachmentNotFound { id: Uuid, kind: AttachmentKind },

  /// The record store or the blob store failed or could not be reached.
  #[error("upstream unavailable: {0}")]
  UpstreamUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn upstream<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::UpstreamUnavailable(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
