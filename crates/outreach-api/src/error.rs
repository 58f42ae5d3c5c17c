//! API error type and [`axum::response::IntoResponse`] implementation.

use std::collections::BTreeMap;

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use outreach_core::{normalize::wire_errors, validate::Violation};
use serde_json::json;
use thiserror::Error;

pub const PERSON_NOT_FOUND: &str = "Personne non trouvée";
pub const FILE_NOT_FOUND: &str = "Fichier non trouvé";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(&'static str),

  /// Violations keyed by wire field name.
  #[error("unprocessable entity")]
  Validation(BTreeMap<String, Vec<Violation>>),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store unavailable: {0}")]
  Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<outreach_core::Error> for ApiError {
  fn from(e: outreach_core::Error) -> Self {
    use outreach_core::Error as E;
    match e {
      E::ValidationFailed(errors) => Self::Validation(wire_errors(&errors)),
      E::NotFound(_) => Self::NotFound(PERSON_NOT_FOUND),
      E::AttachmentNotFound { .. } => Self::NotFound(FILE_NOT_FOUND),
      E::UpstreamUnavailable(source) => Self::Unavailable(source),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Validation(errors) => (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "errors": errors })),
      )
        .into_response(),
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Unavailable(e) => {
        tracing::error!(error = %e, "store unavailable");
        (
          StatusCode::SERVICE_UNAVAILABLE,
          Json(json!({ "error": e.to_string() })),
        )
          .into_response()
      }
    }
  }
}
