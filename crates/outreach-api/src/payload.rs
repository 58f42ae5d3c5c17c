//! The [`PersonPayload`] extractor for create and update bodies.
//!
//! Two encodings are accepted:
//!
//! - `multipart/form-data` with `person[<field>]` text parts and optional
//!   `person[photo]` / `person[document]` file parts;
//! - JSON, either wrapped as `{"person": {...}}` or flat.
//!
//! Values are passed through untouched; coercion is the normalizer's job.

use axum::{
  extract::{FromRequest, Multipart, Request},
  http::header::CONTENT_TYPE,
};
use bytes::Bytes;
use outreach_core::{
  encounter::{AttachmentKind, Upload},
  wire::{EncounterInput, PersonParams},
};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// A create or update request body, decoded into [`EncounterInput`].
#[derive(Debug)]
pub struct PersonPayload(pub EncounterInput);

impl<S> FromRequest<S> for PersonPayload
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let is_multipart = req
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if is_multipart {
      let multipart = Multipart::from_request(req, state)
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?;
      from_multipart(multipart).await.map(Self)
    } else {
      let body = Bytes::from_request(req, state)
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?;
      from_json(&body).map(Self)
    }
  }
}

/// `person[first_name]` → `first_name`.
fn person_key(name: &str) -> Option<&str> {
  name.strip_prefix("person[")?.strip_suffix(']')
}

async fn from_multipart(mut multipart: Multipart) -> Result<EncounterInput, ApiError> {
  let mut fields = Map::new();
  let mut photo = None;
  let mut document = None;

  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::BadRequest(e.body_text()))?
  {
    let Some(key) = field.name().and_then(person_key).map(str::to_owned) else {
      continue;
    };

    let slot = if key == AttachmentKind::Photo.field() {
      Some(&mut photo)
    } else if key == AttachmentKind::Document.field() {
      Some(&mut document)
    } else {
      None
    };

    match slot {
      Some(slot) => {
        let filename = field.file_name().unwrap_or("upload").to_owned();
        let content_type = field
          .content_type()
          .unwrap_or("application/octet-stream")
          .to_owned();
        let data = field
          .bytes()
          .await
          .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        // Browsers submit an empty part for an untouched file input.
        if !data.is_empty() {
          *slot = Some(Upload { filename, content_type, data });
        }
      }
      None => {
        let text = field
          .text()
          .await
          .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        fields.insert(key, Value::String(text));
      }
    }
  }

  let params = serde_json::from_value::<PersonParams>(Value::Object(fields))
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
  Ok(EncounterInput { params, photo, document })
}

fn from_json(body: &[u8]) -> Result<EncounterInput, ApiError> {
  let value: Value = serde_json::from_slice(body)
    .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))?;

  let params = match value {
    Value::Object(mut map) => match map.remove("person") {
      Some(inner @ Value::Object(_)) => inner,
      Some(other) => {
        map.insert("person".into(), other);
        Value::Object(map)
      }
      None => Value::Object(map),
    },
    _ => {
      return Err(ApiError::BadRequest("expected a JSON object".into()));
    }
  };

  let params = serde_json::from_value::<PersonParams>(params)
    .map_err(|e| ApiError::BadRequest(format!("invalid person fields: {e}")))?;
  Ok(EncounterInput::from(params))
}
