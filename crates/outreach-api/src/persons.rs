//! Handlers for `/persons` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/persons` | Optional `gender`, `age_category`, `location_visited`, `date_from`, `date_to` |
//! | `POST` | `/persons` | Multipart or JSON [`PersonPayload`]; 201 + record, or 422 |
//! | `GET`  | `/persons/{id}` | 404 if not found or not a UUID |
//! | `PUT`/`PATCH` | `/persons/{id}` | Partial payload merged onto the record |
//! | `DELETE` | `/persons/{id}` | 204, or 404 |
//! | `GET`  | `/persons/{id}/photo`, `/persons/{id}/document` | Stored payload |

use axum::{
  Json,
  extract::{FromRequestParts, Path, Query, State},
  http::{HeaderValue, StatusCode, header, request::Parts},
  response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use outreach_core::{
  encounter::{AgeCategory, AttachmentKind, Gender},
  store::{BlobStore, EncounterFilter, EncounterStore},
  wire::PersonRecord,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  error::{ApiError, PERSON_NOT_FOUND},
  payload::PersonPayload,
};

// ─── Path id ──────────────────────────────────────────────────────────────────

/// The `{id}` segment of a `/persons/{id}` route.
///
/// A segment that does not parse as a UUID cannot name a stored record, so
/// it is rejected with the same 404 body as an unknown id.
#[derive(Debug, Clone, Copy)]
pub struct PersonId(pub Uuid);

impl<S> FromRequestParts<S> for PersonId
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &S,
  ) -> Result<Self, Self::Rejection> {
    let Path(raw) = Path::<String>::from_request_parts(parts, state)
      .await
      .map_err(|_| ApiError::NotFound(PERSON_NOT_FOUND))?;
    raw
      .parse::<Uuid>()
      .map(Self)
      .map_err(|_| ApiError::NotFound(PERSON_NOT_FOUND))
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub gender:           Option<Gender>,
  pub age_category:     Option<AgeCategory>,
  pub location_visited: Option<bool>,
  /// Inclusive lower bound on `date_encounter`.
  pub date_from:        Option<NaiveDate>,
  /// Inclusive upper bound on `date_encounter`.
  pub date_to:          Option<NaiveDate>,
}

impl From<ListParams> for EncounterFilter {
  fn from(p: ListParams) -> Self {
    EncounterFilter {
      gender:           p.gender,
      age_category:     p.age_category,
      location_visited: p.location_visited,
      date_from:        p.date_from,
      date_to:          p.date_to,
    }
  }
}

/// `GET /persons[?gender=..&age_category=..&location_visited=..&date_from=..&date_to=..]`
pub async fn list<S, B>(
  State(state): State<AppState<S, B>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<PersonRecord>>, ApiError>
where
  S: EncounterStore + 'static,
  B: BlobStore + 'static,
{
  let records = state.service.list(&params.into()).await?;
  Ok(Json(records))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /persons/{id}`
pub async fn get_one<S, B>(
  State(state): State<AppState<S, B>>,
  PersonId(id): PersonId,
) -> Result<Json<PersonRecord>, ApiError>
where
  S: EncounterStore + 'static,
  B: BlobStore + 'static,
{
  Ok(Json(state.service.get(id).await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /persons`: 201 + the stored record.
pub async fn create<S, B>(
  State(state): State<AppState<S, B>>,
  PersonPayload(input): PersonPayload,
) -> Result<impl IntoResponse, ApiError>
where
  S: EncounterStore + 'static,
  B: BlobStore + 'static,
{
  let record = state.service.create(input).await?;
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /persons/{id}` and `PATCH /persons/{id}`. Both merge: fields absent
/// from the body keep their stored values.
pub async fn update<S, B>(
  State(state): State<AppState<S, B>>,
  PersonId(id): PersonId,
  PersonPayload(input): PersonPayload,
) -> Result<Json<PersonRecord>, ApiError>
where
  S: EncounterStore + 'static,
  B: BlobStore + 'static,
{
  Ok(Json(state.service.update(id, input).await?))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /persons/{id}`
pub async fn delete<S, B>(
  State(state): State<AppState<S, B>>,
  PersonId(id): PersonId,
) -> Result<StatusCode, ApiError>
where
  S: EncounterStore + 'static,
  B: BlobStore + 'static,
{
  state.service.delete(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Attachments ──────────────────────────────────────────────────────────────

/// `GET /persons/{id}/photo`
pub async fn photo<S, B>(
  State(state): State<AppState<S, B>>,
  PersonId(id): PersonId,
) -> Result<Response, ApiError>
where
  S: EncounterStore + 'static,
  B: BlobStore + 'static,
{
  attachment(&state, id, AttachmentKind::Photo).await
}

/// `GET /persons/{id}/document`
pub async fn document<S, B>(
  State(state): State<AppState<S, B>>,
  PersonId(id): PersonId,
) -> Result<Response, ApiError>
where
  S: EncounterStore + 'static,
  B: BlobStore + 'static,
{
  attachment(&state, id, AttachmentKind::Document).await
}

async fn attachment<S, B>(
  state: &AppState<S, B>,
  id: Uuid,
  kind: AttachmentKind,
) -> Result<Response, ApiError>
where
  S: EncounterStore + 'static,
  B: BlobStore + 'static,
{
  let (meta, data) = state.service.attachment(id, kind).await?;

  let content_type = HeaderValue::from_str(&meta.content_type)
    .unwrap_or(HeaderValue::from_static("application/octet-stream"));
  let safe_name: String = meta
    .filename
    .chars()
    .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
    .collect();
  let disposition = HeaderValue::from_str(&format!("inline; filename=\"{safe_name}\""))
    .unwrap_or(HeaderValue::from_static("inline"));

  Ok(
    (
      [
        (header::CONTENT_TYPE, content_type),
        (header::CONTENT_DISPOSITION, disposition),
      ],
      data,
    )
      .into_response(),
  )
}
