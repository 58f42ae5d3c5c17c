//! Storage traits and list filtering.
//!
//! [`EncounterStore`] persists records; [`BlobStore`] holds attachment
//! payloads. Both are implemented in `outreach-store-sqlite`; higher layers
//! depend only on these abstractions.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use bytes::Bytes;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::encounter::{AgeCategory, Attachment, Gender, PersonEncounter, Upload};

// ─── Records ─────────────────────────────────────────────────────────────────

pub trait EncounterStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new, already validated record.
  fn insert_encounter(
    &self,
    encounter: PersonEncounter,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Retrieve a record by id. Returns `None` if not found.
  fn get_encounter(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<PersonEncounter>, Self::Error>> + Send + '_;

  /// Every record, in insertion order.
  fn list_encounters(
    &self,
  ) -> impl Future<Output = Result<Vec<PersonEncounter>, Self::Error>> + Send + '_;

  /// Overwrite an existing record. Returns `false` if no record has that id.
  fn update_encounter(
    &self,
    encounter: PersonEncounter,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Remove a record permanently. Returns `false` if no record has that id.
  fn delete_encounter(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Attachment payloads ─────────────────────────────────────────────────────

pub trait BlobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Write `upload` under a fresh key and return its metadata.
  fn put(
    &self,
    upload: Upload,
  ) -> impl Future<Output = Result<Attachment, Self::Error>> + Send + '_;

  /// Read a payload back. Returns `None` if the key is unknown.
  fn read(
    &self,
    key: Uuid,
  ) -> impl Future<Output = Result<Option<Bytes>, Self::Error>> + Send + '_;

  /// Delete a payload. Unknown keys are not an error.
  fn remove(
    &self,
    key: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Filtering ───────────────────────────────────────────────────────────────

/// Criteria for [`EncounterService::list`](crate::service::EncounterService::list).
/// Every set criterion must match; the date range is inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncounterFilter {
  pub gender:           Option<Gender>,
  pub age_category:     Option<AgeCategory>,
  pub location_visited: Option<bool>,
  pub date_from:        Option<NaiveDate>,
  pub date_to:          Option<NaiveDate>,
}

impl EncounterFilter {
  pub fn matches(&self, e: &PersonEncounter) -> bool {
    self.gender.is_none_or(|g| e.gender == g)
      && self.age_category.is_none_or(|a| e.age_category == a)
      && self.location_visited.is_none_or(|v| e.location_visited == v)
      && self.date_from.is_none_or(|d| e.date_encounter >= d)
      && self.date_to.is_none_or(|d| e.date_encounter <= d)
  }
}
