//! The single bridge between wire shapes and internal shapes.
//!
//! Every rename, every coercion, and every derived outbound field
//! (`full_name`, `photo_url`, `document_url`) lives here so that no caller
//! carries its own mapping table.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use uuid::Uuid;

use crate::{
  draft::EncounterPatch,
  encounter::{AttachmentKind, PersonEncounter},
  validate::{ValidationErrors, Violation},
  wire::{EncounterInput, PersonRecord, Scalar},
};

/// `(internal, wire)` field name pairs.
pub const FIELD_NAMES: &[(&str, &str)] = &[
  ("description", "description"),
  ("latitude", "latitude"),
  ("longitude", "longitude"),
  ("gender", "gender"),
  ("ageCategory", "age_category"),
  ("dateEncounter", "date_encounter"),
  ("locationVisited", "location_visited"),
  ("firstName", "first_name"),
  ("lastName", "last_name"),
  ("consentGiven", "consent_given"),
  ("signature", "signature"),
  ("photo", "photo"),
  ("document", "document"),
];

/// Wire name for an internal field name. Unknown names pass through.
pub fn wire_field_name(internal: &str) -> &str {
  FIELD_NAMES
    .iter()
    .find(|(i, _)| *i == internal)
    .map_or(internal, |(_, w)| w)
}

/// Parse a calendar date from `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
    DateTime::parse_from_rfc3339(raw)
      .ok()
      .map(|dt| dt.date_naive())
  })
}

/// Text that is empty or whitespace-only counts as not supplied.
fn supplied_text(value: Option<Scalar>) -> Option<String> {
  value.map(Scalar::into_text).filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Clone)]
pub struct Normalizer {
  base_url: String,
}

impl Normalizer {
  /// `base_url` is the public root the attachment routes hang off, e.g.
  /// `https://example.org/api/v1`.
  pub fn new(base_url: impl Into<String>) -> Self {
    let base_url = base_url.into().trim_end_matches('/').to_owned();
    Self { base_url }
  }

  pub fn base_url(&self) -> &str { &self.base_url }

  // ── Inbound ───────────────────────────────────────────────────────────────

  /// Rename and coerce the supplied fields. Defaults are not applied here;
  /// see [`EncounterDraft::with_defaults`](crate::draft::EncounterDraft::with_defaults).
  pub fn inbound(&self, input: EncounterInput) -> EncounterPatch {
    let p = input.params;
    EncounterPatch {
      description:      p.description.map(Scalar::into_text),
      latitude:         p.latitude.as_ref().map(Scalar::to_numeric),
      longitude:        p.longitude.as_ref().map(Scalar::to_numeric),
      gender:           supplied_text(p.gender),
      age_category:     supplied_text(p.age_category),
      date_encounter:   supplied_text(p.date_encounter)
        .map(|s| parse_date(&s)),
      location_visited: p.location_visited.as_ref().map(Scalar::to_bool),
      first_name:       p.first_name.map(Scalar::into_text),
      last_name:        p.last_name.map(Scalar::into_text),
      consent_given:    p.consent_given.as_ref().map(Scalar::to_bool),
      signature:        p.signature.map(Scalar::into_text),
      photo:            input.photo,
      document:         input.document,
    }
  }

  // ── Outbound ──────────────────────────────────────────────────────────────

  pub fn outbound(&self, e: &PersonEncounter) -> PersonRecord {
    PersonRecord {
      id:               e.id,
      description:      e.description.clone(),
      latitude:         e.latitude,
      longitude:        e.longitude,
      gender:           e.gender,
      age_category:     e.age_category,
      date_encounter:   e.date_encounter,
      location_visited: e.location_visited,
      first_name:       e.first_name.clone(),
      last_name:        e.last_name.clone(),
      consent_given:    e.consent_given,
      signature:        e.signature.clone(),
      full_name:        full_name(e),
      photo_url:        e
        .photo
        .as_ref()
        .map(|_| self.attachment_url(e.id, AttachmentKind::Photo)),
      document_url:     e
        .document
        .as_ref()
        .map(|_| self.attachment_url(e.id, AttachmentKind::Document)),
      created_at:       e.created_at,
      updated_at:       e.updated_at,
    }
  }

  pub fn attachment_url(&self, id: Uuid, kind: AttachmentKind) -> String {
    format!("{}/persons/{id}/{kind}", self.base_url)
  }

  /// Re-key validation errors with wire field names.
  pub fn wire_errors(
    &self,
    errors: &ValidationErrors,
  ) -> BTreeMap<String, Vec<Violation>> {
    wire_errors(errors)
  }
}

/// See [`Normalizer::wire_errors`]; usable where no normalizer is at hand.
pub fn wire_errors(errors: &ValidationErrors) -> BTreeMap<String, Vec<Violation>> {
  errors
    .iter()
    .map(|(field, violations)| {
      (wire_field_name(field).to_owned(), violations.to_vec())
    })
    .collect()
}

/// `"{first} {last}"` trimmed, or `"Person #{id}"` when both are empty.
pub fn full_name(e: &PersonEncounter) -> String {
  let first = e.first_name.as_deref().unwrap_or_default();
  let last = e.last_name.as_deref().unwrap_or_default();
  let joined = format!("{first} {last}").trim().to_owned();
  if joined.is_empty() {
    format!("Person #{}", e.id)
  } else {
    joined
  }
}
