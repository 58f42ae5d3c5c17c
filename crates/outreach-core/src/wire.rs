//! Wire shapes: what clients send and what the API returns.
//!
//! Field names on the wire are snake_case. Inbound values are loosely typed
//! (multipart forms deliver everything as text, JSON clients send native
//! booleans and numbers) and are only coerced by the
//! [`Normalizer`](crate::normalize::Normalizer).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  draft::NumericInput,
  encounter::{AgeCategory, Gender, Upload},
  stats::EncounterStats,
};

// ─── Inbound ─────────────────────────────────────────────────────────────────

/// A loosely typed inbound value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
  Bool(bool),
  Number(f64),
  Text(String),
  /// An array or object where a single value was expected. Kept so the
  /// validator can report it against its field.
  Other(serde_json::Value),
}

impl Scalar {
  pub fn into_text(self) -> String {
    match self {
      Self::Bool(b) => b.to_string(),
      Self::Number(n) => n.to_string(),
      Self::Text(s) => s,
      Self::Other(v) => v.to_string(),
    }
  }

  /// Strict boolean coercion: only native `true`, non-zero numbers, and the
  /// strings `true`, `1`, `t`, `on`, `yes` (any case) are true.
  pub fn to_bool(&self) -> bool {
    match self {
      Self::Bool(b) => *b,
      Self::Number(n) => *n != 0.0,
      Self::Text(s) => matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "t" | "on" | "yes"
      ),
      Self::Other(_) => false,
    }
  }

  pub fn to_numeric(&self) -> NumericInput {
    match self {
      Self::Number(n) if n.is_finite() => NumericInput::Value(*n),
      Self::Number(n) => NumericInput::NotANumber(n.to_string()),
      Self::Bool(b) => NumericInput::NotANumber(b.to_string()),
      Self::Text(s) => NumericInput::parse(s),
      Self::Other(v) => NumericInput::NotANumber(v.to_string()),
    }
  }
}

impl From<&str> for Scalar {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<String> for Scalar {
  fn from(s: String) -> Self { Self::Text(s) }
}

impl From<bool> for Scalar {
  fn from(b: bool) -> Self { Self::Bool(b) }
}

impl From<f64> for Scalar {
  fn from(n: f64) -> Self { Self::Number(n) }
}

/// The `person[...]` parameters of a create or update request. Unknown keys
/// are ignored; absent keys leave the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonParams {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description:      Option<Scalar>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub latitude:         Option<Scalar>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub longitude:        Option<Scalar>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub gender:           Option<Scalar>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub age_category:     Option<Scalar>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub date_encounter:   Option<Scalar>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub location_visited: Option<Scalar>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub first_name:       Option<Scalar>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_name:        Option<Scalar>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub consent_given:    Option<Scalar>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub signature:        Option<Scalar>,
}

impl From<&PersonRecord> for PersonParams {
  fn from(r: &PersonRecord) -> Self {
    Self {
      description:      Some(r.description.as_str().into()),
      latitude:         Some(r.latitude.into()),
      longitude:        Some(r.longitude.into()),
      gender:           Some(r.gender.as_str().into()),
      age_category:     Some(r.age_category.as_str().into()),
      date_encounter:   Some(r.date_encounter.to_string().into()),
      location_visited: Some(r.location_visited.into()),
      first_name:       r.first_name.as_deref().map(Scalar::from),
      last_name:        r.last_name.as_deref().map(Scalar::from),
      consent_given:    Some(r.consent_given.into()),
      signature:        r.signature.as_deref().map(Scalar::from),
    }
  }
}

/// Everything a create or update request carries.
#[derive(Debug, Clone, Default)]
pub struct EncounterInput {
  pub params:   PersonParams,
  pub photo:    Option<Upload>,
  pub document: Option<Upload>,
}

impl From<PersonParams> for EncounterInput {
  fn from(params: PersonParams) -> Self {
    Self { params, photo: None, document: None }
  }
}

// ─── Outbound ────────────────────────────────────────────────────────────────

/// A record as the API returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
  pub id:               Uuid,
  pub description:      String,
  pub latitude:         f64,
  pub longitude:        f64,
  pub gender:           Gender,
  pub age_category:     AgeCategory,
  pub date_encounter:   NaiveDate,
  pub location_visited: bool,
  pub first_name:       Option<String>,
  pub last_name:        Option<String>,
  pub consent_given:    bool,
  pub signature:        Option<String>,
  /// `"{first} {last}"`, or `"Person #{id}"` when no name is known.
  pub full_name:        String,
  pub photo_url:        Option<String>,
  pub document_url:     Option<String>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

/// Body of `GET /dashboard/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
  pub total_persons:       usize,
  pub adults_count:        usize,
  pub children_count:      usize,
  pub visited_locations:   usize,
  pub unvisited_locations: usize,
  pub with_consent_count:  usize,
  pub with_photos_count:   usize,
  pub recent_encounters:   Vec<PersonRecord>,
}

impl From<EncounterStats> for DashboardStats {
  fn from(s: EncounterStats) -> Self {
    Self {
      total_persons:       s.total,
      adults_count:        s.adults,
      children_count:      s.children,
      visited_locations:   s.visited,
      unvisited_locations: s.unvisited,
      with_consent_count:  s.with_consent,
      with_photos_count:   s.with_photos,
      recent_encounters:   s.recent,
    }
  }
}
