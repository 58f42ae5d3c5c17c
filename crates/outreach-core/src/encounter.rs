//! The encounter record and its value types.
//!
//! A [`PersonEncounter`] is only ever constructed from a draft that passed
//! [`crate::validate::validate`], so every field here already satisfies the
//! record invariants.

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

// ─── Demographics ────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Gender {
  Homme,
  Femme,
  Autre,
  #[default]
  NonSpecifie,
}

impl Gender {
  pub const ALL: [Gender; 4] =
    [Self::Homme, Self::Femme, Self::Autre, Self::NonSpecifie];

  pub fn as_str(self) -> &'static str { self.into() }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AgeCategory {
  #[default]
  Adulte,
  Enfant,
}

impl AgeCategory {
  pub const ALL: [AgeCategory; 2] = [Self::Adulte, Self::Enfant];

  pub fn as_str(self) -> &'static str { self.into() }
}

// ─── Attachments ─────────────────────────────────────────────────────────────

/// Which of the two attachment slots a file occupies.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttachmentKind {
  Photo,
  Document,
}

impl AttachmentKind {
  /// Whether a file with `content_type` may be stored in this slot.
  /// Photos must be images; documents may be images or PDFs.
  pub fn accepts(self, content_type: &str) -> bool {
    let essence = content_type
      .split(';')
      .next()
      .unwrap_or_default()
      .trim()
      .to_ascii_lowercase();
    match self {
      Self::Photo => essence.starts_with("image/"),
      Self::Document => {
        essence.starts_with("image/") || essence == "application/pdf"
      }
    }
  }

  /// Internal field name used as the validation-error key.
  pub fn field(self) -> &'static str { self.into() }
}

/// Metadata for a stored file. The payload itself lives in a
/// [`BlobStore`](crate::store::BlobStore) under `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
  pub key:          Uuid,
  pub filename:     String,
  pub content_type: String,
  pub byte_size:    u64,
  /// SHA-256 hex digest of the payload.
  pub checksum:     String,
}

/// A file received from a client, not yet written anywhere.
#[derive(Debug, Clone)]
pub struct Upload {
  pub filename:     String,
  pub content_type: String,
  pub data:         Bytes,
}

// ─── Encounter ───────────────────────────────────────────────────────────────

/// One logged interaction between a field worker and a person, anchored to a
/// place and a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonEncounter {
  pub id:               Uuid,
  pub description:      String,
  pub latitude:         f64,
  pub longitude:        f64,
  pub gender:           Gender,
  pub age_category:     AgeCategory,
  pub date_encounter:   NaiveDate,
  /// The spot has since received an outreach or distribution visit.
  pub location_visited: bool,
  pub first_name:       Option<String>,
  pub last_name:        Option<String>,
  pub consent_given:    bool,
  /// Captured handwriting (an image data URL). Only kept with consent.
  pub signature:        Option<String>,
  pub photo:            Option<Attachment>,
  pub document:         Option<Attachment>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

impl PersonEncounter {
  pub fn attachment(&self, kind: AttachmentKind) -> Option<&Attachment> {
    match kind {
      AttachmentKind::Photo => self.photo.as_ref(),
      AttachmentKind::Document => self.document.as_ref(),
    }
  }

  /// Blob keys of every attachment this record references.
  pub fn attachment_keys(&self) -> Vec<Uuid> {
    self
      .photo
      .iter()
      .chain(self.document.iter())
      .map(|a| a.key)
      .collect()
  }
}
