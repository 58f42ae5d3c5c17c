//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, dates are `YYYY-MM-DD`, attachments are
//! compact JSON. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use outreach_core::encounter::{
  AgeCategory, Attachment, Gender, PersonEncounter,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Timestamps and dates ────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_gender(s: &str) -> Result<Gender> {
  s.parse().map_err(|_| Error::UnknownValue {
    column: "gender",
    value:  s.to_owned(),
  })
}

pub fn decode_age_category(s: &str) -> Result<AgeCategory> {
  s.parse().map_err(|_| Error::UnknownValue {
    column: "age_category",
    value:  s.to_owned(),
  })
}

// ─── Attachments ─────────────────────────────────────────────────────────────

pub fn encode_attachment(a: Option<&Attachment>) -> Result<Option<String>> {
  Ok(a.map(serde_json::to_string).transpose()?)
}

pub fn decode_attachment(s: Option<&str>) -> Result<Option<Attachment>> {
  Ok(s.map(serde_json::from_str).transpose()?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list shared by every `SELECT` so [`RawEncounter::from_row`] can
/// read by position.
pub const ENCOUNTER_COLUMNS: &str = "encounter_id, description, latitude, \
  longitude, gender, age_category, date_encounter, location_visited, \
  first_name, last_name, consent_given, signature, photo, document, \
  created_at, updated_at";

/// Raw values read directly from an `encounters` row.
pub struct RawEncounter {
  pub encounter_id:     String,
  pub description:      String,
  pub latitude:         f64,
  pub longitude:        f64,
  pub gender:           String,
  pub age_category:     String,
  pub date_encounter:   String,
  pub location_visited: bool,
  pub first_name:       Option<String>,
  pub last_name:        Option<String>,
  pub consent_given:    bool,
  pub signature:        Option<String>,
  pub photo:            Option<String>,
  pub document:         Option<String>,
  pub created_at:       String,
  pub updated_at:       String,
}

impl RawEncounter {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      encounter_id:     row.get(0)?,
      description:      row.get(1)?,
      latitude:         row.get(2)?,
      longitude:        row.get(3)?,
      gender:           row.get(4)?,
      age_category:     row.get(5)?,
      date_encounter:   row.get(6)?,
      location_visited: row.get(7)?,
      first_name:       row.get(8)?,
      last_name:        row.get(9)?,
      consent_given:    row.get(10)?,
      signature:        row.get(11)?,
      photo:            row.get(12)?,
      document:         row.get(13)?,
      created_at:       row.get(14)?,
      updated_at:       row.get(15)?,
    })
  }

  pub fn into_encounter(self) -> Result<PersonEncounter> {
    Ok(PersonEncounter {
      id:               decode_uuid(&self.encounter_id)?,
      description:      self.description,
      latitude:         self.latitude,
      longitude:        self.longitude,
      gender:           decode_gender(&self.gender)?,
      age_category:     decode_age_category(&self.age_category)?,
      date_encounter:   decode_date(&self.date_encounter)?,
      location_visited: self.location_visited,
      first_name:       self.first_name,
      last_name:        self.last_name,
      consent_given:    self.consent_given,
      signature:        self.signature,
      photo:            decode_attachment(self.photo.as_deref())?,
      document:         decode_attachment(self.document.as_deref())?,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

/// Owned column values for an `INSERT` or `UPDATE`, built on the async side
/// and moved into the connection closure.
pub struct EncounterRow {
  pub encounter_id:     String,
  pub description:      String,
  pub latitude:         f64,
  pub longitude:        f64,
  pub gender:           &'static str,
  pub age_category:     &'static str,
  pub date_encounter:   String,
  pub location_visited: bool,
  pub first_name:       Option<String>,
  pub last_name:        Option<String>,
  pub consent_given:    bool,
  pub signature:        Option<String>,
  pub photo:            Option<String>,
  pub document:         Option<String>,
  pub created_at:       String,
  pub updated_at:       String,
}

impl EncounterRow {
  pub fn encode(e: &PersonEncounter) -> Result<Self> {
    Ok(Self {
      encounter_id:     encode_uuid(e.id),
      description:      e.description.clone(),
      latitude:         e.latitude,
      longitude:        e.longitude,
      gender:           e.gender.as_str(),
      age_category:     e.age_category.as_str(),
      date_encounter:   encode_date(e.date_encounter),
      location_visited: e.location_visited,
      first_name:       e.first_name.clone(),
      last_name:        e.last_name.clone(),
      consent_given:    e.consent_given,
      signature:        e.signature.clone(),
      photo:            encode_attachment(e.photo.as_ref())?,
      document:         encode_attachment(e.document.as_ref())?,
      created_at:       encode_dt(e.created_at),
      updated_at:       encode_dt(e.updated_at),
    })
  }
}
