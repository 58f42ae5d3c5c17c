//! Field rules for encounter records.
//!
//! Every rule is checked independently and every violation is collected; a
//! draft with three problems reports all three. Malformed input is never a
//! panic or an early return, it is simply another violation.

use std::{collections::BTreeMap, fmt, ops::RangeInclusive, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};
use uuid::Uuid;

use crate::{
  draft::{EncounterDraft, EncounterPatch, NumericInput},
  encounter::{
    AgeCategory, Attachment, AttachmentKind, Gender, PersonEncounter,
  },
};

pub const MIN_DESCRIPTION_CHARS: usize = 10;
pub const LATITUDE_RANGE: RangeInclusive<f64> = -90.0..=90.0;
pub const LONGITUDE_RANGE: RangeInclusive<f64> = -180.0..=180.0;

// ─── Violations ──────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Violation {
  Blank,
  TooShort,
  NotANumber,
  OutOfRange,
  Inclusion,
  MustBeAccepted,
  /// An upload's media type does not fit its slot.
  ContentType,
}

/// Field name → ordered violations. Keys are internal (camelCase) names; the
/// [`Normalizer`](crate::normalize::Normalizer) translates them for the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<Violation>>);

impl ValidationErrors {
  pub fn add(&mut self, field: &str, violation: Violation) {
    self.0.entry(field.to_owned()).or_default().push(violation);
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  /// Violations recorded against `field`, in the order they were found.
  pub fn get(&self, field: &str) -> &[Violation] {
    self.0.get(field).map(Vec::as_slice).unwrap_or_default()
  }

  pub fn merge(&mut self, other: ValidationErrors) {
    for (field, violations) in other.0 {
      self.0.entry(field).or_default().extend(violations);
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &[Violation])> {
    self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, violations) in &self.0 {
      for v in violations {
        if !first {
          f.write_str("; ")?;
        }
        write!(f, "{field}: {v}")?;
        first = false;
      }
    }
    Ok(())
  }
}

// ─── Valid output ────────────────────────────────────────────────────────────

/// The typed fields of a draft that passed [`validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidEncounter {
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
}

impl ValidEncounter {
  /// Assemble the persisted record. Blank names become `None`, and the
  /// signature is dropped unless consent was given.
  pub fn into_encounter(
    self,
    id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    photo: Option<Attachment>,
    document: Option<Attachment>,
  ) -> PersonEncounter {
    let signature = if self.consent_given {
      present(self.signature)
    } else {
      None
    };
    PersonEncounter {
      id,
      description: self.description,
      latitude: self.latitude,
      longitude: self.longitude,
      gender: self.gender,
      age_category: self.age_category,
      date_encounter: self.date_encounter,
      location_visited: self.location_visited,
      first_name: present(self.first_name),
      last_name: present(self.last_name),
      consent_given: self.consent_given,
      signature,
      photo,
      document,
      created_at,
      updated_at,
    }
  }
}

fn present(s: Option<String>) -> Option<String> {
  s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

fn is_blank(s: Option<&str>) -> bool {
  s.is_none_or(|s| s.trim().is_empty())
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// Check every field rule against `draft`.
pub fn validate(
  draft: &EncounterDraft,
) -> Result<ValidEncounter, ValidationErrors> {
  let mut errors = ValidationErrors::default();

  let description = check_description(draft.description.as_deref(), &mut errors);
  let latitude =
    check_coordinate("latitude", &draft.latitude, LATITUDE_RANGE, &mut errors);
  let longitude = check_coordinate(
    "longitude",
    &draft.longitude,
    LONGITUDE_RANGE,
    &mut errors,
  );
  let gender =
    check_choice::<Gender>("gender", draft.gender.as_deref(), &mut errors);
  let age_category = check_choice::<AgeCategory>(
    "ageCategory",
    draft.age_category.as_deref(),
    &mut errors,
  );
  if draft.date_encounter.is_none() {
    errors.add("dateEncounter", Violation::Blank);
  }

  if (draft.has_photo || draft.has_document) && !draft.consent_given {
    errors.add("consentGiven", Violation::MustBeAccepted);
  }
  if draft.consent_given {
    if is_blank(draft.first_name.as_deref()) {
      errors.add("firstName", Violation::Blank);
    }
    if is_blank(draft.last_name.as_deref()) {
      errors.add("lastName", Violation::Blank);
    }
  }

  match (
    description,
    latitude,
    longitude,
    gender,
    age_category,
    draft.date_encounter,
  ) {
    (
      Some(description),
      Some(latitude),
      Some(longitude),
      Some(gender),
      Some(age_category),
      Some(date_encounter),
    ) if errors.is_empty() => Ok(ValidEncounter {
      description,
      latitude,
      longitude,
      gender,
      age_category,
      date_encounter,
      location_visited: draft.location_visited,
      first_name: draft.first_name.clone(),
      last_name: draft.last_name.clone(),
      consent_given: draft.consent_given,
      signature: draft.signature.clone(),
    }),
    _ => Err(errors),
  }
}

/// Media-type checks for the files carried by `patch`. Kept apart from
/// [`validate`], which judges the record alone.
pub fn check_uploads(patch: &EncounterPatch) -> ValidationErrors {
  let mut errors = ValidationErrors::default();
  let slots = [
    (AttachmentKind::Photo, &patch.photo),
    (AttachmentKind::Document, &patch.document),
  ];
  for (kind, upload) in slots {
    if let Some(upload) = upload
      && !kind.accepts(&upload.content_type)
    {
      errors.add(kind.field(), Violation::ContentType);
    }
  }
  errors
}

fn check_description(
  value: Option<&str>,
  errors: &mut ValidationErrors,
) -> Option<String> {
  let text = value.unwrap_or_default();
  let mut ok = true;
  if text.trim().is_empty() {
    errors.add("description", Violation::Blank);
    ok = false;
  }
  if text.chars().count() < MIN_DESCRIPTION_CHARS {
    errors.add("description", Violation::TooShort);
    ok = false;
  }
  ok.then(|| text.to_owned())
}

fn check_coordinate(
  field: &str,
  value: &NumericInput,
  range: RangeInclusive<f64>,
  errors: &mut ValidationErrors,
) -> Option<f64> {
  match value {
    NumericInput::Blank => {
      errors.add(field, Violation::Blank);
      None
    }
    NumericInput::NotANumber(_) => {
      errors.add(field, Violation::NotANumber);
      None
    }
    NumericInput::Value(v) if !range.contains(v) => {
      errors.add(field, Violation::OutOfRange);
      None
    }
    NumericInput::Value(v) => Some(*v),
  }
}

fn check_choice<T: FromStr>(
  field: &str,
  value: Option<&str>,
  errors: &mut ValidationErrors,
) -> Option<T> {
  match value {
    None => {
      errors.add(field, Violation::Blank);
      None
    }
    Some(s) if s.trim().is_empty() => {
      errors.add(field, Violation::Blank);
      errors.add(field, Violation::Inclusion);
      None
    }
    Some(s) => {
      let parsed = s.parse::<T>().ok();
      if parsed.is_none() {
        errors.add(field, Violation::Inclusion);
      }
      parsed
    }
  }
}

#[cfg(test)]
mod tests {
  use bytes::Bytes;

  use super::*;
  use crate::encounter::Upload;

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2025, 1, 10).unwrap() }

  fn good_draft() -> EncounterDraft {
    EncounterDraft {
      description:      Some("Homme âgé assis près du métro".into()),
      latitude:         NumericInput::Value(48.8566),
      longitude:        NumericInput::Value(2.3522),
      gender:           Some("homme".into()),
      age_category:     Some("adulte".into()),
      date_encounter:   Some(today()),
      location_visited: false,
      first_name:       None,
      last_name:        None,
      consent_given:    false,
      signature:        None,
      has_photo:        false,
      has_document:     false,
    }
  }

  #[test]
  fn valid_draft_yields_typed_fields() {
    let valid = validate(&good_draft()).unwrap();
    assert_eq!(valid.gender, Gender::Homme);
    assert_eq!(valid.age_category, AgeCategory::Adulte);
    assert_eq!(valid.latitude, 48.8566);
  }

  #[test]
  fn every_violation_is_collected() {
    let draft = EncounterDraft {
      description: Some("court".into()),
      latitude: NumericInput::Value(95.0),
      longitude: NumericInput::NotANumber("east".into()),
      gender: Some("robot".into()),
      age_category: None,
      date_encounter: None,
      ..good_draft()
    };
    let errors = validate(&draft).unwrap_err();
    assert_eq!(errors.get("description"), &[Violation::TooShort]);
    assert_eq!(errors.get("latitude"), &[Violation::OutOfRange]);
    assert_eq!(errors.get("longitude"), &[Violation::NotANumber]);
    assert_eq!(errors.get("gender"), &[Violation::Inclusion]);
    assert_eq!(errors.get("ageCategory"), &[Violation::Blank]);
    assert_eq!(errors.get("dateEncounter"), &[Violation::Blank]);
  }

  #[test]
  fn description_length_counts_characters() {
    // Ten characters, more than ten bytes.
    let draft = EncounterDraft {
      description: Some("éééééééééé".into()),
      ..good_draft()
    };
    assert!(validate(&draft).is_ok());

    let draft = EncounterDraft {
      description: Some("          ".into()),
      ..good_draft()
    };
    assert_eq!(
      validate(&draft).unwrap_err().get("description"),
      &[Violation::Blank]
    );

    let draft = EncounterDraft { description: None, ..good_draft() };
    assert_eq!(
      validate(&draft).unwrap_err().get("description"),
      &[Violation::Blank, Violation::TooShort]
    );
  }

  #[test]
  fn coordinate_bounds_are_inclusive() {
    let draft = EncounterDraft {
      latitude: NumericInput::Value(-90.0),
      longitude: NumericInput::Value(180.0),
      ..good_draft()
    };
    assert!(validate(&draft).is_ok());

    let draft = EncounterDraft {
      longitude: NumericInput::Value(-180.5),
      latitude: NumericInput::Blank,
      ..good_draft()
    };
    let errors = validate(&draft).unwrap_err();
    assert_eq!(errors.get("longitude"), &[Violation::OutOfRange]);
    assert_eq!(errors.get("latitude"), &[Violation::Blank]);
  }

  #[test]
  fn consent_requires_both_names() {
    let draft = EncounterDraft { consent_given: true, ..good_draft() };
    let errors = validate(&draft).unwrap_err();
    assert_eq!(errors.get("firstName"), &[Violation::Blank]);
    assert_eq!(errors.get("lastName"), &[Violation::Blank]);

    let draft = EncounterDraft {
      consent_given: true,
      first_name: Some("Marie".into()),
      last_name: Some("  ".into()),
      ..good_draft()
    };
    let errors = validate(&draft).unwrap_err();
    assert!(errors.get("firstName").is_empty());
    assert_eq!(errors.get("lastName"), &[Violation::Blank]);
  }

  #[test]
  fn attachments_require_consent() {
    let draft = EncounterDraft { has_document: true, ..good_draft() };
    let errors = validate(&draft).unwrap_err();
    assert_eq!(errors.get("consentGiven"), &[Violation::MustBeAccepted]);

    let draft = EncounterDraft {
      has_photo: true,
      consent_given: true,
      first_name: Some("Marie".into()),
      last_name: Some("Curie".into()),
      ..good_draft()
    };
    assert!(validate(&draft).is_ok());
  }

  #[test]
  fn signature_is_dropped_without_consent() {
    let draft = EncounterDraft {
      signature: Some("data:image/png;base64,AAAA".into()),
      ..good_draft()
    };
    let e = validate(&draft).unwrap().into_encounter(
      Uuid::new_v4(),
      Utc::now(),
      Utc::now(),
      None,
      None,
    );
    assert_eq!(e.signature, None);
  }

  #[test]
  fn upload_media_types_are_checked_per_slot() {
    let upload = |content_type: &str| Upload {
      filename:     "f".into(),
      content_type: content_type.into(),
      data:         Bytes::from_static(b"x"),
    };
    let patch = EncounterPatch {
      photo: Some(upload("application/pdf")),
      document: Some(upload("application/pdf")),
      ..Default::default()
    };
    let errors = check_uploads(&patch);
    assert_eq!(errors.get("photo"), &[Violation::ContentType]);
    assert!(errors.get("document").is_empty());
  }

  #[test]
  fn errors_serialize_as_a_flat_map() {
    let mut errors = ValidationErrors::default();
    errors.add("latitude", Violation::OutOfRange);
    assert_eq!(
      serde_json::to_value(&errors).unwrap(),
      serde_json::json!({ "latitude": ["out_of_range"] })
    );
    assert_eq!(errors.to_string(), "latitude: out_of_range");
  }
}
