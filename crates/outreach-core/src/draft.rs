//! Candidate records: what a client asked for, before validation.
//!
//! An [`EncounterPatch`] holds only the fields a client actually supplied. An
//! [`EncounterDraft`] is a complete candidate: either the creation defaults
//! with a patch applied, or an existing record with a patch merged on top.

use chrono::NaiveDate;

use crate::encounter::{AgeCategory, Gender, PersonEncounter, Upload};

/// A coordinate as supplied by a client.
///
/// Absent and non-numeric input is kept as such so the validator can reject
/// it; it is never silently replaced by `0`.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericInput {
  Blank,
  NotANumber(String),
  Value(f64),
}

impl NumericInput {
  pub fn parse(raw: &str) -> Self {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return Self::Blank;
    }
    match trimmed.parse::<f64>() {
      Ok(v) if v.is_finite() => Self::Value(v),
      _ => Self::NotANumber(trimmed.to_owned()),
    }
  }

  pub fn value(&self) -> Option<f64> {
    match self {
      Self::Value(v) => Some(*v),
      _ => None,
    }
  }
}

/// The fields a client supplied, already renamed and coerced.
#[derive(Debug, Clone, Default)]
pub struct EncounterPatch {
  pub description:      Option<String>,
  pub latitude:         Option<NumericInput>,
  pub longitude:        Option<NumericInput>,
  pub gender:           Option<String>,
  pub age_category:     Option<String>,
  /// `Some(None)` means a date was supplied but could not be parsed.
  pub date_encounter:   Option<Option<NaiveDate>>,
  pub location_visited: Option<bool>,
  pub first_name:       Option<String>,
  pub last_name:        Option<String>,
  pub consent_given:    Option<bool>,
  pub signature:        Option<String>,
  pub photo:            Option<Upload>,
  pub document:         Option<Upload>,
}

impl EncounterPatch {
  pub fn uploads(&self) -> impl Iterator<Item = &Upload> {
    self.photo.iter().chain(self.document.iter())
  }
}

/// A complete candidate record.
#[derive(Debug, Clone, PartialEq)]
pub struct EncounterDraft {
  pub description:      Option<String>,
  pub latitude:         NumericInput,
  pub longitude:        NumericInput,
  pub gender:           Option<String>,
  pub age_category:     Option<String>,
  pub date_encounter:   Option<NaiveDate>,
  pub location_visited: bool,
  pub first_name:       Option<String>,
  pub last_name:        Option<String>,
  pub consent_given:    bool,
  pub signature:        Option<String>,
  pub has_photo:        bool,
  pub has_document:     bool,
}

impl EncounterDraft {
  /// The creation defaults with `patch` applied on top.
  pub fn with_defaults(patch: &EncounterPatch, today: NaiveDate) -> Self {
    let mut draft = Self {
      description:      None,
      latitude:         NumericInput::Blank,
      longitude:        NumericInput::Blank,
      gender:           Some(Gender::default().as_str().to_owned()),
      age_category:     Some(AgeCategory::default().as_str().to_owned()),
      date_encounter:   Some(today),
      location_visited: false,
      first_name:       None,
      last_name:        None,
      consent_given:    false,
      signature:        None,
      has_photo:        false,
      has_document:     false,
    };
    draft.apply(patch);
    draft
  }

  /// A draft reproducing a persisted record exactly.
  pub fn from_existing(e: &PersonEncounter) -> Self {
    Self {
      description:      Some(e.description.clone()),
      latitude:         NumericInput::Value(e.latitude),
      longitude:        NumericInput::Value(e.longitude),
      gender:           Some(e.gender.as_str().to_owned()),
      age_category:     Some(e.age_category.as_str().to_owned()),
      date_encounter:   Some(e.date_encounter),
      location_visited: e.location_visited,
      first_name:       e.first_name.clone(),
      last_name:        e.last_name.clone(),
      consent_given:    e.consent_given,
      signature:        e.signature.clone(),
      has_photo:        e.photo.is_some(),
      has_document:     e.document.is_some(),
    }
  }

  /// Overwrite every field `patch` supplies; leave the rest untouched.
  pub fn apply(&mut self, patch: &EncounterPatch) {
    if let Some(v) = &patch.description {
      self.description = Some(v.clone());
    }
    if let Some(v) = &patch.latitude {
      self.latitude = v.clone();
    }
    if let Some(v) = &patch.longitude {
      self.longitude = v.clone();
    }
    if let Some(v) = &patch.gender {
      self.gender = Some(v.clone());
    }
    if let Some(v) = &patch.age_category {
      self.age_category = Some(v.clone());
    }
    if let Some(v) = patch.date_encounter {
      self.date_encounter = v;
    }
    if let Some(v) = patch.location_visited {
      self.location_visited = v;
    }
    if let Some(v) = &patch.first_name {
      self.first_name = Some(v.clone());
    }
    if let Some(v) = &patch.last_name {
      self.last_name = Some(v.clone());
    }
    if let Some(v) = patch.consent_given {
      self.consent_given = v;
    }
    if let Some(v) = &patch.signature {
      self.signature = Some(v.clone());
    }
    self.has_photo |= patch.photo.is_some();
    self.has_document |= patch.document.is_some();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn numeric_input_parsing() {
    assert_eq!(NumericInput::parse(" 48.8566 "), NumericInput::Value(48.8566));
    assert_eq!(NumericInput::parse(""), NumericInput::Blank);
    assert_eq!(NumericInput::parse("   "), NumericInput::Blank);
    assert_eq!(
      NumericInput::parse("north"),
      NumericInput::NotANumber("north".into())
    );
    assert!(matches!(NumericInput::parse("NaN"), NumericInput::NotANumber(_)));
  }

  #[test]
  fn defaults_fill_only_missing_fields() {
    let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let patch = EncounterPatch {
      gender: Some("femme".into()),
      ..Default::default()
    };
    let draft = EncounterDraft::with_defaults(&patch, today);
    assert_eq!(draft.gender.as_deref(), Some("femme"));
    assert_eq!(draft.age_category.as_deref(), Some("adulte"));
    assert_eq!(draft.date_encounter, Some(today));
    assert_eq!(draft.latitude, NumericInput::Blank);
    assert!(!draft.location_visited);
  }

  #[test]
  fn unparseable_date_clears_the_default() {
    let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let patch = EncounterPatch {
      date_encounter: Some(None),
      ..Default::default()
    };
    let draft = EncounterDraft::with_defaults(&patch, today);
    assert_eq!(draft.date_encounter, None);
  }
}
