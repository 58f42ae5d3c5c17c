//! Dashboard statistics, recomputed from the full record set on every call.

use serde::{Deserialize, Serialize};

use crate::{
  encounter::{AgeCategory, PersonEncounter},
  normalize::Normalizer,
  wire::PersonRecord,
};

/// How many encounters the `recent` list carries.
pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterStats {
  pub total:        usize,
  pub visited:      usize,
  pub unvisited:    usize,
  pub adults:       usize,
  pub children:     usize,
  pub with_consent: usize,
  pub with_photos:  usize,
  pub recent:       Vec<PersonRecord>,
}

/// Order `encounters` (given in insertion order) most recent first:
/// `date_encounter` descending, later insertions first among equal dates.
pub fn by_recency(encounters: &[PersonEncounter]) -> Vec<&PersonEncounter> {
  let mut ordered: Vec<&PersonEncounter> = encounters.iter().rev().collect();
  // Stable, so the reversed insertion order survives among equal dates.
  ordered.sort_by(|a, b| b.date_encounter.cmp(&a.date_encounter));
  ordered
}

/// Count and summarise `encounters`, which must be in insertion order.
pub fn aggregate(
  encounters: &[PersonEncounter],
  normalizer: &Normalizer,
) -> EncounterStats {
  let mut stats = EncounterStats {
    total: encounters.len(),
    ..Default::default()
  };

  for e in encounters {
    if e.location_visited {
      stats.visited += 1;
    } else {
      stats.unvisited += 1;
    }
    match e.age_category {
      AgeCategory::Adulte => stats.adults += 1,
      AgeCategory::Enfant => stats.children += 1,
    }
    if e.consent_given {
      stats.with_consent += 1;
    }
    if e.photo.is_some() {
      stats.with_photos += 1;
    }
  }

  stats.recent = by_recency(encounters)
    .into_iter()
    .take(RECENT_LIMIT)
    .map(|e| normalizer.outbound(e))
    .collect();

  stats
}
