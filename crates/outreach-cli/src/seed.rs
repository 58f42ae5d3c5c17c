//! Sample encounters around Paris for development servers.
//!
//! Generation is deterministic: the same `count` and `today` always produce
//! the same records.

use chrono::{Days, NaiveDate};
use outreach_core::{
  encounter::{AgeCategory, Gender},
  wire::PersonParams,
};

/// `(latitude, longitude, area)` anchors.
pub const LOCATIONS: &[(f64, f64, &str)] = &[
  (48.8566, 2.3522, "Centre de Paris"),
  (48.8738, 2.2950, "Arc de Triomphe"),
  (48.8584, 2.2945, "Tour Eiffel"),
  (48.8606, 2.3376, "Louvre"),
  (48.8529, 2.3500, "Notre-Dame"),
  (48.8767, 2.3097, "Montmartre"),
  (48.8449, 2.3750, "Bastille"),
  (48.8590, 2.3890, "République"),
  (48.8415, 2.3730, "Gare de Lyon"),
  (48.8848, 2.3434, "Gare du Nord"),
];

pub const DESCRIPTIONS: &[&str] = &[
  "Homme âgé, vêtu d'un manteau marron, assis près de l'entrée du métro",
  "Femme avec un chien, sac de couchage bleu, demande de l'aide",
  "Personne jeune, cheveux longs, guitare, joue de la musique",
  "Homme avec une pancarte, veste noire déchirée, très maigre",
  "Femme âgée, chariot avec affaires personnelles, paraît malade",
  "Jeune homme, baskets usées, sweat à capuche gris",
  "Personne avec plusieurs sacs plastique, dort sous un carton",
  "Homme barbu, couverture rouge, accompagné d'un chat",
  "Femme enceinte, paraît très fatiguée, assise sur un banc",
  "Adolescent, sac à dos déchiré, demande de la nourriture",
];

/// Encounter dates fall within this many days before `today`.
pub const DAY_SPAN: u64 = 30;

/// Offset in degrees, within ±0.005, derived from `i` and `salt`.
fn jitter(i: usize, salt: usize) -> f64 {
  let step = (i * 7 + salt * 13) % 11;
  (step as f64 - 5.0) * 0.001
}

/// `count` encounters spread over [`LOCATIONS`], cycling through every
/// gender and age category.
pub fn sample_people(count: usize, today: NaiveDate) -> Vec<PersonParams> {
  (0..count)
    .map(|i| {
      let (lat, lng, _) = LOCATIONS[(i * 3) % LOCATIONS.len()];
      let gender = Gender::ALL[i % Gender::ALL.len()];
      let age = AgeCategory::ALL[(i / 3) % AgeCategory::ALL.len()];
      let days_ago = (i as u64 * 11) % DAY_SPAN;
      let date = today.checked_sub_days(Days::new(days_ago)).unwrap_or(today);

      PersonParams {
        description: Some(DESCRIPTIONS[(i * 7) % DESCRIPTIONS.len()].into()),
        latitude: Some((lat + jitter(i, 1)).into()),
        longitude: Some((lng + jitter(i, 2)).into()),
        gender: Some(gender.as_str().into()),
        age_category: Some(age.as_str().into()),
        date_encounter: Some(date.to_string().into()),
        location_visited: Some((i % 2 == 0).into()),
        ..PersonParams::default()
      }
    })
    .collect()
}
