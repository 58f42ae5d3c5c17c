//! [`SqliteStore`], the SQLite implementation of [`EncounterStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use outreach_core::{encounter::PersonEncounter, store::EncounterStore};

use crate::{
  Result,
  encode::{ENCOUNTER_COLUMNS, EncounterRow, RawEncounter, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An encounter store backed by a single SQLite file.
///
/// Clones share the same background connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Rebuild the database file.
  #[cfg(test)]
  pub(crate) async fn vacuum(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch("VACUUM")?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── EncounterStore impl ─────────────────────────────────────────────────────

impl EncounterStore for SqliteStore {
  type Error = crate::Error;

  async fn insert_encounter(&self, encounter: PersonEncounter) -> Result<()> {
    let row = EncounterRow::encode(&encounter)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO encounters (
             encounter_id, description, latitude, longitude, gender,
             age_category, date_encounter, location_visited, first_name,
             last_name, consent_given, signature, photo, document,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
          rusqlite::params![
            row.encounter_id,
            row.description,
            row.latitude,
            row.longitude,
            row.gender,
            row.age_category,
            row.date_encounter,
            row.location_visited,
            row.first_name,
            row.last_name,
            row.consent_given,
            row.signature,
            row.photo,
            row.document,
            row.created_at,
            row.updated_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_encounter(&self, id: Uuid) -> Result<Option<PersonEncounter>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawEncounter> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {ENCOUNTER_COLUMNS} FROM encounters WHERE encounter_id = ?1"
              ),
              rusqlite::params![id_str],
              RawEncounter::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEncounter::into_encounter).transpose()
  }

  async fn list_encounters(&self) -> Result<Vec<PersonEncounter>> {
    let raws: Vec<RawEncounter> = self
      .conn
      .call(|conn| {
        // encounter_id is random; seq is never reused or renumbered.
        let mut stmt = conn.prepare(&format!(
          "SELECT {ENCOUNTER_COLUMNS} FROM encounters ORDER BY seq"
        ))?;
        let rows = stmt
          .query_map([], RawEncounter::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEncounter::into_encounter).collect()
  }

  async fn update_encounter(&self, encounter: PersonEncounter) -> Result<bool> {
    let row = EncounterRow::encode(&encounter)?;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE encounters SET
             description = ?2, latitude = ?3, longitude = ?4, gender = ?5,
             age_category = ?6, date_encounter = ?7, location_visited = ?8,
             first_name = ?9, last_name = ?10, consent_given = ?11,
             signature = ?12, photo = ?13, document = ?14, updated_at = ?15
           WHERE encounter_id = ?1",
          rusqlite::params![
            row.encounter_id,
            row.description,
            row.latitude,
            row.longitude,
            row.gender,
            row.age_category,
            row.date_encounter,
            row.location_visited,
            row.first_name,
            row.last_name,
            row.consent_given,
            row.signature,
            row.photo,
            row.document,
            row.updated_at,
          ],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn delete_encounter(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM encounters WHERE encounter_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }
}
