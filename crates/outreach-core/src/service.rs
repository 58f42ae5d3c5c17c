//! [`EncounterService`]: validate → persist → normalize.
//!
//! Each operation runs the inbound normalizer, builds a complete draft,
//! validates it, and only then touches storage. A request that fails
//! validation has no side effects at all.
//!
//! Attachment payloads are written after validation and before the record.
//! If the record write fails the fresh payloads are removed again; if a
//! payload write fails the record is never written.

use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  draft::{EncounterDraft, EncounterPatch},
  encounter::{Attachment, AttachmentKind, PersonEncounter, Upload},
  events::{EncounterEvent, Observers},
  normalize::Normalizer,
  stats::{self, EncounterStats},
  store::{BlobStore, EncounterFilter, EncounterStore},
  validate::{ValidEncounter, check_uploads, validate},
  wire::{EncounterInput, PersonRecord},
};

pub struct EncounterService<S, B> {
  store:      S,
  blobs:      B,
  normalizer: Normalizer,
  observers:  Observers,
}

impl<S, B> EncounterService<S, B>
where
  S: EncounterStore,
  B: BlobStore,
{
  pub fn new(store: S, blobs: B, normalizer: Normalizer) -> Self {
    Self {
      store,
      blobs,
      normalizer,
      observers: Observers::default(),
    }
  }

  pub fn normalizer(&self) -> &Normalizer { &self.normalizer }

  pub fn observers(&self) -> &Observers { &self.observers }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Records matching `filter`, most recent encounter first.
  pub async fn list(&self, filter: &EncounterFilter) -> Result<Vec<PersonRecord>> {
    let all = self.store.list_encounters().await.map_err(Error::upstream)?;
    Ok(
      stats::by_recency(&all)
        .into_iter()
        .filter(|e| filter.matches(e))
        .map(|e| self.normalizer.outbound(e))
        .collect(),
    )
  }

  pub async fn get(&self, id: Uuid) -> Result<PersonRecord> {
    let encounter = self.find(id).await?;
    Ok(self.normalizer.outbound(&encounter))
  }

  pub async fn stats(&self) -> Result<EncounterStats> {
    let all = self.store.list_encounters().await.map_err(Error::upstream)?;
    Ok(stats::aggregate(&all, &self.normalizer))
  }

  /// Metadata and payload of one of a record's attachments.
  pub async fn attachment(
    &self,
    id: Uuid,
    kind: AttachmentKind,
  ) -> Result<(Attachment, Bytes)> {
    let encounter = self.find(id).await?;
    let attachment = encounter
      .attachment(kind)
      .cloned()
      .ok_or(Error::AttachmentNotFound { id, kind })?;
    let data = self
      .blobs
      .read(attachment.key)
      .await
      .map_err(Error::upstream)?
      .ok_or(Error::AttachmentNotFound { id, kind })?;
    Ok((attachment, data))
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  pub async fn create(&self, input: EncounterInput) -> Result<PersonRecord> {
    let mut patch = self.normalizer.inbound(input);
    let now = Utc::now();
    let draft = EncounterDraft::with_defaults(&patch, now.date_naive());
    let valid = check(&draft, &patch)?;

    let (photo, document) = self
      .store_uploads(patch.photo.take(), patch.document.take())
      .await?;
    let encounter =
      valid.into_encounter(Uuid::new_v4(), now, now, photo, document);

    if let Err(e) = self.store.insert_encounter(encounter.clone()).await {
      self.discard(encounter.attachment_keys()).await;
      return Err(Error::upstream(e));
    }

    info!(id = %encounter.id, "encounter created");
    self.observers.emit(&EncounterEvent::Created(encounter.id));
    Ok(self.normalizer.outbound(&encounter))
  }

  /// Merge the supplied fields onto the stored record. Fields the client did
  /// not send keep their current values.
  pub async fn update(
    &self,
    id: Uuid,
    input: EncounterInput,
  ) -> Result<PersonRecord> {
    let existing = self.find(id).await?;
    let mut patch = self.normalizer.inbound(input);
    let mut draft = EncounterDraft::from_existing(&existing);
    draft.apply(&patch);
    let valid = check(&draft, &patch)?;

    let (new_photo, new_document) = self
      .store_uploads(patch.photo.take(), patch.document.take())
      .await?;
    let fresh: Vec<Uuid> = new_photo
      .iter()
      .chain(new_document.iter())
      .map(|a| a.key)
      .collect();

    let mut replaced = Vec::new();
    let photo = keep_or_replace(existing.photo, new_photo, &mut replaced);
    let document =
      keep_or_replace(existing.document, new_document, &mut replaced);
    let encounter = valid.into_encounter(
      id,
      existing.created_at,
      Utc::now(),
      photo,
      document,
    );

    match self.store.update_encounter(encounter.clone()).await {
      Ok(true) => {}
      Ok(false) => {
        self.discard(fresh).await;
        return Err(Error::NotFound(id));
      }
      Err(e) => {
        self.discard(fresh).await;
        return Err(Error::upstream(e));
      }
    }
    self.discard(replaced).await;

    info!(%id, "encounter updated");
    self.observers.emit(&EncounterEvent::Updated(id));
    Ok(self.normalizer.outbound(&encounter))
  }

  /// Remove a record and its attachment payloads. Deleting an id that does
  /// not exist (including one deleted a moment ago) is [`Error::NotFound`].
  pub async fn delete(&self, id: Uuid) -> Result<()> {
    let existing = self.find(id).await?;
    let removed = self
      .store
      .delete_encounter(id)
      .await
      .map_err(Error::upstream)?;
    if !removed {
      return Err(Error::NotFound(id));
    }
    self.discard(existing.attachment_keys()).await;

    info!(%id, "encounter deleted");
    self.observers.emit(&EncounterEvent::Deleted(id));
    Ok(())
  }

  // ── Helpers ───────────────────────────────────────────────────────────────

  async fn find(&self, id: Uuid) -> Result<PersonEncounter> {
    self
      .store
      .get_encounter(id)
      .await
      .map_err(Error::upstream)?
      .ok_or(Error::NotFound(id))
  }

  async fn store_uploads(
    &self,
    photo: Option<Upload>,
    document: Option<Upload>,
  ) -> Result<(Option<Attachment>, Option<Attachment>)> {
    let photo = match photo {
      Some(upload) => {
        Some(self.blobs.put(upload).await.map_err(Error::upstream)?)
      }
      None => None,
    };
    let document = match document {
      Some(upload) => match self.blobs.put(upload).await {
        Ok(attachment) => Some(attachment),
        Err(e) => {
          self.discard(photo.iter().map(|a| a.key).collect()).await;
          return Err(Error::upstream(e));
        }
      },
      None => None,
    };
    Ok((photo, document))
  }

  /// Best-effort payload removal; failures only leave orphaned files.
  async fn discard(&self, keys: Vec<Uuid>) {
    for key in keys {
      if let Err(e) = self.blobs.remove(key).await {
        warn!(%key, error = %e, "failed to remove attachment payload");
      }
    }
  }
}

fn check(draft: &EncounterDraft, patch: &EncounterPatch) -> Result<ValidEncounter> {
  let mut errors = check_uploads(patch);
  match validate(draft) {
    Ok(valid) if errors.is_empty() => Ok(valid),
    Ok(_) => Err(Error::ValidationFailed(errors)),
    Err(record_errors) => {
      errors.merge(record_errors);
      Err(Error::ValidationFailed(errors))
    }
  }
}

fn keep_or_replace(
  current: Option<Attachment>,
  incoming: Option<Attachment>,
  replaced: &mut Vec<Uuid>,
) -> Option<Attachment> {
  match incoming {
    Some(new) => {
      replaced.extend(current.map(|old| old.key));
      Some(new)
    }
    None => current,
  }
}
