//! Change notification for viewers of the record set.
//!
//! The [`EncounterService`](crate::service::EncounterService) emits one
//! [`EncounterEvent`] after every successful create, update or delete.
//! Observers must not block; anything slow belongs behind a channel.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum EncounterEvent {
  Created(Uuid),
  Updated(Uuid),
  Deleted(Uuid),
}

impl EncounterEvent {
  pub fn id(&self) -> Uuid {
    match self {
      Self::Created(id) | Self::Updated(id) | Self::Deleted(id) => *id,
    }
  }
}

pub trait EncounterObserver: Send + Sync {
  fn notify(&self, event: &EncounterEvent);
}

/// The list of subscribed observers. Cloning shares the list.
#[derive(Clone, Default)]
pub struct Observers {
  inner: Arc<RwLock<Vec<Arc<dyn EncounterObserver>>>>,
}

impl Observers {
  pub fn subscribe(&self, observer: Arc<dyn EncounterObserver>) {
    self
      .inner
      .write()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .push(observer);
  }

  pub fn len(&self) -> usize {
    self
      .inner
      .read()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  pub fn emit(&self, event: &EncounterEvent) {
    let observers = self
      .inner
      .read()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    for observer in observers.iter() {
      observer.notify(event);
    }
  }
}

impl std::fmt::Debug for Observers {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Observers").field("len", &self.len()).finish()
  }
}
