//! [`DiskBlobStore`]: attachment payloads as files in one directory.
//!
//! No binary data lives in the database; a record only carries the
//! [`Attachment`] metadata. Each payload is written once under a fresh UUID
//! and never modified.

use std::{
  io::ErrorKind,
  path::{Path, PathBuf},
};

use bytes::Bytes;
use outreach_core::{
  encounter::{Attachment, Upload},
  store::BlobStore,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{Result, encode::encode_uuid};

#[derive(Debug, Clone)]
pub struct DiskBlobStore {
  root: PathBuf,
}

impl DiskBlobStore {
  /// Use `root` for payloads, creating it if needed.
  pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
    let root = root.as_ref().to_path_buf();
    tokio::fs::create_dir_all(&root).await?;
    Ok(Self { root })
  }

  pub fn root(&self) -> &Path { &self.root }

  fn path_for(&self, key: Uuid) -> PathBuf { self.root.join(encode_uuid(key)) }
}

/// SHA-256 hex digest of `data`.
pub fn checksum(data: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(data);
  hex::encode(hasher.finalize())
}

impl BlobStore for DiskBlobStore {
  type Error = crate::Error;

  async fn put(&self, upload: Upload) -> Result<Attachment> {
    let key = Uuid::new_v4();
    tokio::fs::write(self.path_for(key), &upload.data).await?;

    Ok(Attachment {
      key,
      filename: upload.filename,
      content_type: upload.content_type,
      byte_size: upload.data.len() as u64,
      checksum: checksum(&upload.data),
    })
  }

  async fn read(&self, key: Uuid) -> Result<Option<Bytes>> {
    match tokio::fs::read(self.path_for(key)).await {
      Ok(data) => Ok(Some(Bytes::from(data))),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  async fn remove(&self, key: Uuid) -> Result<()> {
    match tokio::fs::remove_file(self.path_for(key)).await {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e.into()),
    }
  }
}
