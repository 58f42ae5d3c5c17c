//! Server configuration: an optional TOML file layered under `OUTREACH_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

/// Runtime server configuration. Every key is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  /// Externally visible origin used in attachment URLs. Defaults to
  /// `http://{host}:{port}`.
  pub public_url: Option<String>,
  pub store_path: PathBuf,
  /// Directory holding attachment payloads.
  pub upload_dir: PathBuf,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       3000,
      public_url: None,
      store_path: PathBuf::from("outreach.db"),
      upload_dir: PathBuf::from("uploads"),
    }
  }
}

impl ServerConfig {
  /// Read `path` if it exists, then apply environment overrides such as
  /// `OUTREACH_PORT=8080`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("OUTREACH"))
      .build()
      .context("failed to read config file")?;

    let mut cfg: ServerConfig = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    cfg.upload_dir = expand_tilde(&cfg.upload_dir);
    Ok(cfg)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// Root of the mounted API, without a trailing slash.
  pub fn api_base_url(&self) -> String {
    let origin = self
      .public_url
      .clone()
      .unwrap_or_else(|| format!("http://{}", self.address()));
    format!("{}/api/v1", origin.trim_end_matches('/'))
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
