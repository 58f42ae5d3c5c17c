//! outreach-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! record store and the attachment directory, and serves the JSON API under
//! `/api/v1`.

mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use outreach_core::{normalize::Normalizer, service::EncounterService};
use outreach_store_sqlite::{DiskBlobStore, SqliteStore};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Outreach encounter log server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;
  let blobs = DiskBlobStore::open(&cfg.upload_dir)
    .await
    .with_context(|| format!("failed to open upload dir {:?}", cfg.upload_dir))?;

  let base_url = cfg.api_base_url();
  let service = EncounterService::new(store, blobs, Normalizer::new(&base_url));

  let app = Router::new()
    .nest("/api/v1", outreach_api::api_router(service))
    .layer(TraceLayer::new_for_http());

  let address = cfg.address();
  tracing::info!(%base_url, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
