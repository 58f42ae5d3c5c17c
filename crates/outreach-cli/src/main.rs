//! `outreach`: command-line client for the outreach encounter log.
//!
//! # Usage
//!
//! ```
//! outreach --url http://localhost:3000 list --unvisited
//! outreach --config ~/.config/outreach/config.toml stats
//! ```

mod client;
mod seed;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, ListQuery};
use outreach_core::{
  encounter::{AgeCategory, Gender},
  wire::{DashboardStats, PersonRecord},
};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const DEFAULT_URL: &str = "http://localhost:3000";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "outreach", about = "Client for the outreach encounter log")]
struct Args {
  /// Path to a TOML config file (url).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the outreach server (default: http://localhost:3000).
  #[arg(long, env = "OUTREACH_URL")]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List encounters, most recent first.
  List {
    #[arg(long)]
    gender:       Option<Gender>,
    #[arg(long)]
    age_category: Option<AgeCategory>,
    /// Only locations already visited.
    #[arg(long, conflicts_with = "unvisited")]
    visited:      bool,
    /// Only locations still to visit.
    #[arg(long)]
    unvisited:    bool,
    /// Earliest encounter date (YYYY-MM-DD).
    #[arg(long)]
    from:         Option<NaiveDate>,
    /// Latest encounter date (YYYY-MM-DD).
    #[arg(long)]
    to:           Option<NaiveDate>,
  },
  /// Show one encounter in full.
  Show { id: Uuid },
  /// Print dashboard statistics.
  Stats,
  /// Mark an encounter's location as visited.
  Visit {
    id:   Uuid,
    /// Clear the flag instead.
    #[arg(long)]
    undo: bool,
  },
  /// Delete an encounter and its attachments.
  Delete { id: Uuid },
  /// Create sample encounters around Paris.
  Seed {
    #[arg(long, default_value_t = 15)]
    count: usize,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
  };
  let client = ApiClient::new(api_config)?;

  match args.command {
    Command::List { gender, age_category, visited, unvisited, from, to } => {
      let query = ListQuery {
        gender,
        age_category,
        location_visited: (visited || unvisited).then_some(visited),
        date_from: from,
        date_to: to,
      };
      let listing = client.list_persons(&query).await?;
      if listing.placeholder {
        println!("(serveur injoignable : données de démonstration)");
      }
      for record in &listing.records {
        println!("{}", summary_line(record));
      }
    }
    Command::Show { id } => print_record(&client.get_person(id).await?),
    Command::Stats => print_stats(&client.stats().await?),
    Command::Visit { id, undo } => {
      let record = client.set_visited(id, !undo).await?;
      println!("{}", summary_line(&record));
    }
    Command::Delete { id } => {
      client.delete_person(id).await?;
      println!("{id} supprimé");
    }
    Command::Seed { count } => {
      let today = Utc::now().date_naive();
      for params in seed::sample_people(count, today) {
        let record = client.create_person(&params).await?;
        println!("{}", summary_line(&record));
      }
      print_stats(&client.stats().await?);
    }
  }

  Ok(())
}

// ─── Output ───────────────────────────────────────────────────────────────────

fn summary_line(r: &PersonRecord) -> String {
  let visited = if r.location_visited { "✓" } else { "·" };
  let mut description: String = r.description.chars().take(48).collect();
  if r.description.chars().count() > 48 {
    description.push('…');
  }
  format!(
    "{} {} {:<12} {:<7} {visited} {:<24} {description}",
    r.id, r.date_encounter, r.gender, r.age_category, r.full_name,
  )
}

fn print_record(r: &PersonRecord) {
  println!("{}", r.full_name);
  println!("  id           {}", r.id);
  println!("  date         {}", r.date_encounter);
  println!("  position     {:.5}, {:.5}", r.latitude, r.longitude);
  println!("  genre        {}", r.gender);
  println!("  âge          {}", r.age_category);
  println!("  lieu visité  {}", if r.location_visited { "oui" } else { "non" });
  println!("  consentement {}", if r.consent_given { "oui" } else { "non" });
  println!("  description  {}", r.description);
  if let Some(url) = &r.photo_url {
    println!("  photo        {url}");
  }
  if let Some(url) = &r.document_url {
    println!("  document     {url}");
  }
}

fn print_stats(s: &DashboardStats) {
  println!("Personnes rencontrées : {}", s.total_persons);
  println!("- Adultes             : {}", s.adults_count);
  println!("- Enfants             : {}", s.children_count);
  println!("- Lieux visités       : {}", s.visited_locations);
  println!("- Lieux non visités   : {}", s.unvisited_locations);
  println!("- Avec consentement   : {}", s.with_consent_count);
  println!("- Avec photo          : {}", s.with_photos_count);
  if !s.recent_encounters.is_empty() {
    println!("Rencontres récentes :");
    for r in &s.recent_encounters {
      println!("  {}", summary_line(r));
    }
  }
}
