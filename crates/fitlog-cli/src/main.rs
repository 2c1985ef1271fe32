//! `fitlog`: command-line client for a fitlog server.
//!
//! # Usage
//!
//! ```text
//! fitlog log --weight 180.5 --steps 9500 --eating 0.8 --protein 150 --lifted
//! fitlog history --metric weight
//! fitlog --url http://nas.local:8000 history
//! ```

mod client;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use client::{ApiClient, Submission};
use fitlog_core::{Error, entry::NewEntry, metric::Metric, validate};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:8000";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "fitlog", about = "Log and review daily fitness metrics")]
struct Args {
  /// Path to a TOML config file (url).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the fitlog server (default: http://localhost:8000).
  #[arg(long, env = "FITLOG_URL")]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Record one day's measurements.
  Log {
    /// Body weight in lbs.
    #[arg(long)]
    weight:  f64,
    #[arg(long)]
    steps:   u32,
    /// Clean-eating self-rating, 0 to 1.
    #[arg(long)]
    eating:  f64,
    /// Protein eaten, in grams.
    #[arg(long)]
    protein: u32,
    /// Lifted weights or stretched today.
    #[arg(long)]
    lifted:  bool,
    /// Day to log, YYYY-MM-DD (default: today).
    #[arg(long)]
    date:    Option<NaiveDate>,
  },

  /// Show one metric over time, oldest first.
  History {
    #[arg(long, default_value_t = Metric::Composite)]
    metric: Metric,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url: String,
}

/// CLI flag, then config file, then [`DEFAULT_URL`].
fn resolve_url(flag: Option<String>, file: &ConfigFile) -> String {
  flag
    .or_else(|| (!file.url.is_empty()).then(|| file.url.clone()))
    .unwrap_or_else(|| DEFAULT_URL.to_string())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let client = ApiClient::new(resolve_url(args.url, &file_cfg))?;

  match args.command {
    Command::Log { weight, steps, eating, protein, lifted, date } => {
      let candidate = NewEntry {
        date: date.unwrap_or_else(|| Local::now().date_naive()),
        weight,
        steps,
        clean_eating_score: eating,
        protein_grams: protein,
        lifted_or_stretched: lifted,
        protein_percentage: None,
        composite_score: None,
      };
      log(&client, candidate).await
    }
    Command::History { metric } => {
      let entries = client.list_entries().await?;
      print!("{}", render::history(metric, &entries));
      Ok(())
    }
  }
}

// ─── Commands ─────────────────────────────────────────────────────────────────

async fn log(client: &ApiClient, candidate: NewEntry) -> Result<()> {
  // Checked locally with the same rules the server applies.
  let body = serde_json::to_value(&candidate).context("encoding entry")?;
  let candidate = match validate::validate_today(&body) {
    Ok(entry) => entry.with_derived_fields(),
    Err(Error::Validation(errors)) => {
      eprintln!("Validation failed");
      for (field, message) in errors.iter() {
        eprintln!("  {field}: {message}");
      }
      bail!("entry not submitted");
    }
    Err(e) => return Err(e.into()),
  };

  match client.submit_entry(&candidate).await? {
    Submission::Stored(entry) => {
      print!("{}", render::entry(&entry));
      Ok(())
    }
    Submission::Rejected { status, error, details } => {
      eprintln!("{error}");
      for (field, message) in &details {
        eprintln!("  {field}: {message}");
      }
      bail!("server rejected entry ({status})");
    }
  }
}
