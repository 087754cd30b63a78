//! `roster`: import, enrich and serve employee/company records.
//!
//! # Usage
//!
//! ```text
//! roster import ./exports/            # every *.csv in the directory
//! roster sweep --limit 100            # enrich what is not yet enriched
//! roster discover "Acme Inc"          # search the service for employees
//! roster serve --port 8080            # read-only JSON API under /api
//! ```
//!
//! Settings come from `roster.toml` (or `--config`) and `ROSTER_*`
//! environment variables.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use roster_core::merge::MergePolicy;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "roster", version, about = "Employee and company identity store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "roster.toml")]
  config: PathBuf,

  /// SQLite database path; overrides `store_path`.
  #[arg(long, value_name = "PATH")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Import a CSV file, or every CSV file in a directory.
  Import {
    path: PathBuf,

    /// Save rows without calling the people-search service.
    #[arg(long)]
    no_enrich: bool,

    /// `prefer_non_empty` or `replace`.
    #[arg(long, value_name = "POLICY")]
    merge_policy: Option<MergePolicy>,
  },

  /// Enrich every employee that is not yet enriched.
  Sweep {
    /// Process at most this many employees.
    #[arg(long)]
    limit: Option<usize>,
  },

  /// Search the service for current employees of a company and ingest them.
  Discover {
    company: String,

    #[arg(long, default_value = "United States")]
    location: String,

    /// 1-based offset into the search results.
    #[arg(long, default_value_t = 1)]
    start: u32,

    #[arg(long, default_value_t = 10)]
    page_size: u32,

    #[arg(long)]
    no_enrich: bool,
  },

  /// Serve the read-only JSON API.
  Serve {
    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,
  },

  /// Print employee and company counts.
  Stats,

  /// List employees of a company.
  Employees { company: String },

  /// List the store's tables and their definitions.
  Tables,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

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

  let mut settings = Settings::load(cli.config)?;
  if let Some(store) = cli.store {
    settings.store_path = store;
  }

  match cli.command {
    Command::Import { path, no_enrich, merge_policy } => {
      if no_enrich {
        settings.ingest.enrich = false;
      }
      if let Some(policy) = merge_policy {
        settings.ingest.merge_policy = policy;
      }
      commands::import(&settings, &path).await
    }
    Command::Sweep { limit } => {
      if limit.is_some() {
        settings.sweep.limit = limit;
      }
      commands::sweep(&settings).await
    }
    Command::Discover { company, location, start, page_size, no_enrich } => {
      if no_enrich {
        settings.ingest.enrich = false;
      }
      commands::discover(&settings, company, location, start, page_size).await
    }
    Command::Serve { host, port } => {
      if let Some(host) = host {
        settings.server.host = host;
      }
      if let Some(port) = port {
        settings.server.port = port;
      }
      commands::serve(&settings).await
    }
    Command::Stats => commands::stats(&settings).await,
    Command::Employees { company } => commands::employees(&settings, &company).await,
    Command::Tables => commands::tables(&settings).await,
  }
}
