//! Subcommand implementations.

use std::{path::Path, sync::Arc, time::Duration};

use anyhow::{Context as _, bail, ensure};
use roster_api::stats::Stats;
use roster_core::store::{CompanyStore as _, RosterStore as _};
use roster_enrich::{
  client::{EmployerSearch, HttpPeopleSearch},
  executor::RetryExecutor,
  ingest::Ingestor,
  orchestrator::Enricher,
  pace::TokioSleeper,
  sweep::{SweepOptions, run_sweep},
};
use roster_store_sqlite::SqliteStore;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Settings;

async fn open_store(settings: &Settings) -> anyhow::Result<SqliteStore> {
  let path = expand_tilde(&settings.store_path);
  SqliteStore::open(&path)
    .await
    .with_context(|| format!("failed to open store at {path:?}"))
}

fn enricher(settings: &Settings) -> anyhow::Result<Enricher<HttpPeopleSearch>> {
  let executor = RetryExecutor::new(settings.retry.policy(), TokioSleeper);
  let search = HttpPeopleSearch::new(settings.service.to_config(), executor)
    .context("failed to build HTTP client")?;
  Ok(Enricher::new(search, TokioSleeper, settings.poll.policy()))
}

fn has_api_key(settings: &Settings) -> bool { !settings.service.api_key.trim().is_empty() }

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

// ─── Ingestion ───────────────────────────────────────────────────────────────

pub async fn import(settings: &Settings, path: &Path) -> anyhow::Result<()> {
  let store = open_store(settings).await?;
  let enricher = enricher(settings)?;

  let mut options = settings.ingest.options();
  if options.enrich && !has_api_key(settings) {
    warn!("no service API key configured; importing without enrichment");
    options.enrich = false;
  }

  let ingestor = Ingestor::new(&store, &enricher, options);
  let result = if path.is_dir() {
    ingestor.ingest_dir(path).await
  } else if path.is_file() {
    ingestor.ingest_file(path).await
  } else {
    bail!("{} is neither a file nor a directory", path.display());
  };
  let report = result.with_context(|| format!("failed to import {}", path.display()))?;

  print_json(&report)
}

pub async fn discover(
  settings: &Settings,
  company: String,
  location: String,
  start: u32,
  page_size: u32,
) -> anyhow::Result<()> {
  ensure!(has_api_key(settings), "discovery needs `service.api_key` (ROSTER_SERVICE__API_KEY)");
  let store = open_store(settings).await?;
  let enricher = enricher(settings)?;

  let location = Some(location).filter(|l| !l.trim().is_empty());
  let search = EmployerSearch { company, location, start, page_size };
  let report = Ingestor::new(&store, &enricher, settings.ingest.options())
    .discover(&search)
    .await
    .with_context(|| format!("employer search for {:?} failed", search.company))?;

  print_json(&report)
}

// ─── Enrichment ──────────────────────────────────────────────────────────────

pub async fn sweep(settings: &Settings) -> anyhow::Result<()> {
  ensure!(has_api_key(settings), "the sweep needs `service.api_key` (ROSTER_SERVICE__API_KEY)");
  let store = open_store(settings).await?;
  let enricher = enricher(settings)?;
  let throttle = settings
    .sweep
    .pacing
    .throttle(Duration::from_secs(settings.sweep.courtesy_delay_secs), TokioSleeper);

  let options = SweepOptions { limit: settings.sweep.limit };
  let report = run_sweep(&store, &enricher, &throttle, options)
    .await
    .context("enrichment sweep failed")?;

  print_json(&report)
}

// ─── Queries ─────────────────────────────────────────────────────────────────

pub async fn stats(settings: &Settings) -> anyhow::Result<()> {
  let store = open_store(settings).await?;
  let counts = store.employee_counts().await?;
  let companies = store.list_companies().await?.len();
  print_json(&Stats {
    companies,
    employees: counts.total,
    enriched: counts.enriched,
    unenriched: counts.unenriched(),
  })
}

pub async fn employees(settings: &Settings, company: &str) -> anyhow::Result<()> {
  let store = open_store(settings).await?;
  let Some(found) = store.find_company_by_name(company.trim()).await? else {
    bail!("company {company:?} not found");
  };
  let employees = store.employees_for_company(&found).await?;
  info!(company = %found.name, count = employees.len(), "employees found");
  print_json(&employees)
}

pub async fn tables(settings: &Settings) -> anyhow::Result<()> {
  let store = open_store(settings).await?;
  print_json(&store.list_tables().await?)
}

// ─── Server ──────────────────────────────────────────────────────────────────

pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
  let store = Arc::new(open_store(settings).await?);

  let app = axum::Router::new()
    .nest("/api", roster_api::api_router(store))
    .layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", settings.server.host, settings.server.port);

  info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> std::path::PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return std::path::PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
