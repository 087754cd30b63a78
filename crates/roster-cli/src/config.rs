//! Layered settings: built-in defaults, then an optional TOML file, then
//! `ROSTER_*` environment variables (`__` separates sections, e.g.
//! `ROSTER_SERVICE__API_KEY`).

use std::{path::PathBuf, time::Duration};

use anyhow::Context as _;
use roster_core::merge::MergePolicy;
use roster_enrich::{
  client::{DEFAULT_BASE_URL, ServiceConfig},
  executor::RetryPolicy,
  ingest::IngestOptions,
  orchestrator::PollPolicy,
  pace::Pacing,
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub store_path: PathBuf,
  pub service:    ServiceSettings,
  pub retry:      RetrySettings,
  pub poll:       PollSettings,
  pub sweep:      SweepSettings,
  pub ingest:     IngestSettings,
  pub server:     ServerSettings,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("roster.db"),
      service:    ServiceSettings::default(),
      retry:      RetrySettings::default(),
      poll:       PollSettings::default(),
      sweep:      SweepSettings::default(),
      ingest:     IngestSettings::default(),
      server:     ServerSettings::default(),
    }
  }
}

impl Settings {
  pub fn load(path: PathBuf) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("ROSTER")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise settings")
  }
}

// ─── Sections ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
  pub base_url:     String,
  pub api_key:      String,
  pub timeout_secs: u64,
}

impl Default for ServiceSettings {
  fn default() -> Self {
    Self { base_url: DEFAULT_BASE_URL.to_owned(), api_key: String::new(), timeout_secs: 30 }
  }
}

impl ServiceSettings {
  pub fn to_config(&self) -> ServiceConfig {
    ServiceConfig {
      base_url: self.base_url.clone(),
      api_key:  self.api_key.clone(),
      timeout:  Duration::from_secs(self.timeout_secs),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
  pub max_attempts:      u32,
  pub default_wait_secs: u64,
}

impl Default for RetrySettings {
  fn default() -> Self {
    let policy = RetryPolicy::default();
    Self {
      max_attempts:      policy.max_attempts,
      default_wait_secs: policy.default_wait.as_secs(),
    }
  }
}

impl RetrySettings {
  pub fn policy(&self) -> RetryPolicy {
    RetryPolicy {
      max_attempts: self.max_attempts.max(1),
      default_wait: Duration::from_secs(self.default_wait_secs),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollSettings {
  pub interval_secs: u64,
  pub max_polls:     u32,
}

impl Default for PollSettings {
  fn default() -> Self {
    let policy = PollPolicy::default();
    Self { interval_secs: policy.interval.as_secs(), max_polls: policy.max_polls }
  }
}

impl PollSettings {
  pub fn policy(&self) -> PollPolicy {
    PollPolicy { interval: Duration::from_secs(self.interval_secs), max_polls: self.max_polls }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SweepSettings {
  pub courtesy_delay_secs: u64,
  pub pacing:              Pacing,
  pub limit:               Option<usize>,
}

impl Default for SweepSettings {
  fn default() -> Self {
    Self { courtesy_delay_secs: 2, pacing: Pacing::default(), limit: None }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
  pub enrich:       bool,
  pub merge_policy: MergePolicy,
}

impl Default for IngestSettings {
  fn default() -> Self {
    let options = IngestOptions::default();
    Self { enrich: options.enrich, merge_policy: options.merge_policy }
  }
}

impl IngestSettings {
  pub fn options(&self) -> IngestOptions {
    IngestOptions { enrich: self.enrich, merge_policy: self.merge_policy }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
  pub host: String,
  pub port: u16,
}

impl Default for ServerSettings {
  fn default() -> Self {
    Self { host: "127.0.0.1".to_owned(), port: 8080 }
  }
}
