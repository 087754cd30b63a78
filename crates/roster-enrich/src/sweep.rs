//! The batch sweep: enrich every employee not yet enriched, one at a time.
//!
//! Each success is committed on its own, so an interrupted sweep picks up
//! where it stopped on the next run.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use roster_core::store::RosterStore;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  client::PeopleSearch,
  orchestrator::{Enricher, EnrichmentOutcome},
  pace::{Sleeper, Throttle},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOptions {
  /// Process at most this many records.
  pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
  pub run_id:          Uuid,
  pub started_at:      DateTime<Utc>,
  /// Employees in the store when the sweep started.
  pub total:           u64,
  pub enriched_before: u64,
  pub selected:        usize,
  pub enriched:        u64,
  pub degraded:        u64,
  /// Permanently rejected records among `degraded`.
  pub rejected:        u64,
  pub errors:          u64,
  pub remaining:       u64,
  pub elapsed:         Duration,
}

/// Time left at the observed rate: `remaining × elapsed / done`.
pub fn estimate_remaining(remaining: u64, elapsed: Duration, done: u64) -> Option<Duration> {
  (done > 0).then(|| elapsed.mul_f64(remaining as f64 / done as f64))
}

fn format_eta(eta: Option<Duration>) -> String {
  match eta {
    Some(d) => {
      let secs = d.as_secs();
      format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
    None => "unknown".to_owned(),
  }
}

/// Enrich every unenriched employee in id order.
///
/// Only the initial selection can fail the sweep; a record whose result
/// cannot be persisted is counted in [`SweepReport::errors`] and skipped.
pub async fn run_sweep<St, P, S, T>(
  store: &St,
  enricher: &Enricher<P, S>,
  throttle: &T,
  options: SweepOptions,
) -> Result<SweepReport>
where
  St: RosterStore,
  P: PeopleSearch,
  S: Sleeper,
  T: Throttle,
{
  let counts = store.employee_counts().await.map_err(Error::store)?;
  let pending = store.list_unenriched(options.limit).await.map_err(Error::store)?;

  let mut report = SweepReport {
    run_id:          Uuid::new_v4(),
    started_at:      Utc::now(),
    total:           counts.total,
    enriched_before: counts.enriched,
    selected:        pending.len(),
    enriched:        0,
    degraded:        0,
    rejected:        0,
    errors:          0,
    remaining:       counts.unenriched(),
    elapsed:         Duration::ZERO,
  };
  info!(
    run_id = %report.run_id,
    total = report.total,
    enriched_before = report.enriched_before,
    selected = report.selected,
    "starting enrichment sweep"
  );

  let started = Instant::now();
  for (done, employee) in pending.into_iter().enumerate() {
    throttle.pause().await;

    let employee_id = employee.employee_id;
    let name = employee.record.name.clone();
    match enricher.enrich(employee.record).await {
      EnrichmentOutcome::Enriched(record) => {
        match store.apply_enrichment(employee_id, &record.enrichment).await {
          Ok(()) => report.enriched += 1,
          Err(e) => {
            warn!(employee_id, %name, error = %e, "failed to persist enrichment");
            report.errors += 1;
          }
        }
      }
      EnrichmentOutcome::Degraded { cause, .. } => {
        report.degraded += 1;
        if cause.is_permanent() {
          report.rejected += 1;
        }
      }
    }

    let done = done as u64 + 1;
    report.remaining = report
      .total
      .saturating_sub(report.enriched_before + report.enriched);
    report.elapsed = started.elapsed();
    info!(
      employee_id,
      %name,
      done,
      enriched = report.enriched,
      degraded = report.degraded,
      remaining = report.remaining,
      eta = %format_eta(estimate_remaining(report.remaining, report.elapsed, done)),
      "sweep progress"
    );
  }

  info!(
    run_id = %report.run_id,
    enriched = report.enriched,
    degraded = report.degraded,
    errors = report.errors,
    remaining = report.remaining,
    elapsed_secs = report.elapsed.as_secs(),
    "sweep finished"
  );
  Ok(report)
}
