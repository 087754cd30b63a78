//! Per-employee enrichment: one lookup, then polling until the service
//! reaches a terminal status.
//!
//! ```text
//! Pending ──lookup──▶ LookupSent ──▶ Polling ──▶ Complete
//!                         │             │    └──▶ Failed
//!                         └─────────────┴──────▶ Degraded
//! ```
//!
//! The orchestrator never fails: every error is folded into
//! [`EnrichmentOutcome::Degraded`] with the input record intact.

use std::{fmt, time::Duration};

use roster_core::{employee::EmployeeRecord, merge::merge_employee};
use tracing::{debug, warn};

use crate::{
  Error,
  client::{LookupQuery, LookupStatus, PeopleSearch, Profile},
  pace::{Sleeper, TokioSleeper},
};

/// Polling cadence and budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
  pub interval:  Duration,
  pub max_polls: u32,
}

impl Default for PollPolicy {
  fn default() -> Self {
    Self { interval: Duration::from_secs(5), max_polls: 120 }
  }
}

/// Why an enrichment attempt did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeCause {
  /// The lookup response carried no profile identifier.
  NoProfileId,
  /// The service reported a terminal non-complete status.
  TerminalStatus(String),
  /// The poll budget ran out before a terminal status.
  PollBudgetExhausted { polls: u32 },
  /// The service kept answering 429.
  RateLimited { attempts: u32 },
  /// Transport failure, unexpected status or malformed payload.
  Service(String),
}

impl DegradeCause {
  /// `true` when retrying the same record later is pointless.
  pub fn is_permanent(&self) -> bool {
    matches!(self, Self::NoProfileId | Self::TerminalStatus(_))
  }
}

impl fmt::Display for DegradeCause {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::NoProfileId => f.write_str("no profile id returned"),
      Self::TerminalStatus(s) => write!(f, "lookup ended with status {s}"),
      Self::PollBudgetExhausted { polls } => write!(f, "no result after {polls} polls"),
      Self::RateLimited { attempts } => write!(f, "rate limited after {attempts} attempts"),
      Self::Service(msg) => f.write_str(msg),
    }
  }
}

impl From<Error> for DegradeCause {
  fn from(e: Error) -> Self {
    match e {
      Error::RetryExhausted { attempts, .. } => Self::RateLimited { attempts },
      other => Self::Service(other.to_string()),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentOutcome {
  Enriched(EmployeeRecord),
  /// The input record with `is_enriched = false`.
  Degraded { record: EmployeeRecord, cause: DegradeCause },
}

impl EnrichmentOutcome {
  pub fn into_record(self) -> EmployeeRecord {
    match self {
      Self::Enriched(record) | Self::Degraded { record, .. } => record,
    }
  }

  pub fn is_enriched(&self) -> bool { matches!(self, Self::Enriched(_)) }
}

// ─── Enricher ────────────────────────────────────────────────────────────────

/// Drives the lookup/poll protocol against a [`PeopleSearch`] service.
pub struct Enricher<P, S = TokioSleeper> {
  search:  P,
  sleeper: S,
  poll:    PollPolicy,
}

impl<P: PeopleSearch, S: Sleeper> Enricher<P, S> {
  pub fn new(search: P, sleeper: S, poll: PollPolicy) -> Self {
    Self { search, sleeper, poll }
  }

  pub fn search(&self) -> &P { &self.search }

  pub async fn enrich(&self, record: EmployeeRecord) -> EnrichmentOutcome {
    debug!(profile_url = %record.profile_url, state = "pending");
    match self.fetch_profile(&record).await {
      Ok(profile) => {
        debug!(profile_url = %record.profile_url, state = "complete");
        EnrichmentOutcome::Enriched(apply_profile(&record, profile))
      }
      Err(cause) => {
        warn!(
          name = %record.name,
          profile_url = %record.profile_url,
          permanent = cause.is_permanent(),
          %cause,
          "enrichment degraded"
        );
        let mut record = record;
        record.is_enriched = false;
        EnrichmentOutcome::Degraded { record, cause }
      }
    }
  }

  async fn fetch_profile(&self, record: &EmployeeRecord) -> Result<Profile, DegradeCause> {
    let query = LookupQuery::for_record(record);
    let mut profile = self.search.lookup(&query).await?;
    let id = profile.id.ok_or(DegradeCause::NoProfileId)?;
    debug!(id, state = "lookup_sent");

    let mut polls = 0;
    loop {
      match profile.lookup_status() {
        LookupStatus::Complete => return Ok(profile),
        LookupStatus::Failed(status) => return Err(DegradeCause::TerminalStatus(status)),
        LookupStatus::InProgress(status) => {
          debug!(id, polls, status = status.as_deref().unwrap_or("unknown"), state = "polling");
        }
      }
      if polls >= self.poll.max_polls {
        return Err(DegradeCause::PollBudgetExhausted { polls });
      }

      self.sleeper.sleep(self.poll.interval).await;
      polls += 1;
      match self.search.check_status(&[id]).await?.find(id) {
        Some(next) => profile = next,
        None => profile.status = None,
      }
    }
  }
}

/// Merge a completed profile into `record`. Identity fields stay as the
/// record has them.
fn apply_profile(record: &EmployeeRecord, profile: Profile) -> EmployeeRecord {
  let mut incoming = profile.into_record();
  incoming.profile_url.clear();
  incoming.name.clear();
  incoming.is_enriched = true;

  let mut merged = merge_employee(record, incoming);
  merged.is_enriched = true;
  merged
}

#[cfg(test)]
mod tests {
  use roster_core::employee::{Education, JobHistoryEntry};

  use super::*;
  use crate::{
    client::StatusResponse,
    test_support::{RecordingSleeper, ScriptedSearch, profile},
  };

  fn jane() -> EmployeeRecord {
    let mut rec = EmployeeRecord::new("https://linkedin.com/in/jdoe", "Jane Doe");
    rec.current_company = Some("Acme Inc".into());
    rec.title = Some("Engineer".into());
    rec
  }

  fn enricher(
    search: ScriptedSearch,
    sleeper: &RecordingSleeper,
    max_polls: u32,
  ) -> Enricher<ScriptedSearch, RecordingSleeper> {
    let poll = PollPolicy { max_polls, ..PollPolicy::default() };
    Enricher::new(search, sleeper.clone(), poll)
  }

  fn completed() -> Profile {
    Profile {
      education: vec![Education { school: Some("MIT".into()), ..Education::default() }],
      job_history: vec![JobHistoryEntry {
        company_name: Some("Acme Inc".into()),
        is_current: true,
        ..JobHistoryEntry::default()
      }],
      skills: vec!["Rust".into()],
      city: Some("Boston".into()),
      name: Some("J. Doe".into()),
      linkedin_url: Some("https://linkedin.com/in/other".into()),
      ..profile(7, "complete")
    }
  }

  #[tokio::test]
  async fn complete_lookup_skips_polling() {
    let search = ScriptedSearch::new(|_| Ok(completed()));
    let sleeper = RecordingSleeper::default();
    let outcome = enricher(search, &sleeper, 120).enrich(jane()).await;

    let EnrichmentOutcome::Enriched(rec) = outcome else { panic!("expected enriched") };
    assert!(rec.is_enriched);
    assert_eq!(rec.enrichment.skills, vec!["Rust"]);
    assert_eq!(rec.location.city.as_deref(), Some("Boston"));
    assert_eq!(rec.name, "Jane Doe");
    assert_eq!(rec.profile_url, "https://linkedin.com/in/jdoe");
    assert_eq!(rec.title.as_deref(), Some("Engineer"));
    assert!(sleeper.waits().is_empty());
  }

  #[tokio::test]
  async fn polls_until_complete() {
    let search = ScriptedSearch::new(|_| Ok(profile(7, "searching")))
      .with_status(Ok(StatusResponse::Many(vec![profile(7, "progress")])))
      .with_status(Ok(StatusResponse::Many(vec![profile(3, "complete"), completed()])));
    let sleeper = RecordingSleeper::default();
    let e = enricher(search, &sleeper, 120);
    let outcome = e.enrich(jane()).await;

    assert!(outcome.is_enriched());
    assert_eq!(sleeper.waits(), vec![Duration::from_secs(5); 2]);
    assert_eq!(e.search().status_calls(), 2);
  }

  #[tokio::test]
  async fn completed_status_with_null_fields_enriches() {
    let status: StatusResponse = serde_json::from_str(
      r#"[{"id": 7, "status": "complete", "skills": ["Rust", null],
           "job_history": [{"company_name": "Acme", "is_current": null}]}]"#,
    )
    .unwrap();
    let search =
      ScriptedSearch::new(|_| Ok(profile(7, "searching"))).with_status(Ok(status));
    let sleeper = RecordingSleeper::default();
    let outcome = enricher(search, &sleeper, 120).enrich(jane()).await;

    let EnrichmentOutcome::Enriched(rec) = outcome else { panic!("expected enriched") };
    assert_eq!(rec.enrichment.skills, vec!["Rust"]);
    assert_eq!(rec.enrichment.job_history.len(), 1);
    assert!(!rec.enrichment.job_history[0].is_current);
  }

  #[tokio::test]
  async fn missing_id_degrades_permanently() {
    let search = ScriptedSearch::new(|_| Ok(Profile { status: Some("complete".into()), ..Profile::default() }));
    let sleeper = RecordingSleeper::default();
    let outcome = enricher(search, &sleeper, 120).enrich(jane()).await;

    let EnrichmentOutcome::Degraded { record, cause } = outcome else { panic!("expected degraded") };
    assert_eq!(cause, DegradeCause::NoProfileId);
    assert!(cause.is_permanent());
    assert_eq!(record, jane());
  }

  #[tokio::test]
  async fn failed_status_degrades() {
    let search = ScriptedSearch::new(|_| Ok(profile(7, "searching")))
      .with_status(Ok(StatusResponse::One(Box::new(profile(7, "failed")))));
    let sleeper = RecordingSleeper::default();
    let outcome = enricher(search, &sleeper, 120).enrich(jane()).await;

    let EnrichmentOutcome::Degraded { cause, .. } = outcome else { panic!("expected degraded") };
    assert_eq!(cause, DegradeCause::TerminalStatus("failed".into()));
  }

  #[tokio::test]
  async fn lookup_error_returns_input_unchanged() {
    let search = ScriptedSearch::new(|_| {
      Err(Error::Status {
        endpoint: "/person/lookup".into(),
        status:   reqwest::StatusCode::INTERNAL_SERVER_ERROR,
      })
    });
    let sleeper = RecordingSleeper::default();
    let mut input = jane();
    input.is_enriched = true;
    let outcome = enricher(search, &sleeper, 120).enrich(input).await;

    let EnrichmentOutcome::Degraded { record, cause } = outcome else { panic!("expected degraded") };
    assert!(!cause.is_permanent());
    assert!(!record.is_enriched);
    assert_eq!(record, jane());
  }

  #[tokio::test]
  async fn rate_limit_exhaustion_is_retryable() {
    let search = ScriptedSearch::new(|_| {
      Err(Error::RetryExhausted { endpoint: "/person/lookup".into(), attempts: 5 })
    });
    let sleeper = RecordingSleeper::default();
    let outcome = enricher(search, &sleeper, 120).enrich(jane()).await;

    let EnrichmentOutcome::Degraded { cause, .. } = outcome else { panic!("expected degraded") };
    assert_eq!(cause, DegradeCause::RateLimited { attempts: 5 });
    assert!(!cause.is_permanent());
  }

  #[tokio::test]
  async fn poll_budget_exhaustion_degrades() {
    let search = ScriptedSearch::new(|_| Ok(profile(7, "searching")));
    let sleeper = RecordingSleeper::default();
    let e = enricher(search, &sleeper, 3);
    let outcome = e.enrich(jane()).await;

    let EnrichmentOutcome::Degraded { cause, .. } = outcome else { panic!("expected degraded") };
    assert_eq!(cause, DegradeCause::PollBudgetExhausted { polls: 3 });
    assert_eq!(sleeper.waits().len(), 3);
    assert_eq!(e.search().status_calls(), 3);
  }
}
