//! Ingestion: CSV rows and discovered profiles into the store.
//!
//! For each accepted record: resolve the employer company, optionally enrich,
//! then upsert under the configured merge policy. Problems with one record
//! are recorded in the [`IngestReport`] and never stop the batch.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use roster_core::{
  company::NewCompany, employee::Employee, merge::MergePolicy, resolve::resolve_company,
  store::RosterStore,
};
use roster_import::{ImportRow, ImportedEmployee, Skip, SkipReason};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Result,
  client::{EmployerSearch, PeopleSearch},
  orchestrator::{Enricher, EnrichmentOutcome},
  pace::Sleeper,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
  /// Run each record through the enricher before saving it.
  pub enrich:       bool,
  pub merge_policy: MergePolicy,
}

impl Default for IngestOptions {
  fn default() -> Self {
    Self { enrich: true, merge_policy: MergePolicy::default() }
  }
}

/// A record that could not be processed.
#[derive(Debug, Clone, Serialize)]
pub struct RowError {
  /// The file the row came from, when ingesting from disk.
  pub source:  Option<PathBuf>,
  pub row:     usize,
  pub name:    Option<String>,
  pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
  pub run_id:     Uuid,
  pub started_at: DateTime<Utc>,
  /// Data rows (or discovered profiles) seen.
  pub rows:       usize,
  pub saved:      usize,
  pub enriched:   usize,
  pub skipped:    Vec<Skip>,
  pub errors:     Vec<RowError>,
}

impl IngestReport {
  pub fn new() -> Self {
    Self {
      run_id:     Uuid::new_v4(),
      started_at: Utc::now(),
      rows:       0,
      saved:      0,
      enriched:   0,
      skipped:    Vec::new(),
      errors:     Vec::new(),
    }
  }

  fn error(&mut self, source: Option<&Path>, row: usize, name: Option<String>, message: String) {
    warn!(source = ?source, row, name = ?name, %message, "row failed");
    self.errors.push(RowError { source: source.map(Path::to_path_buf), row, name, message });
  }

  fn skip(&mut self, skip: Skip) {
    warn!(row = skip.row, name = ?skip.name, reason = %skip.reason, "row skipped");
    self.skipped.push(skip);
  }
}

impl Default for IngestReport {
  fn default() -> Self { Self::new() }
}

// ─── Ingestor ────────────────────────────────────────────────────────────────

pub struct Ingestor<'a, St, P, S> {
  store:    &'a St,
  enricher: &'a Enricher<P, S>,
  options:  IngestOptions,
}

impl<'a, St, P, S> Ingestor<'a, St, P, S>
where
  St: RosterStore,
  P: PeopleSearch,
  S: Sleeper,
{
  pub fn new(store: &'a St, enricher: &'a Enricher<P, S>, options: IngestOptions) -> Self {
    Self { store, enricher, options }
  }

  /// Import one CSV file. Fails only if the file cannot be opened or its
  /// header cannot be read.
  pub async fn ingest_file(&self, path: impl AsRef<Path>) -> Result<IngestReport> {
    let mut report = IngestReport::new();
    self.ingest_file_into(path.as_ref(), &mut report).await?;
    self.finish(&report);
    Ok(report)
  }

  /// Import every `*.csv` file in `dir`, in name order. A file that cannot be
  /// read is recorded as an error and the rest continue.
  pub async fn ingest_dir(&self, dir: impl AsRef<Path>) -> Result<IngestReport> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir.as_ref())? {
      let path = entry?.path();
      let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
      if is_csv && path.is_file() {
        files.push(path);
      }
    }
    files.sort();

    let mut report = IngestReport::new();
    for path in &files {
      info!(file = %path.display(), "importing");
      if let Err(e) = self.ingest_file_into(path, &mut report).await {
        report.error(Some(path), 0, None, e.to_string());
      }
    }
    self.finish(&report);
    Ok(report)
  }

  /// Import already-normalized records.
  pub async fn ingest_records(&self, records: Vec<ImportedEmployee>) -> IngestReport {
    let mut report = IngestReport::new();
    for imported in records {
      report.rows += 1;
      self.ingest_one(None, imported, &mut report).await;
    }
    self.finish(&report);
    report
  }

  /// Search the service for current employees of `search.company` and ingest
  /// those whose employer matches and that carry a profile URL.
  pub async fn discover(&self, search: &EmployerSearch) -> Result<IngestReport> {
    let company = search.company.trim();
    let profiles = self.enricher.search().search_employer(search).await?;
    info!(company, found = profiles.len(), "employer search returned");

    let records: Vec<_> = profiles
      .into_iter()
      .filter(|p| p.works_at(company))
      .filter(|p| p.linkedin_url.as_deref().is_some_and(|u| !u.trim().is_empty()))
      .enumerate()
      .map(|(i, profile)| {
        let employer = NewCompany {
          name:        company.to_owned(),
          website:     profile.current_employer_website.clone(),
          domain:      profile.current_employer_domain.clone(),
          profile_url: profile.current_employer_linkedin_url.clone(),
        };
        let mut record = profile.into_record();
        record.current_company = Some(company.to_owned());
        ImportedEmployee { row: i + 1, record, employer }
      })
      .collect();

    Ok(self.ingest_records(records).await)
  }

  async fn ingest_file_into(&self, path: &Path, report: &mut IngestReport) -> Result<()> {
    let rows = roster_import::parse_path(path)?;
    for (i, row) in rows.enumerate() {
      report.rows += 1;
      match row {
        Ok(ImportRow::Accepted(imported)) => self.ingest_one(Some(path), imported, report).await,
        Ok(ImportRow::Skipped(skip)) => report.skip(skip),
        Err(e) => report.error(Some(path), i + 1, None, e.to_string()),
      }
    }
    Ok(())
  }

  async fn ingest_one(
    &self,
    source: Option<&Path>,
    imported: ImportedEmployee,
    report: &mut IngestReport,
  ) {
    let ImportedEmployee { row, mut record, employer } = imported;

    let company = match resolve_company(self.store, &employer).await {
      Ok(Some(resolved)) => {
        debug!(company = %resolved.company.name, change = ?resolved.change, "resolved employer");
        resolved.company
      }
      Ok(None) => {
        report.skip(Skip { row, name: Some(record.name), reason: SkipReason::UnresolvedCompany });
        return;
      }
      Err(e) => {
        report.error(source, row, Some(record.name), e.to_string());
        return;
      }
    };
    record.company_id = Some(company.company_id);

    let mut enriched = false;
    if self.options.enrich && !self.already_enriched(&record.profile_url).await {
      record = match self.enricher.enrich(record).await {
        EnrichmentOutcome::Enriched(r) => {
          enriched = true;
          r
        }
        outcome => outcome.into_record(),
      };
    }

    let name = record.name.clone();
    match self.store.upsert_employee(record, self.options.merge_policy).await {
      Ok(saved) => {
        debug!(employee_id = saved.employee_id, %name, company = %company.name, "saved employee");
        report.saved += 1;
        if enriched {
          report.enriched += 1;
        }
      }
      Err(e) => report.error(source, row, Some(name), e.to_string()),
    }
  }

  /// Stored rows that are already enriched are not sent to the service again.
  async fn already_enriched(&self, profile_url: &str) -> bool {
    stored_as_enriched(profile_url, self.store.find_employee_by_profile_url(profile_url).await)
  }

  fn finish(&self, report: &IngestReport) {
    info!(
      run_id = %report.run_id,
      rows = report.rows,
      saved = report.saved,
      enriched = report.enriched,
      skipped = report.skipped.len(),
      errors = report.errors.len(),
      "ingest finished"
    );
  }
}

/// A failed lookup reads as "not enriched", so the row is sent to the service.
fn stored_as_enriched<E: std::fmt::Display>(
  profile_url: &str,
  lookup: std::result::Result<Option<Employee>, E>,
) -> bool {
  match lookup {
    Ok(existing) => existing.is_some_and(|e| e.record.is_enriched),
    Err(e) => {
      warn!(%profile_url, error = %e, "could not check stored enrichment; enriching anyway");
      false
    }
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use roster_core::store::{CompanyStore as _, RosterStore as _};
  use roster_store_sqlite::SqliteStore;

  use super::*;
  use crate::{
    Error,
    client::Profile,
    orchestrator::PollPolicy,
    test_support::{RecordingSleeper, ScriptedSearch, profile},
  };

  const HEADER: &str = "Name,LinkedInURL,CurrentCompany,Title,Emails";

  fn offline() -> Enricher<ScriptedSearch, RecordingSleeper> {
    let search = ScriptedSearch::new(|_| {
      Err(Error::Status {
        endpoint: "/person/lookup".into(),
        status:   reqwest::StatusCode::SERVICE_UNAVAILABLE,
      })
    });
    Enricher::new(search, RecordingSleeper::default(), PollPolicy::default())
  }

  fn completing() -> Enricher<ScriptedSearch, RecordingSleeper> {
    let search = ScriptedSearch::new(|_| {
      Ok(Profile { skills: vec!["Rust".into()], ..profile(1, "complete") })
    });
    Enricher::new(search, RecordingSleeper::default(), PollPolicy::default())
  }

  fn no_enrich() -> IngestOptions {
    IngestOptions { enrich: false, ..IngestOptions::default() }
  }

  fn write_csv(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut body = format!("{HEADER}\n");
    for row in rows {
      body.push_str(row);
      body.push('\n');
    }
    fs::write(&path, body).unwrap();
    path
  }

  #[test]
  fn store_lookup_failure_falls_back_to_enriching() {
    let url = "https://linkedin.com/in/jdoe";
    let mut stored = Employee {
      employee_id: 1,
      record:      roster_core::employee::EmployeeRecord::new(url, "Jane Doe"),
    };
    assert!(!stored_as_enriched(url, Ok::<_, String>(Some(stored.clone()))));
    stored.record.is_enriched = true;
    assert!(stored_as_enriched(url, Ok::<_, String>(Some(stored))));
    assert!(!stored_as_enriched(url, Ok::<_, String>(None)));
    assert!(!stored_as_enriched::<String>(url, Err("database is locked".into())));
  }

  #[tokio::test]
  async fn row_missing_company_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path(), "people.csv", &[
      "Jane Doe,https://linkedin.com/in/jdoe,Acme Inc,Engineer,",
      "John Roe,https://linkedin.com/in/jroe,,Manager,",
      "Ann Poe,https://linkedin.com/in/apoe,acme inc,,",
    ]);

    let store = SqliteStore::open_in_memory().await.unwrap();
    let enricher = offline();
    let report = Ingestor::new(&store, &enricher, no_enrich()).ingest_file(&path).await.unwrap();

    assert_eq!(report.rows, 3);
    assert_eq!(report.saved, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reason.to_string(), "missing CurrentCompany");
    assert_eq!(store.employee_counts().await.unwrap().total, 2);
    assert_eq!(store.list_companies().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn degraded_enrichment_still_saves() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path(), "people.csv", &[
      "Jane Doe,https://linkedin.com/in/jdoe,Acme Inc,Engineer,",
    ]);

    let store = SqliteStore::open_in_memory().await.unwrap();
    let enricher = offline();
    let report = Ingestor::new(&store, &enricher, IngestOptions::default())
      .ingest_file(&path)
      .await
      .unwrap();

    assert_eq!(report.saved, 1);
    assert_eq!(report.enriched, 0);
    let stored = store
      .find_employee_by_profile_url("https://linkedin.com/in/jdoe")
      .await
      .unwrap()
      .unwrap();
    assert!(!stored.record.is_enriched);
    assert!(stored.record.company_id.is_some());
  }

  #[tokio::test]
  async fn enriched_rows_are_counted_and_not_reenriched() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path(), "people.csv", &[
      "Jane Doe,https://linkedin.com/in/jdoe,Acme Inc,Engineer,",
    ]);

    let store = SqliteStore::open_in_memory().await.unwrap();
    let enricher = completing();
    let ingestor = Ingestor::new(&store, &enricher, IngestOptions::default());

    let first = ingestor.ingest_file(&path).await.unwrap();
    assert_eq!(first.enriched, 1);

    let second = ingestor.ingest_file(&path).await.unwrap();
    assert_eq!(second.saved, 1);
    assert_eq!(second.enriched, 0);

    let stored = store
      .find_employee_by_profile_url("https://linkedin.com/in/jdoe")
      .await
      .unwrap()
      .unwrap();
    assert!(stored.record.is_enriched);
    assert_eq!(stored.record.enrichment.skills, vec!["Rust"]);
  }

  #[tokio::test]
  async fn reingest_under_replace_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_csv(dir.path(), "a.csv", &[
      "Jane Doe,https://linkedin.com/in/jdoe,Acme Inc,Engineer,jane@acme.test",
    ]);
    let second = write_csv(dir.path(), "b.csv", &[
      "Jane Doe,https://linkedin.com/in/jdoe,Acme Inc,,",
    ]);

    let store = SqliteStore::open_in_memory().await.unwrap();
    let enricher = offline();

    let keep = Ingestor::new(&store, &enricher, no_enrich());
    keep.ingest_file(&first).await.unwrap();
    keep.ingest_file(&second).await.unwrap();
    let merged = store
      .find_employee_by_profile_url("https://linkedin.com/in/jdoe")
      .await
      .unwrap()
      .unwrap();
    assert_eq!(merged.record.title.as_deref(), Some("Engineer"));

    let replace = Ingestor::new(&store, &enricher, IngestOptions {
      enrich:       false,
      merge_policy: MergePolicy::Replace,
    });
    replace.ingest_file(&second).await.unwrap();
    let replaced = store
      .find_employee_by_profile_url("https://linkedin.com/in/jdoe")
      .await
      .unwrap()
      .unwrap();
    assert_eq!(replaced.record.title, None);
    assert!(replaced.record.contact.emails.is_empty());
  }

  #[tokio::test]
  async fn directory_import_reads_csv_files_in_order() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(dir.path(), "b.CSV", &["Bob,https://linkedin.com/in/bob,Globex,,"]);
    write_csv(dir.path(), "a.csv", &["Ann,https://linkedin.com/in/ann,Acme,,"]);
    fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();
    fs::write(dir.path().join("empty.csv"), "").unwrap();

    let store = SqliteStore::open_in_memory().await.unwrap();
    let enricher = offline();
    let report = Ingestor::new(&store, &enricher, no_enrich())
      .ingest_dir(dir.path())
      .await
      .unwrap();

    assert_eq!(report.saved, 2);
    assert!(report.errors.is_empty());
    let employees = store.list_unenriched(None).await.unwrap();
    let names: Vec<_> = employees.iter().map(|e| e.record.name.as_str()).collect();
    assert_eq!(names, vec!["Ann", "Bob"]);
  }

  #[tokio::test]
  async fn malformed_row_is_an_error_not_an_abort() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path(), "people.csv", &[
      "too,few",
      "Ann,https://linkedin.com/in/ann,Acme,,",
    ]);

    let store = SqliteStore::open_in_memory().await.unwrap();
    let enricher = offline();
    let report = Ingestor::new(&store, &enricher, no_enrich()).ingest_file(&path).await.unwrap();

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].row, 1);
    assert_eq!(report.saved, 1);
  }

  #[tokio::test]
  async fn discover_keeps_matching_profiles_with_urls() {
    let found = vec![
      Profile {
        name: Some("Jane Doe".into()),
        current_employer: Some("ACME INC".into()),
        linkedin_url: Some("https://linkedin.com/in/jdoe".into()),
        ..Profile::default()
      },
      Profile {
        name: Some("No Url".into()),
        current_employer: Some("Acme Inc".into()),
        ..Profile::default()
      },
      Profile {
        name: Some("Elsewhere".into()),
        current_employer: Some("Globex".into()),
        linkedin_url: Some("https://linkedin.com/in/else".into()),
        ..Profile::default()
      },
    ];
    let search = ScriptedSearch::new(|_| Ok(profile(1, "failed"))).with_employer(found);
    let enricher = Enricher::new(search, RecordingSleeper::default(), PollPolicy::default());

    let store = SqliteStore::open_in_memory().await.unwrap();
    let report = Ingestor::new(&store, &enricher, IngestOptions::default())
      .discover(&EmployerSearch::new("Acme Inc"))
      .await
      .unwrap();

    assert_eq!(report.rows, 1);
    assert_eq!(report.saved, 1);
    let acme = store.find_company_by_name("acme inc").await.unwrap().unwrap();
    let staff = store.employees_for_company(&acme).await.unwrap();
    assert_eq!(staff.len(), 1);
    assert_eq!(staff[0].record.current_company.as_deref(), Some("Acme Inc"));
  }
}
