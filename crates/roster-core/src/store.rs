//! The store traits the pipeline is written against.
//!
//! The traits are implemented by storage backends (e.g. `roster-store-sqlite`).
//! Higher layers (`roster-enrich`, `roster-api`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use crate::{
  company::{Company, NewCompany},
  employee::{Employee, EmployeeCounts, EmployeeRecord, EnrichmentData, JobHistoryRow},
  merge::MergePolicy,
};

/// Error bound shared by all store backends.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// `true` when the failure was a uniqueness-constraint violation, i.e. a
  /// concurrent writer created the same identity first.
  fn is_conflict(&self) -> bool;
}

// ─── Companies ───────────────────────────────────────────────────────────────

/// Company persistence. Identity is the trimmed name, case-insensitively.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CompanyStore: Send + Sync {
  type Error: StoreError;

  /// Case-insensitive lookup by (already trimmed) name.
  fn find_company_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Company>, Self::Error>> + Send + 'a;

  /// Insert a new company. Fails with a conflict error (see
  /// [`StoreError::is_conflict`]) if the name is already taken.
  fn insert_company<'a>(
    &'a self,
    company: &'a NewCompany,
  ) -> impl Future<Output = Result<Company, Self::Error>> + Send + 'a;

  /// Overwrite the descriptive attributes of `company` by id.
  fn update_company<'a>(
    &'a self,
    company: &'a Company,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_company(
    &self,
    company_id: i64,
  ) -> impl Future<Output = Result<Option<Company>, Self::Error>> + Send + '_;

  fn list_companies(
    &self,
  ) -> impl Future<Output = Result<Vec<Company>, Self::Error>> + Send + '_;
}

// ─── Full store ──────────────────────────────────────────────────────────────

/// Abstraction over a Roster store backend: companies plus employees.
pub trait RosterStore: CompanyStore {
  /// Insert `record`, or combine it with the existing row that has the same
  /// profile URL under `policy`. Read, merge and write happen atomically.
  fn upsert_employee(
    &self,
    record: EmployeeRecord,
    policy: MergePolicy,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + '_;

  fn get_employee(
    &self,
    employee_id: i64,
  ) -> impl Future<Output = Result<Option<Employee>, Self::Error>> + Send + '_;

  fn find_employee_by_profile_url<'a>(
    &'a self,
    profile_url: &'a str,
  ) -> impl Future<Output = Result<Option<Employee>, Self::Error>> + Send + 'a;

  /// Employees whose `is_enriched` flag is unset or false, in id order.
  fn list_unenriched(
    &self,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<Employee>, Self::Error>> + Send + '_;

  /// Commit a successful enrichment: replace the enrichment lists, set
  /// `is_enriched`, and rewrite the derived job-history rows. No other column
  /// is touched.
  fn apply_enrichment<'a>(
    &'a self,
    employee_id: i64,
    data: &'a EnrichmentData,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Employees attached to `company` by id, or whose imported company name
  /// matches it case-insensitively.
  fn employees_for_company<'a>(
    &'a self,
    company: &'a Company,
  ) -> impl Future<Output = Result<Vec<Employee>, Self::Error>> + Send + 'a;

  fn job_history(
    &self,
    employee_id: i64,
  ) -> impl Future<Output = Result<Vec<JobHistoryRow>, Self::Error>> + Send + '_;

  fn employee_counts(
    &self,
  ) -> impl Future<Output = Result<EmployeeCounts, Self::Error>> + Send + '_;
}
