//! [`SqliteStore`], the SQLite implementation of [`RosterStore`].

use std::path::Path;

use roster_core::{
  company::{Company, NewCompany},
  employee::{Employee, EmployeeCounts, EmployeeRecord, EnrichmentData, JobHistoryEntry, JobHistoryRow},
  merge::MergePolicy,
  store::{CompanyStore, RosterStore},
};
use rusqlite::{OptionalExtension as _, ToSql};
use serde::Serialize;

use crate::{
  encode::{
    COMPANY_COLUMNS, EMPLOYEE_COLUMNS, EncodedEmployee, INSERT_EMPLOYEE,
    UPDATE_EMPLOYEE, read_company, read_employee, read_job_history_row,
    to_json_text,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Roster store backed by a single SQLite file.
///
/// Clones share one reference-counted connection. Dropping the
/// last clone closes the connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// A table and the DDL that created it.
#[derive(Debug, Clone, Serialize)]
pub struct TableInfo {
  pub name: String,
  pub sql:  Option<String>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// List the user tables in the database with their creation SQL.
  pub async fn list_tables(&self) -> Result<Vec<TableInfo>> {
    let tables = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT name, sql FROM sqlite_master
           WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
           ORDER BY name",
        )?;
        let rows = stmt
          .query_map([], |row| Ok(TableInfo { name: row.get(0)?, sql: row.get(1)? }))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(tables)
  }
}

/// Replace the derived job-history rows of `employee_id` with `entries`.
///
/// Each entry's company is matched case-insensitively against existing
/// companies; no company is created here.
fn write_job_history(
  conn: &rusqlite::Connection,
  employee_id: i64,
  entries: &[JobHistoryEntry],
) -> rusqlite::Result<()> {
  conn.execute(
    "DELETE FROM employee_job_history WHERE employee_id = ?1",
    rusqlite::params![employee_id],
  )?;

  let mut find_company =
    conn.prepare_cached("SELECT company_id FROM companies WHERE name = ?1 COLLATE NOCASE")?;
  let mut insert = conn.prepare_cached(
    "INSERT INTO employee_job_history (
       employee_id, company_id, position, company_name, title,
       start_date, end_date, is_current
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
  )?;

  for (position, entry) in entries.iter().enumerate() {
    let company_name = entry
      .company_name
      .as_deref()
      .map(str::trim)
      .filter(|n| !n.is_empty());
    let company_id: Option<i64> = match company_name {
      Some(name) => find_company
        .query_row(rusqlite::params![name], |r| r.get(0))
        .optional()?,
      None => None,
    };
    insert.execute(rusqlite::params![
      employee_id,
      company_id,
      position as i64,
      company_name,
      entry.title,
      entry.start_date,
      entry.end_date,
      entry.is_current,
    ])?;
  }
  Ok(())
}

// ─── CompanyStore impl ───────────────────────────────────────────────────────

impl CompanyStore for SqliteStore {
  type Error = Error;

  async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>> {
    let name = name.trim().to_owned();

    let company = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE name = ?1 COLLATE NOCASE"),
            rusqlite::params![name],
            read_company,
          )
          .optional()?)
      })
      .await?;
    Ok(company)
  }

  async fn insert_company(&self, company: &NewCompany) -> Result<Company> {
    let mut row = Company {
      company_id:  0,
      name:        company.name.trim().to_owned(),
      website:     company.website.clone(),
      domain:      company.domain.clone(),
      profile_url: company.profile_url.clone(),
    };
    let insert = row.clone();

    row.company_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO companies (name, website, domain, profile_url) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![insert.name, insert.website, insert.domain, insert.profile_url],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(row)
  }

  async fn update_company(&self, company: &Company) -> Result<()> {
    let company = company.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE companies SET website = ?1, domain = ?2, profile_url = ?3 WHERE company_id = ?4",
          rusqlite::params![company.website, company.domain, company.profile_url, company.company_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_company(&self, company_id: i64) -> Result<Option<Company>> {
    let company = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE company_id = ?1"),
            rusqlite::params![company_id],
            read_company,
          )
          .optional()?)
      })
      .await?;
    Ok(company)
  }

  async fn list_companies(&self) -> Result<Vec<Company>> {
    let companies = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {COMPANY_COLUMNS} FROM companies ORDER BY name"))?;
        let rows = stmt
          .query_map([], read_company)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(companies)
  }
}

// ─── RosterStore impl ────────────────────────────────────────────────────────

impl RosterStore for SqliteStore {
  async fn upsert_employee(
    &self,
    record: EmployeeRecord,
    policy: MergePolicy,
  ) -> Result<Employee> {
    let employee = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing = tx
          .query_row(
            &format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE profile_url = ?1"),
            rusqlite::params![record.profile_url],
            read_employee,
          )
          .optional()?;

        let employee = match existing {
          Some(existing) => {
            let merged = policy.apply(&existing.record, record);
            {
              let encoded = EncodedEmployee::new(&merged)?;
              let mut params = encoded.named_params();
              params.push((":employee_id", &existing.employee_id as &dyn ToSql));
              tx.execute(UPDATE_EMPLOYEE, params.as_slice())?;
            }
            Employee { employee_id: existing.employee_id, record: merged }
          }
          None => {
            {
              let encoded = EncodedEmployee::new(&record)?;
              tx.execute(INSERT_EMPLOYEE, encoded.named_params().as_slice())?;
            }
            Employee { employee_id: tx.last_insert_rowid(), record }
          }
        };

        write_job_history(&tx, employee.employee_id, &employee.record.enrichment.job_history)?;
        tx.commit()?;
        Ok(employee)
      })
      .await?;
    Ok(employee)
  }

  async fn get_employee(&self, employee_id: i64) -> Result<Option<Employee>> {
    let employee = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE employee_id = ?1"),
            rusqlite::params![employee_id],
            read_employee,
          )
          .optional()?)
      })
      .await?;
    Ok(employee)
  }

  async fn find_employee_by_profile_url(&self, profile_url: &str) -> Result<Option<Employee>> {
    let profile_url = profile_url.trim().to_owned();

    let employee = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE profile_url = ?1"),
            rusqlite::params![profile_url],
            read_employee,
          )
          .optional()?)
      })
      .await?;
    Ok(employee)
  }

  async fn list_unenriched(&self, limit: Option<usize>) -> Result<Vec<Employee>> {
    // SQLite treats a negative LIMIT as "no limit".
    let limit_val = limit.map_or(-1, |l| l as i64);

    let employees = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EMPLOYEE_COLUMNS} FROM employees
           WHERE is_enriched IS NULL OR is_enriched = 0
           ORDER BY employee_id
           LIMIT ?1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], read_employee)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(employees)
  }

  async fn apply_enrichment(&self, employee_id: i64, data: &EnrichmentData) -> Result<()> {
    let data = data.clone();

    let updated = self
      .conn
      .call(move |conn| {
        let education = to_json_text(&data.education)?;
        let job_history = to_json_text(&data.job_history)?;
        let skills = to_json_text(&data.skills)?;

        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE employees
           SET education = ?1, job_history = ?2, skills = ?3, is_enriched = 1
           WHERE employee_id = ?4",
          rusqlite::params![education, job_history, skills, employee_id],
        )?;
        if changed == 0 {
          return Ok(false);
        }
        write_job_history(&tx, employee_id, &data.job_history)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if updated { Ok(()) } else { Err(Error::EmployeeNotFound(employee_id)) }
  }

  async fn employees_for_company(&self, company: &Company) -> Result<Vec<Employee>> {
    let company_id = company.company_id;
    let name = company.name.clone();

    let employees = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EMPLOYEE_COLUMNS} FROM employees
           WHERE company_id = ?1 OR current_company = ?2 COLLATE NOCASE
           ORDER BY name, employee_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![company_id, name], read_employee)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(employees)
  }

  async fn job_history(&self, employee_id: i64) -> Result<Vec<JobHistoryRow>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT employee_id, company_id, company_name, title,
                  start_date, end_date, is_current
           FROM employee_job_history
           WHERE employee_id = ?1
           ORDER BY position",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![employee_id], read_job_history_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn employee_counts(&self) -> Result<EmployeeCounts> {
    let (total, enriched): (i64, i64) = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*),
                  COALESCE(SUM(CASE WHEN is_enriched = 1 THEN 1 ELSE 0 END), 0)
           FROM employees",
          [],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )?)
      })
      .await?;

    Ok(EmployeeCounts { total: total as u64, enriched: enriched as u64 })
  }
}
