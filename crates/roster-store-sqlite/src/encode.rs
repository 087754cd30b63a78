//! Encoding and decoding helpers between Rust domain types and the column
//! representations stored in SQLite.
//!
//! List-valued fields (contact lists, enrichment payloads) are stored as
//! compact JSON text. Conversion failures are surfaced as rusqlite conversion
//! errors so they can be raised from inside a connection closure.

use roster_core::{
  company::Company,
  employee::{
    ContactInfo, Employee, EmployeeRecord, EmployerInfo, EnrichmentData,
    JobHistoryRow, Location,
  },
};
use rusqlite::{Row, ToSql, types::Type};
use serde::{Serialize, de::DeserializeOwned};

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn to_json_text<T: Serialize>(value: &T) -> rusqlite::Result<String> {
  serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

/// Read a JSON text column; `NULL` and the empty string decode to the default.
pub fn json_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
  T: DeserializeOwned + Default,
{
  match row.get::<_, Option<String>>(idx)? {
    Some(s) if !s.trim().is_empty() => serde_json::from_str(&s)
      .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
    _ => Ok(T::default()),
  }
}

// ─── Companies ───────────────────────────────────────────────────────────────

pub const COMPANY_COLUMNS: &str = "company_id, name, website, domain, profile_url";

pub fn read_company(row: &Row<'_>) -> rusqlite::Result<Company> {
  Ok(Company {
    company_id:  row.get(0)?,
    name:        row.get(1)?,
    website:     row.get(2)?,
    domain:      row.get(3)?,
    profile_url: row.get(4)?,
  })
}

// ─── Employees ───────────────────────────────────────────────────────────────

pub const EMPLOYEE_COLUMNS: &str = "
  employee_id, profile_url, name, title, company_id, current_company,
  employer_name, employer_website, employer_domain, employer_external_id,
  employer_profile_url, location, city, region, country, country_code,
  latitude, longitude, phone_numbers, emails, personal_emails,
  professional_emails, birth_year, profile_picture_url, status, suppressed,
  category, education, job_history, skills, is_enriched";

pub fn read_employee(row: &Row<'_>) -> rusqlite::Result<Employee> {
  Ok(Employee {
    employee_id: row.get(0)?,
    record:      EmployeeRecord {
      profile_url:         row.get(1)?,
      name:                row.get(2)?,
      title:               row.get(3)?,
      company_id:          row.get(4)?,
      current_company:     row.get(5)?,
      employer:            EmployerInfo {
        name:        row.get(6)?,
        website:     row.get(7)?,
        domain:      row.get(8)?,
        external_id: row.get(9)?,
        profile_url: row.get(10)?,
      },
      location:            Location {
        location:     row.get(11)?,
        city:         row.get(12)?,
        region:       row.get(13)?,
        country:      row.get(14)?,
        country_code: row.get(15)?,
        latitude:     row.get(16)?,
        longitude:    row.get(17)?,
      },
      contact:             ContactInfo {
        phone_numbers:       json_column(row, 18)?,
        emails:              json_column(row, 19)?,
        personal_emails:     json_column(row, 20)?,
        professional_emails: json_column(row, 21)?,
      },
      birth_year:          row.get(22)?,
      profile_picture_url: row.get(23)?,
      status:              row.get(24)?,
      suppressed:          row.get::<_, Option<bool>>(25)?.unwrap_or(false),
      category:            row.get(26)?,
      enrichment:          EnrichmentData {
        education:   json_column(row, 27)?,
        job_history: json_column(row, 28)?,
        skills:      json_column(row, 29)?,
      },
      is_enriched:         row.get::<_, Option<bool>>(30)?.unwrap_or(false),
    },
  })
}

pub const INSERT_EMPLOYEE: &str = "
  INSERT INTO employees (
    profile_url, name, title, company_id, current_company,
    employer_name, employer_website, employer_domain, employer_external_id,
    employer_profile_url, location, city, region, country, country_code,
    latitude, longitude, phone_numbers, emails, personal_emails,
    professional_emails, birth_year, profile_picture_url, status, suppressed,
    category, education, job_history, skills, is_enriched
  ) VALUES (
    :profile_url, :name, :title, :company_id, :current_company,
    :employer_name, :employer_website, :employer_domain, :employer_external_id,
    :employer_profile_url, :location, :city, :region, :country, :country_code,
    :latitude, :longitude, :phone_numbers, :emails, :personal_emails,
    :professional_emails, :birth_year, :profile_picture_url, :status, :suppressed,
    :category, :education, :job_history, :skills, :is_enriched
  )";

pub const UPDATE_EMPLOYEE: &str = "
  UPDATE employees SET
    profile_url = :profile_url, name = :name, title = :title,
    company_id = :company_id, current_company = :current_company,
    employer_name = :employer_name, employer_website = :employer_website,
    employer_domain = :employer_domain,
    employer_external_id = :employer_external_id,
    employer_profile_url = :employer_profile_url,
    location = :location, city = :city, region = :region, country = :country,
    country_code = :country_code, latitude = :latitude, longitude = :longitude,
    phone_numbers = :phone_numbers, emails = :emails,
    personal_emails = :personal_emails,
    professional_emails = :professional_emails, birth_year = :birth_year,
    profile_picture_url = :profile_picture_url, status = :status,
    suppressed = :suppressed, category = :category, education = :education,
    job_history = :job_history, skills = :skills, is_enriched = :is_enriched
  WHERE employee_id = :employee_id";

/// An [`EmployeeRecord`] with its list fields already rendered to JSON, ready
/// to bind as named parameters.
pub struct EncodedEmployee<'a> {
  record:              &'a EmployeeRecord,
  phone_numbers:       String,
  emails:              String,
  personal_emails:     String,
  professional_emails: String,
  education:           String,
  job_history:         String,
  skills:              String,
}

impl<'a> EncodedEmployee<'a> {
  pub fn new(record: &'a EmployeeRecord) -> rusqlite::Result<Self> {
    Ok(Self {
      record,
      phone_numbers: to_json_text(&record.contact.phone_numbers)?,
      emails: to_json_text(&record.contact.emails)?,
      personal_emails: to_json_text(&record.contact.personal_emails)?,
      professional_emails: to_json_text(&record.contact.professional_emails)?,
      education: to_json_text(&record.enrichment.education)?,
      job_history: to_json_text(&record.enrichment.job_history)?,
      skills: to_json_text(&record.enrichment.skills)?,
    })
  }

  pub fn named_params(&self) -> Vec<(&'static str, &dyn ToSql)> {
    let r = self.record;
    vec![
      (":profile_url", &r.profile_url as &dyn ToSql),
      (":name", &r.name as &dyn ToSql),
      (":title", &r.title as &dyn ToSql),
      (":company_id", &r.company_id as &dyn ToSql),
      (":current_company", &r.current_company as &dyn ToSql),
      (":employer_name", &r.employer.name as &dyn ToSql),
      (":employer_website", &r.employer.website as &dyn ToSql),
      (":employer_domain", &r.employer.domain as &dyn ToSql),
      (":employer_external_id", &r.employer.external_id as &dyn ToSql),
      (":employer_profile_url", &r.employer.profile_url as &dyn ToSql),
      (":location", &r.location.location as &dyn ToSql),
      (":city", &r.location.city as &dyn ToSql),
      (":region", &r.location.region as &dyn ToSql),
      (":country", &r.location.country as &dyn ToSql),
      (":country_code", &r.location.country_code as &dyn ToSql),
      (":latitude", &r.location.latitude as &dyn ToSql),
      (":longitude", &r.location.longitude as &dyn ToSql),
      (":phone_numbers", &self.phone_numbers as &dyn ToSql),
      (":emails", &self.emails as &dyn ToSql),
      (":personal_emails", &self.personal_emails as &dyn ToSql),
      (":professional_emails", &self.professional_emails as &dyn ToSql),
      (":birth_year", &r.birth_year as &dyn ToSql),
      (":profile_picture_url", &r.profile_picture_url as &dyn ToSql),
      (":status", &r.status as &dyn ToSql),
      (":suppressed", &r.suppressed as &dyn ToSql),
      (":category", &r.category as &dyn ToSql),
      (":education", &self.education as &dyn ToSql),
      (":job_history", &self.job_history as &dyn ToSql),
      (":skills", &self.skills as &dyn ToSql),
      (":is_enriched", &r.is_enriched as &dyn ToSql),
    ]
  }
}

// ─── Job history ─────────────────────────────────────────────────────────────

pub fn read_job_history_row(row: &Row<'_>) -> rusqlite::Result<JobHistoryRow> {
  Ok(JobHistoryRow {
    employee_id:  row.get(0)?,
    company_id:   row.get(1)?,
    company_name: row.get(2)?,
    title:        row.get(3)?,
    start_date:   row.get(4)?,
    end_date:     row.get(5)?,
    is_current:   row.get(6)?,
  })
}
