//! Employee records and the enrichment payload attached to them.
//!
//! An employee's identity is its professional-network profile URL. Everything
//! else is descriptive and may be replaced or filled in by later ingestion and
//! enrichment passes.

use serde::{Deserialize, Deserializer, Serialize};

// ─── Enrichment payload ──────────────────────────────────────────────────────

/// One education entry as reported by the people-search service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
  #[serde(default)]
  pub school: Option<String>,
  #[serde(default)]
  pub degree: Option<String>,
  #[serde(default)]
  pub major:  Option<String>,
  #[serde(default, deserialize_with = "flexible_text")]
  pub start:  Option<String>,
  #[serde(default, deserialize_with = "flexible_text")]
  pub end:    Option<String>,
}

/// One prior (or current) employment entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobHistoryEntry {
  #[serde(default)]
  pub company_name: Option<String>,
  #[serde(default)]
  pub title:        Option<String>,
  #[serde(default, deserialize_with = "flexible_text")]
  pub start_date:   Option<String>,
  #[serde(default, deserialize_with = "flexible_text")]
  pub end_date:     Option<String>,
  #[serde(default, deserialize_with = "null_as_false")]
  pub is_current:   bool,
}

/// The variable-length lists produced by enrichment. Each list is stored as
/// serialised JSON text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentData {
  pub education:   Vec<Education>,
  pub job_history: Vec<JobHistoryEntry>,
  pub skills:      Vec<String>,
}

/// Dates and years arrive as either strings or bare numbers depending on the
/// endpoint; keep them as text.
fn flexible_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Text {
    Str(String),
    Int(i64),
    Float(f64),
  }

  Ok(Option::<Text>::deserialize(deserializer)?.and_then(|t| match t {
    Text::Str(s) if s.trim().is_empty() => None,
    Text::Str(s) => Some(s),
    Text::Int(i) => Some(i.to_string()),
    Text::Float(f) => Some(f.to_string()),
  }))
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

// ─── Descriptive sub-records ─────────────────────────────────────────────────

/// The employee's current employer as described by the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployerInfo {
  pub name:        Option<String>,
  pub website:     Option<String>,
  pub domain:      Option<String>,
  /// The employer's identifier in the people-search service.
  pub external_id: Option<i64>,
  pub profile_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
  /// Free-text location line, e.g. "Boston, Massachusetts, United States".
  pub location:     Option<String>,
  pub city:         Option<String>,
  pub region:       Option<String>,
  pub country:      Option<String>,
  pub country_code: Option<String>,
  pub latitude:     Option<f64>,
  pub longitude:    Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
  pub phone_numbers:       Vec<String>,
  pub emails:              Vec<String>,
  pub personal_emails:     Vec<String>,
  pub professional_emails: Vec<String>,
}

// ─── Employee ────────────────────────────────────────────────────────────────

/// Everything known about an employee apart from its store-assigned id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
  /// Professional-network profile URL; the identity key.
  pub profile_url:         String,
  pub name:                String,
  pub title:               Option<String>,
  /// The resolved [`Company`](crate::company::Company), if any.
  pub company_id:          Option<i64>,
  /// Employer name exactly as the importing source gave it.
  pub current_company:     Option<String>,
  pub employer:            EmployerInfo,
  pub location:            Location,
  pub contact:             ContactInfo,
  pub birth_year:          Option<i32>,
  pub profile_picture_url: Option<String>,
  pub status:              Option<String>,
  pub suppressed:          bool,
  pub category:            Option<String>,
  pub enrichment:          EnrichmentData,
  pub is_enriched:         bool,
}

impl EmployeeRecord {
  /// Convenience constructor with every optional field empty.
  pub fn new(profile_url: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      profile_url: profile_url.into(),
      name: name.into(),
      ..Self::default()
    }
  }

  /// The employer name to present to the people-search service: the
  /// importing source's name first, then whatever the service reported.
  pub fn employer_name(&self) -> Option<&str> {
    fn non_empty(s: Option<&str>) -> Option<&str> { s.map(str::trim).filter(|s| !s.is_empty()) }
    non_empty(self.current_company.as_deref()).or_else(|| non_empty(self.employer.name.as_deref()))
  }
}

/// A persisted employee row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
  pub employee_id: i64,
  #[serde(flatten)]
  pub record:      EmployeeRecord,
}

/// A derived job-history row, one per [`JobHistoryEntry`] of an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHistoryRow {
  pub employee_id:  i64,
  /// Set when `company_name` matched an existing company.
  pub company_id:   Option<i64>,
  pub company_name: Option<String>,
  pub title:        Option<String>,
  pub start_date:   Option<String>,
  pub end_date:     Option<String>,
  pub is_current:   bool,
}

/// Aggregate counts over the employee table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeCounts {
  pub total:    u64,
  pub enriched: u64,
}

impl EmployeeCounts {
  pub fn unenriched(&self) -> u64 { self.total.saturating_sub(self.enriched) }
}
