//! The merge policy applied whenever an incoming record meets a stored one.
//!
//! Ingestion, enrichment and company resolution all go through these pure
//! functions so a single rule decides what survives an overwrite.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
  Error,
  company::{Company, NewCompany},
  employee::{
    ContactInfo, EmployeeRecord, EmployerInfo, EnrichmentData, Location,
  },
};

/// How an incoming employee record is combined with an existing row that has
/// the same profile URL.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
  /// Never overwrite a non-empty stored field with an empty incoming one.
  #[default]
  PreferNonEmpty,
  /// Overwrite the entire row with the incoming record.
  Replace,
}

impl MergePolicy {
  pub fn apply(
    self,
    existing: &EmployeeRecord,
    incoming: EmployeeRecord,
  ) -> EmployeeRecord {
    match self {
      Self::PreferNonEmpty => merge_employee(existing, incoming),
      Self::Replace => incoming,
    }
  }
}

impl FromStr for MergePolicy {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
      "prefer_non_empty" => Ok(Self::PreferNonEmpty),
      "replace" => Ok(Self::Replace),
      other => Err(Error::UnknownMergePolicy(other.to_owned())),
    }
  }
}

// ─── Field rules ─────────────────────────────────────────────────────────────

fn text(existing: &Option<String>, incoming: Option<String>) -> Option<String> {
  match incoming {
    Some(s) if !s.trim().is_empty() => Some(s),
    _ => existing.clone(),
  }
}

fn required_text(existing: &str, incoming: String) -> String {
  if incoming.trim().is_empty() { existing.to_owned() } else { incoming }
}

fn list<T: Clone>(existing: &[T], incoming: Vec<T>) -> Vec<T> {
  if incoming.is_empty() { existing.to_vec() } else { incoming }
}

// ─── Employees ───────────────────────────────────────────────────────────────

/// Combine `incoming` into `existing`: non-empty incoming values win, empty
/// ones never erase what is stored. `is_enriched` and `suppressed` only ever
/// move from `false` to `true`.
pub fn merge_employee(
  existing: &EmployeeRecord,
  incoming: EmployeeRecord,
) -> EmployeeRecord {
  let EmployeeRecord {
    profile_url,
    name,
    title,
    company_id,
    current_company,
    employer,
    location,
    contact,
    birth_year,
    profile_picture_url,
    status,
    suppressed,
    category,
    enrichment,
    is_enriched,
  } = incoming;

  EmployeeRecord {
    profile_url:         required_text(&existing.profile_url, profile_url),
    name:                required_text(&existing.name, name),
    title:               text(&existing.title, title),
    company_id:          company_id.or(existing.company_id),
    current_company:     text(&existing.current_company, current_company),
    employer:            merge_employer(&existing.employer, employer),
    location:            merge_location(&existing.location, location),
    contact:             merge_contact(&existing.contact, contact),
    birth_year:          birth_year.or(existing.birth_year),
    profile_picture_url: text(&existing.profile_picture_url, profile_picture_url),
    status:              text(&existing.status, status),
    suppressed:          existing.suppressed || suppressed,
    category:            text(&existing.category, category),
    enrichment:          merge_enrichment(&existing.enrichment, enrichment),
    is_enriched:         existing.is_enriched || is_enriched,
  }
}

fn merge_employer(existing: &EmployerInfo, incoming: EmployerInfo) -> EmployerInfo {
  EmployerInfo {
    name:        text(&existing.name, incoming.name),
    website:     text(&existing.website, incoming.website),
    domain:      text(&existing.domain, incoming.domain),
    external_id: incoming.external_id.or(existing.external_id),
    profile_url: text(&existing.profile_url, incoming.profile_url),
  }
}

fn merge_location(existing: &Location, incoming: Location) -> Location {
  Location {
    location:     text(&existing.location, incoming.location),
    city:         text(&existing.city, incoming.city),
    region:       text(&existing.region, incoming.region),
    country:      text(&existing.country, incoming.country),
    country_code: text(&existing.country_code, incoming.country_code),
    latitude:     incoming.latitude.or(existing.latitude),
    longitude:    incoming.longitude.or(existing.longitude),
  }
}

fn merge_contact(existing: &ContactInfo, incoming: ContactInfo) -> ContactInfo {
  ContactInfo {
    phone_numbers:       list(&existing.phone_numbers, incoming.phone_numbers),
    emails:              list(&existing.emails, incoming.emails),
    personal_emails:     list(&existing.personal_emails, incoming.personal_emails),
    professional_emails: list(&existing.professional_emails, incoming.professional_emails),
  }
}

/// Per-list merge of enrichment payloads.
pub fn merge_enrichment(
  existing: &EnrichmentData,
  incoming: EnrichmentData,
) -> EnrichmentData {
  EnrichmentData {
    education:   list(&existing.education, incoming.education),
    job_history: list(&existing.job_history, incoming.job_history),
    skills:      list(&existing.skills, incoming.skills),
  }
}

// ─── Companies ───────────────────────────────────────────────────────────────

/// Apply `incoming`'s descriptive attributes to `existing`.
///
/// Returns `None` when nothing would change, so callers can skip the write.
pub fn merge_company(existing: &Company, incoming: &NewCompany) -> Option<Company> {
  let merged = Company {
    company_id:  existing.company_id,
    name:        existing.name.clone(),
    website:     text(&existing.website, incoming.website.clone()),
    domain:      text(&existing.domain, incoming.domain.clone()),
    profile_url: text(&existing.profile_url, incoming.profile_url.clone()),
  };
  (merged != *existing).then_some(merged)
}
