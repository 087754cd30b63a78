//! Column mapping and normalization for a single CSV row.

use roster_core::{
  company::NewCompany,
  employee::{ContactInfo, EmployeeRecord, EmployerInfo, Location},
};
use serde::Deserialize;

use crate::{ImportRow, ImportedEmployee, Skip, SkipReason};

/// One row exactly as it appears in the export. Unknown columns are ignored
/// and absent ones read as empty.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub(crate) struct RawRow {
  name:                           Option<String>,
  #[serde(rename = "LinkedInURL")]
  linkedin_url:                   Option<String>,
  current_company:                Option<String>,
  title:                          Option<String>,
  location:                       Option<String>,
  city:                           Option<String>,
  region:                         Option<String>,
  country:                        Option<String>,
  country_code:                   Option<String>,
  phone_numbers:                  Option<String>,
  emails:                         Option<String>,
  personal_emails:                Option<String>,
  professional_emails:            Option<String>,
  birth_year:                     Option<String>,
  current_employer_website:       Option<String>,
  current_employer_domain:        Option<String>,
  current_employer_id:            Option<String>,
  #[serde(rename = "CurrentEmployerLinkedInURL")]
  current_employer_linkedin_url:  Option<String>,
  #[serde(rename = "ProfilePictureURL")]
  profile_picture_url:            Option<String>,
  region_latitude:                Option<String>,
  region_longitude:               Option<String>,
  status:                         Option<String>,
  suppressed:                     Option<String>,
  category:                       Option<String>,
}

fn text(value: Option<String>) -> Option<String> {
  value
    .map(|s| s.trim().to_owned())
    .filter(|s| !s.is_empty())
}

fn number<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
  text(value).and_then(|s| s.parse().ok())
}

/// Split a list cell on `,` or `;`, dropping blanks.
pub(crate) fn split_list(value: Option<String>) -> Vec<String> {
  value
    .as_deref()
    .unwrap_or_default()
    .split([',', ';'])
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
    .collect()
}

impl RawRow {
  pub(crate) fn normalize(self, row: usize) -> ImportRow {
    let name = text(self.name);
    let company = text(self.current_company);
    let profile_url = text(self.linkedin_url);

    let (person, company, profile_url) = match (name, company, profile_url) {
      (Some(n), Some(c), Some(u)) => (n, c, u),
      (name, company, _) => {
        let reason = match (&name, &company) {
          (None, _) => SkipReason::MissingName,
          (_, None) => SkipReason::MissingCurrentCompany,
          _ => SkipReason::MissingProfileUrl,
        };
        return ImportRow::Skipped(Skip { row, name, reason });
      }
    };

    let website = text(self.current_employer_website);
    let domain = text(self.current_employer_domain);
    let company_profile_url = text(self.current_employer_linkedin_url);

    let employer = NewCompany {
      name:        company.clone(),
      website:     website.clone(),
      domain:      domain.clone(),
      profile_url: company_profile_url.clone(),
    };

    let record = EmployeeRecord {
      profile_url,
      name: person,
      title: text(self.title),
      company_id: None,
      current_company: Some(company.clone()),
      employer: EmployerInfo {
        name: Some(company),
        website,
        domain,
        external_id: number(self.current_employer_id),
        profile_url: company_profile_url,
      },
      location: Location {
        location:     text(self.location),
        city:         text(self.city),
        region:       text(self.region),
        country:      text(self.country),
        country_code: text(self.country_code),
        latitude:     number(self.region_latitude),
        longitude:    number(self.region_longitude),
      },
      contact: ContactInfo {
        phone_numbers:       split_list(self.phone_numbers),
        emails:              split_list(self.emails),
        personal_emails:     split_list(self.personal_emails),
        professional_emails: split_list(self.professional_emails),
      },
      birth_year: number(self.birth_year),
      profile_picture_url: text(self.profile_picture_url),
      status: text(self.status),
      suppressed: text(self.suppressed).is_some_and(|s| s.eq_ignore_ascii_case("true")),
      category: text(self.category),
      ..EmployeeRecord::default()
    };

    ImportRow::Accepted(ImportedEmployee { row, record, employer })
  }
}
