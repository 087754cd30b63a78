//! Company: the employer entity employees are resolved against.
//!
//! A company's identity is its trimmed name compared case-insensitively; the
//! descriptive attributes are updated in place as better values arrive.

use serde::{Deserialize, Serialize};

/// A persisted company row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
  pub company_id:  i64,
  /// Trimmed display name; unique case-insensitively.
  pub name:        String,
  pub website:     Option<String>,
  pub domain:      Option<String>,
  /// Social-profile URL of the company page.
  pub profile_url: Option<String>,
}

/// Input to company resolution and insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCompany {
  pub name:        String,
  pub website:     Option<String>,
  pub domain:      Option<String>,
  pub profile_url: Option<String>,
}

impl NewCompany {
  /// Convenience constructor with no descriptive attributes.
  pub fn named(name: impl Into<String>) -> Self {
    Self { name: name.into(), ..Self::default() }
  }

  /// The trimmed identity name, or `None` if it is blank.
  pub fn identity_name(&self) -> Option<&str> {
    let trimmed = self.name.trim();
    (!trimmed.is_empty()).then_some(trimmed)
  }
}

/// What resolution did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyChange {
  Created,
  Updated,
  Unchanged,
  /// The insert lost a race with a concurrent writer; the winner was re-read.
  Recovered,
}

/// A company together with the change resolution applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCompany {
  pub company: Company,
  pub change:  CompanyChange,
}
