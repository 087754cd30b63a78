//! Identity resolution for companies.

use crate::{
  company::{CompanyChange, NewCompany, ResolvedCompany},
  merge::merge_company,
  store::{CompanyStore, StoreError as _},
};

/// Get-or-create the company named by `input`, updating descriptive
/// attributes in place when they changed.
///
/// A blank name resolves to `Ok(None)` and creates nothing. If the insert
/// loses a race with a concurrent writer, the winner's row is re-read and
/// returned instead of failing.
pub async fn resolve_company<S>(
  store: &S,
  input: &NewCompany,
) -> Result<Option<ResolvedCompany>, S::Error>
where
  S: CompanyStore,
{
  let Some(name) = input.identity_name() else {
    return Ok(None);
  };
  let normalized = NewCompany { name: name.to_owned(), ..input.clone() };

  if let Some(existing) = store.find_company_by_name(name).await? {
    return Ok(Some(match merge_company(&existing, &normalized) {
      Some(updated) => {
        store.update_company(&updated).await?;
        ResolvedCompany { company: updated, change: CompanyChange::Updated }
      }
      None => ResolvedCompany { company: existing, change: CompanyChange::Unchanged },
    }));
  }

  match store.insert_company(&normalized).await {
    Ok(company) => Ok(Some(ResolvedCompany { company, change: CompanyChange::Created })),
    Err(e) if e.is_conflict() => match store.find_company_by_name(name).await? {
      Some(company) => Ok(Some(ResolvedCompany { company, change: CompanyChange::Recovered })),
      None => Err(e),
    },
    Err(e) => Err(e),
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  };

  use super::*;
  use crate::{company::Company, store::StoreError};

  #[derive(Debug, thiserror::Error)]
  #[error("unique constraint failed")]
  struct Conflict;

  impl StoreError for Conflict {
    fn is_conflict(&self) -> bool { true }
  }

  /// In-memory company table. With `hide_next_lookup` set, the first lookup
  /// misses as if another writer inserted between the read and the write.
  #[derive(Default)]
  struct MemoryCompanies {
    rows:             Mutex<Vec<Company>>,
    updates:          AtomicUsize,
    hide_next_lookup: AtomicBool,
  }

  impl MemoryCompanies {
    fn seeded(name: &str) -> Self {
      let store = Self::default();
      store.rows.lock().unwrap().push(Company {
        company_id:  1,
        name:        name.into(),
        website:     None,
        domain:      None,
        profile_url: None,
      });
      store
    }
  }

  impl CompanyStore for MemoryCompanies {
    type Error = Conflict;

    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, Conflict> {
      if self.hide_next_lookup.swap(false, Ordering::SeqCst) {
        return Ok(None);
      }
      Ok(self.rows.lock().unwrap().iter().find(|c| c.name.eq_ignore_ascii_case(name)).cloned())
    }

    async fn insert_company(&self, company: &NewCompany) -> Result<Company, Conflict> {
      let mut rows = self.rows.lock().unwrap();
      if rows.iter().any(|c| c.name.eq_ignore_ascii_case(&company.name)) {
        return Err(Conflict);
      }
      let row = Company {
        company_id:  rows.len() as i64 + 1,
        name:        company.name.clone(),
        website:     company.website.clone(),
        domain:      company.domain.clone(),
        profile_url: company.profile_url.clone(),
      };
      rows.push(row.clone());
      Ok(row)
    }

    async fn update_company(&self, company: &Company) -> Result<(), Conflict> {
      self.updates.fetch_add(1, Ordering::SeqCst);
      let mut rows = self.rows.lock().unwrap();
      if let Some(row) = rows.iter_mut().find(|c| c.company_id == company.company_id) {
        *row = company.clone();
      }
      Ok(())
    }

    async fn get_company(&self, company_id: i64) -> Result<Option<Company>, Conflict> {
      Ok(self.rows.lock().unwrap().iter().find(|c| c.company_id == company_id).cloned())
    }

    async fn list_companies(&self) -> Result<Vec<Company>, Conflict> {
      Ok(self.rows.lock().unwrap().clone())
    }
  }

  #[tokio::test]
  async fn blank_name_creates_nothing() {
    let store = MemoryCompanies::default();
    let resolved = resolve_company(&store, &NewCompany::named("  ")).await.unwrap();
    assert!(resolved.is_none());
    assert!(store.list_companies().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn casing_variants_resolve_to_one_row() {
    let store = MemoryCompanies::default();
    let a = resolve_company(&store, &NewCompany::named("Acme Inc")).await.unwrap().unwrap();
    let b = resolve_company(&store, &NewCompany::named("ACME INC ")).await.unwrap().unwrap();

    assert_eq!(a.change, CompanyChange::Created);
    assert_eq!(b.change, CompanyChange::Unchanged);
    assert_eq!(a.company.company_id, b.company.company_id);
    assert_eq!(store.list_companies().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn identical_attributes_issue_no_update() {
    let store = MemoryCompanies::default();
    let input = NewCompany {
      name:        "Acme Inc".into(),
      website:     Some("https://acme.test".into()),
      domain:      Some("acme.test".into()),
      profile_url: None,
    };
    resolve_company(&store, &input).await.unwrap();
    let again = resolve_company(&store, &input).await.unwrap().unwrap();

    assert_eq!(again.change, CompanyChange::Unchanged);
    assert_eq!(store.updates.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn changed_attributes_update_in_place() {
    let store = MemoryCompanies::seeded("Acme Inc");
    let input = NewCompany {
      website: Some("https://acme.test".into()),
      ..NewCompany::named("acme inc")
    };
    let resolved = resolve_company(&store, &input).await.unwrap().unwrap();

    assert_eq!(resolved.change, CompanyChange::Updated);
    assert_eq!(resolved.company.name, "Acme Inc");
    let stored = store.get_company(1).await.unwrap().unwrap();
    assert_eq!(stored.website.as_deref(), Some("https://acme.test"));
  }

  #[tokio::test]
  async fn insert_race_returns_existing_row() {
    let store = MemoryCompanies::seeded("Acme Inc");
    store.hide_next_lookup.store(true, Ordering::SeqCst);

    let resolved = resolve_company(&store, &NewCompany::named("ACME INC")).await.unwrap().unwrap();
    assert_eq!(resolved.change, CompanyChange::Recovered);
    assert_eq!(resolved.company.company_id, 1);
    assert_eq!(store.list_companies().await.unwrap().len(), 1);
  }
}
