//! Handlers for `/companies` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/companies` | Ordered by name |
//! | `GET`  | `/companies/{name}` | Case-insensitive; 404 if not found |
//! | `GET`  | `/companies/{name}/employees` | Linked by id or by imported name |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use roster_core::{
  company::Company,
  employee::Employee,
  store::{CompanyStore, RosterStore},
};

use crate::error::ApiError;

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /companies`
pub async fn list<S: RosterStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Company>>, ApiError> {
  let companies = store.list_companies().await.map_err(ApiError::store)?;
  Ok(Json(companies))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

async fn find<S: CompanyStore>(store: &S, name: &str) -> Result<Company, ApiError> {
  let name = name.trim();
  if name.is_empty() {
    return Err(ApiError::BadRequest("company name must not be blank".into()));
  }
  store
    .find_company_by_name(name)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("company {name:?} not found")))
}

/// `GET /companies/{name}`
pub async fn get_one<S: RosterStore>(
  State(store): State<Arc<S>>,
  Path(name): Path<String>,
) -> Result<Json<Company>, ApiError> {
  Ok(Json(find(store.as_ref(), &name).await?))
}

/// `GET /companies/{name}/employees`
pub async fn employees<S: RosterStore>(
  State(store): State<Arc<S>>,
  Path(name): Path<String>,
) -> Result<Json<Vec<Employee>>, ApiError> {
  let company = find(store.as_ref(), &name).await?;
  let employees = store
    .employees_for_company(&company)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(employees))
}
