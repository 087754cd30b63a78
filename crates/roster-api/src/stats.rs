//! `GET /stats`

use std::sync::Arc;

use axum::{Json, extract::State};
use roster_core::store::RosterStore;
use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct Stats {
  pub companies:  usize,
  pub employees:  u64,
  pub enriched:   u64,
  pub unenriched: u64,
}

pub async fn handler<S: RosterStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Stats>, ApiError> {
  let counts = store.employee_counts().await.map_err(ApiError::store)?;
  let companies = store.list_companies().await.map_err(ApiError::store)?.len();
  Ok(Json(Stats {
    companies,
    employees: counts.total,
    enriched: counts.enriched,
    unenriched: counts.unenriched(),
  }))
}
