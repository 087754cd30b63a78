//! Handlers for `/employees` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use roster_core::{
  employee::{Employee, JobHistoryRow},
  store::RosterStore,
};

use crate::error::ApiError;

fn parse_id(raw: &str) -> Result<i64, ApiError> {
  raw
    .trim()
    .parse()
    .map_err(|_| ApiError::BadRequest(format!("invalid employee id: {raw:?}")))
}

async fn find<S: RosterStore>(store: &S, id: i64) -> Result<Employee, ApiError> {
  store
    .get_employee(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("employee {id} not found")))
}

/// `GET /employees/{id}`
pub async fn get_one<S: RosterStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<Json<Employee>, ApiError> {
  let id = parse_id(&id)?;
  Ok(Json(find(store.as_ref(), id).await?))
}

/// `GET /employees/{id}/job-history`
pub async fn job_history<S: RosterStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<Json<Vec<JobHistoryRow>>, ApiError> {
  let id = parse_id(&id)?;
  find(store.as_ref(), id).await?;
  let rows = store.job_history(id).await.map_err(ApiError::store)?;
  Ok(Json(rows))
}
