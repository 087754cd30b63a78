//! Read-only JSON API for Roster.
//!
//! Exposes an axum [`Router`] backed by any [`roster_core::store::RosterStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", roster_api::api_router(store.clone()))
//! ```

pub mod companies;
pub mod employees;
pub mod error;
pub mod stats;

use std::sync::Arc;

use axum::{Router, routing::get};
use roster_core::store::RosterStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RosterStore + 'static,
{
  Router::new()
    // Companies
    .route("/companies", get(companies::list::<S>))
    .route("/companies/{name}", get(companies::get_one::<S>))
    .route("/companies/{name}/employees", get(companies::employees::<S>))
    // Employees
    .route("/employees/{id}", get(employees::get_one::<S>))
    .route("/employees/{id}/job-history", get(employees::job_history::<S>))
    // Stats
    .route("/stats", get(stats::handler::<S>))
    .with_state(store)
}
