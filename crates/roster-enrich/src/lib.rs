//! Enrichment pipeline for Roster.
//!
//! - [`executor`]: sends requests to the people-search service, waiting out
//!   HTTP 429 responses.
//! - [`client`]: the [`PeopleSearch`](client::PeopleSearch) seam and its HTTP
//!   implementation.
//! - [`orchestrator`]: the per-employee lookup/poll state machine.
//! - [`sweep`]: the batch driver that enriches everything not yet enriched.
//! - [`ingest`]: CSV and discovery ingestion into the store.
//! - [`pace`]: sleeping and pacing, injectable for tests.

pub mod client;
pub mod error;
pub mod executor;
pub mod ingest;
pub mod orchestrator;
pub mod pace;
pub mod sweep;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
