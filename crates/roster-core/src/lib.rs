//! Core types and trait definitions for the Roster identity store.
//!
//! No HTTP or database dependencies; every other crate in the workspace
//! builds on these types.

// Trait futures carry explicit `Send` bounds where callers need them.
#![allow(async_fn_in_trait)]

pub mod company;
pub mod employee;
pub mod error;
pub mod merge;
pub mod resolve;
pub mod store;

pub use error::{Error, Result};
pub use store::StoreError;
