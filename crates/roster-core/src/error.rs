//! Error types for `roster-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown merge policy: {0:?}")]
  UnknownMergePolicy(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
