//! Error types for the roster-import codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("malformed CSV: {0}")]
  Csv(#[from] csv::Error),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
