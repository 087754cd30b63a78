//! Error type for `roster-enrich`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{endpoint}: still rate limited after {attempts} attempts")]
  RetryExhausted { endpoint: String, attempts: u32 },

  #[error("{endpoint}: unexpected status {status}")]
  Status { endpoint: String, status: StatusCode },

  #[error("{0}: request body cannot be replayed")]
  UnclonableRequest(String),

  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{endpoint}: malformed response: {source}")]
  Decode {
    endpoint: String,
    #[source]
    source:   serde_json::Error,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("import error: {0}")]
  Import(#[from] roster_import::Error),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

impl Error {
  pub(crate) fn store<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
