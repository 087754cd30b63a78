//! Rate-limited request execution.
//!
//! [`RetryExecutor`] sends a request and, while the service answers 429, waits
//! as instructed and sends it again up to a fixed attempt budget. Any other
//! failure is returned to the caller untouched.

use std::time::Duration;

use reqwest::{Client, Request, Response, StatusCode, header::RETRY_AFTER};
use tracing::{debug, warn};

use crate::{
  Error, Result,
  pace::{Sleeper, TokioSleeper},
};

/// How often to retry a rate-limited request and how long to wait when the
/// service does not say.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total attempts, including the first.
  pub max_attempts: u32,
  pub default_wait: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self { max_attempts: 5, default_wait: Duration::from_secs(60) }
  }
}

pub struct RetryExecutor<S = TokioSleeper> {
  policy:  RetryPolicy,
  sleeper: S,
}

impl<S: Sleeper> RetryExecutor<S> {
  pub fn new(policy: RetryPolicy, sleeper: S) -> Self { Self { policy, sleeper } }

  /// Send `request`, retrying on HTTP 429.
  ///
  /// Returns the first successful response. Fails with
  /// [`Error::RetryExhausted`] once `max_attempts` responses in a row were
  /// 429; no wait follows the final one.
  pub async fn execute(&self, client: &Client, request: Request) -> Result<Response> {
    let endpoint = request.url().path().to_owned();
    let mut attempt = 1;

    loop {
      let attempt_request = request
        .try_clone()
        .ok_or_else(|| Error::UnclonableRequest(endpoint.clone()))?;
      debug!(%endpoint, attempt, "sending request");
      let response = client.execute(attempt_request).await?;
      let status = response.status();

      if status == StatusCode::TOO_MANY_REQUESTS {
        if attempt >= self.policy.max_attempts {
          warn!(%endpoint, attempts = attempt, "rate limit retries exhausted");
          return Err(Error::RetryExhausted { endpoint, attempts: attempt });
        }
        let wait = retry_after(&response).unwrap_or(self.policy.default_wait);
        warn!(%endpoint, attempt, wait_secs = wait.as_secs(), "rate limited, waiting");
        self.sleeper.sleep(wait).await;
        attempt += 1;
        continue;
      }

      if !status.is_success() {
        return Err(Error::Status { endpoint, status });
      }
      return Ok(response);
    }
  }
}

/// The `Retry-After` header as whole seconds. HTTP-date values and anything
/// unparseable read as absent.
pub fn retry_after(response: &Response) -> Option<Duration> {
  response
    .headers()
    .get(RETRY_AFTER)?
    .to_str()
    .ok()?
    .trim()
    .parse::<u64>()
    .ok()
    .map(Duration::from_secs)
}
