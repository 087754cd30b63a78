//! Sleeping and pacing.
//!
//! Every wait in this crate goes through a [`Sleeper`], so tests can swap in
//! a recorder and observe requested delays without wall-clock time.

use std::{
  future::Future,
  sync::{
    Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
  },
  time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};

// ─── Sleeper ─────────────────────────────────────────────────────────────────

pub trait Sleeper: Send + Sync {
  fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send + '_;
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
  async fn sleep(&self, duration: Duration) { tokio::time::sleep(duration).await }
}

// ─── Throttle ────────────────────────────────────────────────────────────────

/// Paces a sequence of work items. `pause` is awaited before each item; the
/// first call never waits.
pub trait Throttle: Send + Sync {
  fn pause(&self) -> impl Future<Output = ()> + Send + '_;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Throttle for NoDelay {
  async fn pause(&self) {}
}

/// A constant courtesy delay between items, regardless of how long each item
/// took.
pub struct FixedDelay<S = TokioSleeper> {
  delay:   Duration,
  sleeper: S,
  started: AtomicBool,
}

impl<S: Sleeper> FixedDelay<S> {
  pub fn new(delay: Duration, sleeper: S) -> Self {
    Self { delay, sleeper, started: AtomicBool::new(false) }
  }
}

impl<S: Sleeper> Throttle for FixedDelay<S> {
  async fn pause(&self) {
    if self.started.swap(true, Ordering::SeqCst) && !self.delay.is_zero() {
      self.sleeper.sleep(self.delay).await;
    }
  }
}

/// Leaky-bucket pacing: successive items start at least `interval` apart.
/// Time already spent on the previous item counts towards the interval.
pub struct MinInterval<S = TokioSleeper> {
  interval:  Duration,
  sleeper:   S,
  last_tick: Mutex<Option<Instant>>,
}

impl<S: Sleeper> MinInterval<S> {
  pub fn new(interval: Duration, sleeper: S) -> Self {
    Self { interval, sleeper, last_tick: Mutex::new(None) }
  }
}

impl<S: Sleeper> Throttle for MinInterval<S> {
  async fn pause(&self) {
    let wait = {
      let last = self.last_tick.lock().unwrap_or_else(PoisonError::into_inner);
      last.map(|t| self.interval.saturating_sub(t.elapsed()))
    };
    if let Some(wait) = wait.filter(|w| !w.is_zero()) {
      self.sleeper.sleep(wait).await;
    }
    *self.last_tick.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
  }
}

// ─── Configured pacing ───────────────────────────────────────────────────────

/// The pacing strategy named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pacing {
  #[default]
  Fixed,
  MinInterval,
  None,
}

impl Pacing {
  pub fn throttle<S: Sleeper>(self, delay: Duration, sleeper: S) -> Pacer<S> {
    match self {
      Self::Fixed => Pacer::Fixed(FixedDelay::new(delay, sleeper)),
      Self::MinInterval => Pacer::MinInterval(MinInterval::new(delay, sleeper)),
      Self::None => Pacer::None(NoDelay),
    }
  }
}

/// A [`Throttle`] chosen at runtime.
pub enum Pacer<S = TokioSleeper> {
  Fixed(FixedDelay<S>),
  MinInterval(MinInterval<S>),
  None(NoDelay),
}

impl<S: Sleeper> Throttle for Pacer<S> {
  async fn pause(&self) {
    match self {
      Self::Fixed(t) => t.pause().await,
      Self::MinInterval(t) => t.pause().await,
      Self::None(t) => t.pause().await,
    }
  }
}
