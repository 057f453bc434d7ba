use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use tracing::warn;

/// Source of the current instant.
///
/// The engine never reads wall-clock time ambiently; every component that
/// needs "now" is handed a `Clock`, which keeps polling deterministic under
/// test.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock (UTC).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// A clock that only moves when told to.
///
/// Intended for tests and simulations: set an exact instant with [`set`],
/// or move forward with [`advance`].
///
/// [`set`]: ManualClock::set
/// [`advance`]: ManualClock::advance
#[derive(Debug)]
pub struct ManualClock {
  now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
  pub fn new(start: DateTime<Utc>) -> Self {
    Self {
      now: Mutex::new(start),
    }
  }

  /// Moves the clock to an exact instant. Moving backwards is allowed; the
  /// engine itself never requires a monotonic clock, only monotonic cursors.
  pub fn set(&self, instant: DateTime<Utc>) {
    *self.now.lock() = instant;
  }

  /// Moves the clock forward by `delta`.
  pub fn advance(&self, delta: StdDuration) {
    match ChronoDuration::from_std(delta) {
      Ok(delta) => {
        let mut now = self.now.lock();
        *now += delta;
      }
      Err(e) => {
        warn!(?delta, error = %e, "Failed to convert advance duration; clock unchanged.");
      }
    }
  }
}

impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    *self.now.lock()
  }
}
