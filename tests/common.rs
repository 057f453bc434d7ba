//! tests/common.rs
//! Shared helper functions for integration tests.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, TimeZone, Utc};
use metronome::{IntervalTrigger, ManualClock, RecurringMessage, Schedule};
use tracing_subscriber::fmt::TestWriter;

// Initializes tracing subscriber for test output.
pub fn setup_tracing() {
  // Use try_init to avoid panic if called multiple times
  let _ = tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_writer(TestWriter::new())
    .with_test_writer()
    .try_init();
}

// A fixed, readable reference instant shared by the time-arithmetic tests.
pub fn t0() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
}

pub fn secs(n: i64) -> chrono::Duration {
  chrono::Duration::seconds(n)
}

// An interval trigger firing every `n` seconds, anchored at t0().
pub fn interval_from_t0(n: u64) -> IntervalTrigger {
  IntervalTrigger::new(StdDuration::from_secs(n))
    .unwrap()
    .starting_at(t0())
}

// A one-entry schedule delivering a fixed string payload on the given trigger.
pub fn single_entry_schedule(
  name: &str,
  trigger: Arc<dyn metronome::Trigger>,
  payload: &str,
) -> Schedule<String> {
  Schedule::new(name).with(RecurringMessage::new(trigger, payload.to_string()))
}

// A manual clock starting at t0().
pub fn clock_at_t0() -> Arc<ManualClock> {
  Arc::new(ManualClock::new(t0()))
}
