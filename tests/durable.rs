//! tests/durable.rs
//! Durable cursor coordination: restart resume, lock contention, and the
//! cross-process at-most-once guarantee.

mod common;

use std::sync::Arc;

use metronome::{
  DurableState, LocalLockBackend, LockBackend, MemoryCache, MessageGenerator, ScheduleTransport,
  Transport,
};

use crate::common::{clock_at_t0, interval_from_t0, secs, setup_tracing, single_entry_schedule, t0};

fn durable_transport(
  cache: Arc<MemoryCache>,
  lock: Arc<LocalLockBackend>,
  clock: Arc<metronome::ManualClock>,
) -> ScheduleTransport<String> {
  let schedule = single_entry_schedule("reports", Arc::new(interval_from_t0(5)), "tick");
  ScheduleTransport::new(MessageGenerator::new(schedule, clock))
    .with_durable_state(DurableState::new(cache, lock))
}

#[test]
fn restart_resumes_from_confirmed_cursors() {
  setup_tracing();
  let cache = Arc::new(MemoryCache::new());
  let lock = Arc::new(LocalLockBackend::new());
  let clock = clock_at_t0();

  // First process delivers the t0+5 boundary, persisting cursor t0+10.
  let transport = durable_transport(cache.clone(), lock.clone(), clock.clone());
  clock.set(t0() + secs(7));
  let envelopes = transport.get().unwrap();
  assert_eq!(envelopes.len(), 1);
  assert_eq!(envelopes[0].stamp.scheduled_at, t0() + secs(5));
  drop(transport);

  // Restarted process comes up much later. Without the durable record it
  // would re-anchor at "now" and silently drop the missed boundaries; with
  // it, every boundary since the confirmed cursor is delivered exactly once.
  clock.set(t0() + secs(23));
  let restarted = durable_transport(cache, lock, clock.clone());
  let instants: Vec<_> = restarted
    .get()
    .unwrap()
    .iter()
    .map(|envelope| envelope.stamp.scheduled_at)
    .collect();
  assert_eq!(
    instants,
    vec![t0() + secs(10), t0() + secs(15), t0() + secs(20)]
  );
  assert!(restarted.get().unwrap().is_empty());
}

#[test]
fn lock_contention_yields_empty_due_set() {
  let cache = Arc::new(MemoryCache::new());
  let lock = Arc::new(LocalLockBackend::new());
  let clock = clock_at_t0();
  let transport = durable_transport(cache, lock.clone(), clock.clone());

  clock.set(t0() + secs(7));

  // Someone else holds the schedule's lock; this poll degrades to empty.
  let held = lock.acquire("reports").expect("lock should be free");
  assert!(transport.get().unwrap().is_empty());
  assert_eq!(transport.metrics().snapshot().lock_contention_total, 1);

  // Releasing the lock lets the next poll deliver the boundary.
  drop(held);
  let envelopes = transport.get().unwrap();
  assert_eq!(envelopes.len(), 1);
  assert_eq!(envelopes[0].stamp.scheduled_at, t0() + secs(5));
}

#[test]
fn two_processes_fire_each_boundary_at_most_once() {
  let cache = Arc::new(MemoryCache::new());
  let lock = Arc::new(LocalLockBackend::new());
  let clock = clock_at_t0();

  let first = durable_transport(cache.clone(), lock.clone(), clock.clone());
  let second = durable_transport(cache, lock, clock.clone());

  clock.set(t0() + secs(17));
  // Whichever process polls first advances the shared cursors; the other
  // sees nothing left to deliver.
  assert_eq!(first.get().unwrap().len(), 3);
  assert!(second.get().unwrap().is_empty());

  // Later boundaries may be picked up by either process, never both.
  clock.set(t0() + secs(22));
  assert_eq!(second.get().unwrap().len(), 1);
  assert!(first.get().unwrap().is_empty());
}

#[test]
fn unreadable_cursor_record_is_discarded() {
  let cache = Arc::new(MemoryCache::new());
  let lock = Arc::new(LocalLockBackend::new());
  let clock = clock_at_t0();

  use metronome::CursorCache;
  cache.set("schedule:reports:cursors", "not json".to_string());

  let transport = durable_transport(cache.clone(), lock, clock.clone());
  clock.set(t0() + secs(7));
  // Falls back to fresh priming from the schedule start.
  let envelopes = transport.get().unwrap();
  assert_eq!(envelopes.len(), 1);
  assert_eq!(envelopes[0].stamp.scheduled_at, t0() + secs(5));
  // The bad record was overwritten with a valid one.
  assert!(cache.get("schedule:reports:cursors").unwrap().contains("Next"));
}
