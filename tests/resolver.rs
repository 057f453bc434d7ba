//! tests/resolver.rs
//! `schedule://` DSN resolution.

mod common;

use std::sync::Arc;

use metronome::{
  CursorCache, LocalLockBackend, MemoryCache, ResolveError, Transport, TransportFactory,
};

use crate::common::{clock_at_t0, interval_from_t0, secs, setup_tracing, single_entry_schedule, t0};

fn factory_with_reports(clock: Arc<metronome::ManualClock>) -> TransportFactory<String> {
  let mut factory = TransportFactory::new().with_clock(clock);
  factory.register_schedule(single_entry_schedule(
    "reports",
    Arc::new(interval_from_t0(5)),
    "tick",
  ));
  factory
}

#[test]
fn resolves_a_registered_schedule() {
  setup_tracing();
  let clock = clock_at_t0();
  let factory = factory_with_reports(clock.clone());

  let transport = factory.create("schedule://reports").unwrap();
  clock.set(t0() + secs(6));
  let envelopes = transport.get().unwrap();
  assert_eq!(envelopes.len(), 1);
  assert_eq!(envelopes[0].payload, "tick");
}

#[test]
fn resolves_durable_options_against_registered_backends() {
  let clock = clock_at_t0();
  let mut factory = factory_with_reports(clock.clone());
  let cache = Arc::new(MemoryCache::new());
  factory.register_cache("app", cache.clone());
  factory.register_lock("app", Arc::new(LocalLockBackend::new()));

  let transport = factory
    .create("schedule://reports?cache=app&lock=app")
    .unwrap();
  clock.set(t0() + secs(6));
  assert_eq!(transport.get().unwrap().len(), 1);
  // The cursor record landed in the registered cache.
  assert!(cache.get("schedule:reports:cursors").is_some());
}

#[test]
fn malformed_dsns_are_rejected() {
  let factory = factory_with_reports(clock_at_t0());
  for dsn in [
    "redis://reports",
    "schedule://",
    "schedule://a/b",
    "schedule://reports?cache",
    "schedule://reports?cache=",
  ] {
    assert!(
      matches!(factory.create(dsn), Err(ResolveError::InvalidDsn(ref v)) if v == dsn),
      "dsn '{}'",
      dsn
    );
  }
}

#[test]
fn unknown_values_are_named_in_errors() {
  let factory = factory_with_reports(clock_at_t0());

  assert_eq!(
    factory.create("schedule://nightly").unwrap_err(),
    ResolveError::UnknownSchedule("nightly".to_string())
  );
  assert_eq!(
    factory.create("schedule://reports?mode=eager").unwrap_err(),
    ResolveError::UnknownOption("mode".to_string())
  );
  assert_eq!(
    factory
      .create("schedule://reports?cache=missing&lock=missing")
      .unwrap_err(),
    ResolveError::UnknownCache("missing".to_string())
  );
}

#[test]
fn durable_options_must_come_paired() {
  let mut factory = factory_with_reports(clock_at_t0());
  factory.register_cache("app", Arc::new(MemoryCache::new()));

  assert_eq!(
    factory.create("schedule://reports?cache=app").unwrap_err(),
    ResolveError::IncompleteDurableOptions
  );
  assert_eq!(
    factory.create("schedule://reports?lock=app").unwrap_err(),
    ResolveError::IncompleteDurableOptions
  );
}

#[test]
fn unknown_lock_backend_is_named() {
  let mut factory = factory_with_reports(clock_at_t0());
  factory.register_cache("app", Arc::new(MemoryCache::new()));

  assert_eq!(
    factory
      .create("schedule://reports?cache=app&lock=nowhere")
      .unwrap_err(),
    ResolveError::UnknownLock("nowhere".to_string())
  );
}
