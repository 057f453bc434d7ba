//! tests/decorators.rs
//! Jitter and blackout-window decorators, plus chain introspection.

mod common;

use std::sync::Arc;

use metronome::{
  decorator_chain, innermost, CallbackTrigger, ExcludeWindowTrigger, JitterTrigger, OnceTrigger,
  Trigger, TriggerError,
};
use std::time::Duration as StdDuration;

use crate::common::{interval_from_t0, secs, setup_tracing, t0};

#[test]
fn jitter_bound_law() {
  setup_tracing();
  let inner = Arc::new(interval_from_t0(30));
  let max = StdDuration::from_secs(10);
  let jittered = JitterTrigger::new(inner.clone(), max).unwrap();

  for i in 0..100 {
    let reference = t0() + secs(i);
    let base = inner.next_run(reference).unwrap();
    let next = jittered.next_run(reference).unwrap();
    assert!(next >= base, "jitter must never fire early");
    assert!(next <= base + secs(10), "jitter must stay within its bound");
  }
}

#[test]
fn zero_jitter_is_passthrough() {
  let inner = Arc::new(interval_from_t0(30));
  let jittered = JitterTrigger::new(inner.clone(), StdDuration::ZERO).unwrap();
  assert_eq!(jittered.next_run(t0()), inner.next_run(t0()));
}

#[test]
fn jitter_preserves_terminality() {
  let inner = Arc::new(OnceTrigger::new(t0() + secs(5)));
  let jittered = JitterTrigger::new(inner, StdDuration::from_secs(60)).unwrap();
  assert!(jittered.next_run(t0()).is_some());
  assert_eq!(jittered.next_run(t0() + secs(5)), None);
}

#[test]
fn exclude_window_law() {
  let from = t0() + secs(60);
  let until = t0() + secs(120);
  let inner = Arc::new(interval_from_t0(25));
  let excluded = ExcludeWindowTrigger::new(inner, from, until).unwrap();

  // Whatever the reference, the result never lands inside [from, until).
  for i in 0..200 {
    let reference = t0() + secs(i);
    if let Some(next) = excluded.next_run(reference) {
      assert!(
        next < from || next >= until,
        "firing at {} falls inside the blackout window",
        next
      );
    }
  }
}

#[test]
fn exclude_window_defers_to_window_end() {
  let from = t0() + secs(60);
  let until = t0() + secs(120);
  // Inner fires at t0+75, inside the window; the deferred firing is the
  // inner trigger's first boundary after the window end: t0+125.
  let inner = Arc::new(interval_from_t0(25));
  let excluded = ExcludeWindowTrigger::new(inner, from, until).unwrap();
  assert_eq!(excluded.next_run(t0() + secs(50)), Some(t0() + secs(125)));
}

#[test]
fn exclude_window_boundary_instants() {
  let from = t0() + secs(60);
  let until = t0() + secs(120);
  // A firing exactly at `until` is outside the half-open window.
  let at_until = Arc::new(OnceTrigger::new(until));
  let excluded = ExcludeWindowTrigger::new(at_until, from, until).unwrap();
  assert_eq!(excluded.next_run(t0()), Some(until));

  // A firing exactly at `from` is inside and gets deferred; the one-shot has
  // nothing after the window, so the decorator is terminal too.
  let at_from = Arc::new(OnceTrigger::new(from));
  let excluded = ExcludeWindowTrigger::new(at_from, from, until).unwrap();
  assert_eq!(excluded.next_run(t0()), None);
}

#[test]
fn exclude_window_skip_is_single_pass() {
  let from = t0() + secs(60);
  let until = t0() + secs(120);
  // An inner trigger that answers queries from the window end with another
  // in-window instant (as a recurring blackout occurrence would). The skip
  // anchors once at `until` and returns that answer as-is.
  let perverse = Arc::new(CallbackTrigger::new("window hugger", move |after| {
    if after >= until {
      Some(after + secs(1))
    } else {
      Some(from + secs(10))
    }
  }));
  let excluded = ExcludeWindowTrigger::new(perverse, from, until).unwrap();
  assert_eq!(excluded.next_run(t0()), Some(until + secs(1)));
}

#[test]
fn empty_window_fails_at_construction() {
  let inner = Arc::new(interval_from_t0(5));
  assert!(matches!(
    ExcludeWindowTrigger::new(inner.clone(), t0() + secs(60), t0() + secs(60)),
    Err(TriggerError::EmptyWindow { .. })
  ));
  assert!(matches!(
    ExcludeWindowTrigger::new(inner, t0() + secs(60), t0()),
    Err(TriggerError::EmptyWindow { .. })
  ));
}

#[test]
fn decorator_chain_enumerates_outer_to_inner() {
  let base = Arc::new(interval_from_t0(30));
  let excluded = Arc::new(
    ExcludeWindowTrigger::new(base.clone(), t0() + secs(60), t0() + secs(120)).unwrap(),
  );
  let jittered = JitterTrigger::new(excluded, StdDuration::from_secs(5)).unwrap();

  let descriptions: Vec<String> = decorator_chain(&jittered)
    .map(|trigger| trigger.describe())
    .collect();
  assert_eq!(descriptions.len(), 3);
  assert!(descriptions[0].contains("jitter"));
  assert!(descriptions[1].contains("except between"));
  assert_eq!(descriptions[2], base.describe());

  assert_eq!(innermost(&jittered).describe(), base.describe());
  // A bare trigger is its own innermost, with a one-element chain.
  assert_eq!(decorator_chain(base.as_ref()).count(), 1);
  assert_eq!(innermost(base.as_ref()).describe(), base.describe());
}

#[test]
fn descriptions_compose_through_the_chain() {
  let base = Arc::new(interval_from_t0(60));
  let jittered =
    JitterTrigger::new(base.clone(), StdDuration::from_secs(45)).unwrap();
  let description = jittered.describe();
  assert!(description.starts_with(&base.describe()));
  assert!(description.ends_with("with 0-45s jitter"));
}

#[test]
fn decorators_forward_on_start() {
  // Unanchored inner; the start notification must travel through both
  // decorator layers. Zero jitter keeps the arithmetic exact.
  let inner = Arc::new(metronome::IntervalTrigger::new(StdDuration::from_secs(5)).unwrap());
  let excluded = Arc::new(
    ExcludeWindowTrigger::new(inner.clone(), t0() + secs(600), t0() + secs(660)).unwrap(),
  );
  let jittered = JitterTrigger::new(excluded, StdDuration::ZERO).unwrap();

  jittered.on_start(t0());
  assert_eq!(inner.anchor(), Some(t0()));
  assert_eq!(jittered.next_run(t0() + secs(12)), Some(t0() + secs(15)));
}
