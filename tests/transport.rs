//! tests/transport.rs
//! The pull-queue contract of the schedule transport.

mod common;

use std::sync::Arc;

use metronome::{MessageGenerator, ScheduleTransport, Transport, TransportError, Trigger};

use crate::common::{clock_at_t0, interval_from_t0, secs, setup_tracing, single_entry_schedule, t0};

#[test]
fn get_wraps_due_pairs_with_scheduled_stamps() {
  setup_tracing();
  let clock = clock_at_t0();
  let trigger = Arc::new(interval_from_t0(5));
  let schedule = single_entry_schedule("reports", trigger.clone(), "tick");
  let message_id = schedule.messages()[0].id();
  let transport = ScheduleTransport::new(MessageGenerator::new(schedule, clock.clone()));

  clock.set(t0() + secs(11));
  let envelopes = transport.get().unwrap();
  assert_eq!(envelopes.len(), 2);
  assert_eq!(envelopes[0].stamp.scheduled_at, t0() + secs(5));
  assert_eq!(envelopes[1].stamp.scheduled_at, t0() + secs(10));
  for envelope in &envelopes {
    assert_eq!(envelope.payload, "tick");
    assert_eq!(envelope.stamp.message_id, message_id);
    assert_eq!(envelope.stamp.trigger, trigger.describe());
  }
}

#[test]
fn empty_due_set_yields_empty_sequence() {
  let clock = clock_at_t0();
  let schedule = single_entry_schedule("reports", Arc::new(interval_from_t0(5)), "tick");
  let transport = ScheduleTransport::new(MessageGenerator::new(schedule, clock));
  assert!(transport.get().unwrap().is_empty());
}

#[test]
fn ack_is_a_no_op_and_never_fails() {
  let clock = clock_at_t0();
  let schedule = single_entry_schedule("reports", Arc::new(interval_from_t0(5)), "tick");
  let transport = ScheduleTransport::new(MessageGenerator::new(schedule, clock.clone()));

  clock.set(t0() + secs(6));
  let envelopes = transport.get().unwrap();
  assert_eq!(envelopes.len(), 1);
  assert!(transport.ack(&envelopes[0]).is_ok());
  // Acking twice is just as meaningless, and just as harmless.
  assert!(transport.ack(&envelopes[0]).is_ok());
}

#[test]
fn reject_and_send_are_programmer_errors() {
  let clock = clock_at_t0();
  let schedule = single_entry_schedule("reports", Arc::new(interval_from_t0(5)), "tick");
  let transport = ScheduleTransport::new(MessageGenerator::new(schedule, clock.clone()));

  clock.set(t0() + secs(6));
  let envelopes = transport.get().unwrap();
  assert_eq!(
    transport.reject(&envelopes[0]).unwrap_err(),
    TransportError::RejectNotSupported
  );
  assert_eq!(
    transport.send(envelopes[0].clone()).unwrap_err(),
    TransportError::SendNotSupported
  );
}

#[test]
fn transport_never_duplicates_across_gets() {
  let clock = clock_at_t0();
  let schedule = single_entry_schedule("reports", Arc::new(interval_from_t0(5)), "tick");
  let transport = ScheduleTransport::new(MessageGenerator::new(schedule, clock.clone()));

  clock.set(t0() + secs(37));
  assert_eq!(transport.get().unwrap().len(), 7);
  assert!(transport.get().unwrap().is_empty());
}
