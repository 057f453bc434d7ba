//! The sequencing engine: walks a schedule against a clock and emits exactly
//! one (context, payload) pair per elapsed trigger boundary.

use std::fmt;
use std::sync::atomic::Ordering as AtomicOrdering;
use std::sync::Arc;
use std::time::Instant as StdInstant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::clock::Clock;
use crate::message::MessageContext;
use crate::metrics::GeneratorMetrics;
use crate::schedule::Schedule;

/// Per-entry sequencing state: the next due instant, if any.
///
/// A cursor advances monotonically, and always from the *scheduled* instant
/// of the boundary just delivered, never from "now" — late polls therefore
/// never shift the cadence of subsequent firings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cursor {
  /// Not yet primed; resolves on the next poll.
  Unprimed,
  /// The next boundary this entry is due at.
  Next(DateTime<Utc>),
  /// The trigger is exhausted; the entry is never polled again.
  Retired,
}

impl Cursor {
  pub fn is_retired(&self) -> bool {
    matches!(self, Cursor::Retired)
  }

  pub fn next_due(&self) -> Option<DateTime<Utc>> {
    match self {
      Cursor::Next(at) => Some(*at),
      _ => None,
    }
  }
}

/// Walks a [`Schedule`] against a [`Clock`], producing the due set for each
/// poll while keeping every trigger's cursor accurate and drift-free.
///
/// Construction is the explicit anchor-resolution moment: the start instant
/// is captured from the clock once and every trigger receives it via
/// [`Trigger::on_start`](crate::trigger::Trigger::on_start). Cursors prime
/// lazily, on first poll, from that start instant — not from the poll
/// instant — so boundaries that elapsed between start and first poll are
/// enumerated, not dropped.
///
/// `poll()` is synchronous, never blocks, and is not re-entrant; concurrent
/// callers must serialize access (the transport wraps the generator in a
/// mutex for exactly this reason). Deciding *when* to poll is the caller's
/// concern; the generator has no notion of waiting.
pub struct MessageGenerator<M> {
  schedule: Schedule<M>,
  clock: Arc<dyn Clock>,
  started_at: DateTime<Utc>,
  cursors: Vec<Cursor>,
  metrics: GeneratorMetrics,
}

impl<M: Clone> MessageGenerator<M> {
  pub fn new(schedule: Schedule<M>, clock: Arc<dyn Clock>) -> Self {
    let started_at = clock.now();
    for entry in schedule.iter() {
      entry.trigger().on_start(started_at);
    }
    let metrics = GeneratorMetrics::new();
    metrics
      .entries_active_current
      .store(schedule.len(), AtomicOrdering::Relaxed);
    debug!(schedule = %schedule.describe(), %started_at, "Message generator started.");
    Self {
      cursors: vec![Cursor::Unprimed; schedule.len()],
      schedule,
      clock,
      started_at,
      metrics,
    }
  }

  /// Computes the due set for this poll: every elapsed boundary of every
  /// non-retired entry, each with its own context and historical scheduled
  /// instant.
  ///
  /// One "now" snapshot is taken at the start of the poll; the due set is
  /// internally consistent no matter how long the poll takes. A poll that
  /// skipped several boundaries (paused process, slow poll cadence) yields
  /// one pair per missed boundary — nothing is collapsed, nothing is lost.
  /// An immediate re-poll at the same instant yields nothing.
  ///
  /// # Panics
  ///
  /// Panics if a trigger returns a non-terminal instant `<=` its input.
  /// That is a defect in the trigger, and looping on it would poll forever.
  pub fn poll(&mut self) -> Vec<(MessageContext, M)> {
    let poll_started = StdInstant::now();
    let now = self.clock.now();
    let started_at = self.started_at;
    let mut due = Vec::new();

    for (entry, cursor) in self.schedule.messages().iter().zip(self.cursors.iter_mut()) {
      if matches!(cursor, Cursor::Unprimed) {
        *cursor = match entry.trigger().next_run(started_at) {
          Some(first) => Cursor::Next(first),
          None => {
            debug!(message = %entry.describe(), "Trigger exhausted before its first boundary.");
            self
              .metrics
              .triggers_retired_total
              .fetch_add(1, AtomicOrdering::Relaxed);
            Cursor::Retired
          }
        };
      }

      loop {
        let scheduled = match *cursor {
          Cursor::Next(at) if at <= now => at,
          _ => break,
        };
        let context = MessageContext::new(entry.id(), entry.trigger_arc().clone(), scheduled);
        if entry.has_provider() {
          self
            .metrics
            .providers_invoked_total
            .fetch_add(1, AtomicOrdering::Relaxed);
        }
        let payloads = entry.payloads_for(&context);
        trace!(
          message = %entry.describe(),
          %scheduled,
          payloads = payloads.len(),
          "Boundary due."
        );
        for payload in payloads {
          due.push((context.clone(), payload));
        }

        // Advance from the scheduled boundary, never from `now`.
        match entry.trigger().next_run(scheduled) {
          Some(next) => {
            if next <= scheduled {
              panic!(
                "trigger '{}' violated monotonic progress: next_run({}) returned {}",
                entry.trigger().describe(),
                scheduled,
                next
              );
            }
            *cursor = Cursor::Next(next);
          }
          None => {
            debug!(message = %entry.describe(), last = %scheduled, "Trigger exhausted; retiring cursor.");
            self
              .metrics
              .triggers_retired_total
              .fetch_add(1, AtomicOrdering::Relaxed);
            *cursor = Cursor::Retired;
          }
        }
      }
    }

    let active = self.cursors.iter().filter(|c| !c.is_retired()).count();
    self
      .metrics
      .entries_active_current
      .store(active, AtomicOrdering::Relaxed);
    self.metrics.polls_total.fetch_add(1, AtomicOrdering::Relaxed);
    self
      .metrics
      .messages_generated_total
      .fetch_add(due.len(), AtomicOrdering::Relaxed);
    self.metrics.poll_duration.record(poll_started.elapsed());
    trace!(%now, due = due.len(), "Poll complete.");
    due
  }

  /// The current per-entry cursor states, in schedule order.
  pub fn cursors(&self) -> &[Cursor] {
    &self.cursors
  }

  /// Replaces the cursor states wholesale, typically with a record read
  /// back from a durable cache. A record whose length disagrees with the
  /// schedule is adjusted: surplus entries are dropped, missing ones prime
  /// fresh on the next poll.
  pub fn restore_cursors(&mut self, mut cursors: Vec<Cursor>) {
    let expected = self.schedule.len();
    if cursors.len() != expected {
      warn!(
        schedule = %self.schedule.name(),
        recorded = cursors.len(),
        expected,
        "Cursor record length disagrees with schedule; adjusting."
      );
      cursors.resize(expected, Cursor::Unprimed);
    }
    self.cursors = cursors;
    self
      .metrics
      .cursors_restored_total
      .fetch_add(1, AtomicOrdering::Relaxed);
  }

  pub fn schedule(&self) -> &Schedule<M> {
    &self.schedule
  }

  /// The instant this generator captured as the schedule start.
  pub fn started_at(&self) -> DateTime<Utc> {
    self.started_at
  }

  /// A handle onto this generator's metrics; clones share the same
  /// underlying atomics.
  pub fn metrics(&self) -> GeneratorMetrics {
    self.metrics.clone()
  }

  pub fn describe(&self) -> String {
    format!("message generator over {}", self.schedule.describe())
  }
}

impl<M> fmt::Debug for MessageGenerator<M> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MessageGenerator")
      .field("schedule", &self.schedule)
      .field("started_at", &self.started_at)
      .field("cursors", &self.cursors)
      .finish()
  }
}
