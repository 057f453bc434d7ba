//! Metronome: A Recurring-Trigger and Due-Message Generation Engine
//!
//! Computes precisely when each of a set of independently-configured
//! recurring messages is next due and emits exactly one unit of work per
//! elapsed time boundary, regardless of how irregularly the engine is
//! polled. Delivery is lossless (no missed firings) and non-duplicating
//! (no double firings) under arbitrary poll cadence and process restarts.
//!
//! # Features
//!
//! - Triggers computing the next due instant:
//!   - Fixed intervals with sub-second precision and drift-free,
//!     closed-form boundary arithmetic ([`IntervalTrigger`], [`every`]).
//!   - Calendar steps (years/months/days) over a bounded date range
//!     ([`CalendarTrigger`]).
//!   - CRON expressions, minute-aligned ([`CronTrigger`], requires the
//!     `cron_trigger` feature, enabled by default).
//!   - One-shot instants ([`OnceTrigger`]) and caller-defined callbacks
//!     ([`CallbackTrigger`]).
//! - Decorator triggers wrapping an inner trigger: randomized jitter
//!   ([`JitterTrigger`]) and blackout windows ([`ExcludeWindowTrigger`]),
//!   with chain introspection ([`decorator_chain`], [`innermost`]).
//! - Fixed or computed-at-fire-time payloads ([`MessageProvider`],
//!   [`CallbackProvider`]).
//! - A polled sequencing engine ([`MessageGenerator`]) that enumerates
//!   every elapsed boundary — a poll skipped across seven boundaries
//!   yields seven firings, each stamped with its own historical instant.
//! - A pull-based queue adapter ([`ScheduleTransport`]) for generic worker
//!   pools, optionally backed by a durable, lock-coordinated cursor store
//!   ([`DurableState`]) for multi-process deployments.
//! - `schedule://` DSN resolution ([`TransportFactory`]).
//! - Injected clock ([`Clock`], [`SystemClock`], [`ManualClock`]) so the
//!   whole engine is deterministic under test.
//! - Metrics snapshots ([`GeneratorMetrics`], [`MetricsSnapshot`]) and
//!   `tracing` integration for observability.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use metronome::{
//!   every, MessageGenerator, RecurringMessage, Schedule, ScheduleTransport,
//!   SystemClock, Transport,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   let mut schedule = Schedule::new("reports");
//!   schedule.add(RecurringMessage::new(
//!     Arc::new(every("15m")?),
//!     "generate-report".to_string(),
//!   ));
//!
//!   let generator = MessageGenerator::new(schedule, Arc::new(SystemClock));
//!   let transport = ScheduleTransport::new(generator);
//!
//!   // Polling cadence is the caller's choice; the engine never waits.
//!   loop {
//!     for envelope in transport.get()? {
//!       println!("due at {}: {}", envelope.stamp.scheduled_at, envelope.payload);
//!       transport.ack(&envelope)?;
//!     }
//!     std::thread::sleep(std::time::Duration::from_secs(1));
//!   }
//! }
//! ```
//!
//! # Delivery semantics
//!
//! Each recurring message owns a cursor: its next due instant. A poll takes
//! one "now" snapshot, emits every cursor boundary `<= now` (each with a
//! fresh [`MessageContext`] carrying the boundary's own instant), and
//! advances the cursor from the *scheduled* instant — never from "now" — so
//! late or irregular polling cannot shift the long-run cadence. A trigger
//! returning `None` retires its cursor permanently; the entry stays
//! enumerable but is never polled again.
//!
//! # Multi-process deployments
//!
//! Attach a [`DurableState`] (a [`CursorCache`] plus a [`LockBackend`]) to
//! the transport and every poll runs read-cursors, poll, write-cursors under
//! the schedule's named lock: restarts resume from the last confirmed
//! cursors, and a given named schedule is advanced by at most one process at
//! a time. Lock contention is not an error — the contended poll yields an
//! empty due set and the next cycle retries.

// Declare modules within the crate
pub mod clock;
pub mod error;
pub mod generator;
pub mod message;
pub mod metrics;
pub mod resolver;
pub mod schedule;
pub mod state;
pub mod transport;
pub mod trigger;

// --- Public Re-exports ---

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ResolveError, TransportError, TriggerError};
pub use generator::{Cursor, MessageGenerator};
pub use message::{CallbackProvider, MessageContext, MessageProvider, RecurringMessage};
pub use metrics::{GeneratorMetrics, MetricsSnapshot};
pub use resolver::TransportFactory;
pub use schedule::Schedule;
pub use state::{CursorCache, DurableState, LocalLockBackend, LockBackend, LockGuard, MemoryCache};
pub use transport::{Envelope, ScheduleTransport, ScheduledStamp, Transport};
#[cfg(feature = "cron_trigger")]
pub use trigger::CronTrigger;
pub use trigger::{
  decorator_chain, every, innermost, CalendarStep, CalendarTrigger, CallbackTrigger,
  DecoratedTrigger, ExcludeWindowTrigger, IntervalSpec, IntervalTrigger, JitterTrigger,
  OnceTrigger, Trigger,
};
