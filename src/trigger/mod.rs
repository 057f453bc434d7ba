//! Trigger algebra: rules that compute the next due instant.
//!
//! A [`Trigger`] answers one question: given the last considered instant,
//! when is the next firing due? `None` means the trigger is exhausted and
//! will never be queried again. Concrete variants cover fixed intervals,
//! calendar stepping, cron expressions, one-shot targets, and caller-supplied
//! callbacks; decorators ([`JitterTrigger`], [`ExcludeWindowTrigger`]) wrap
//! an inner trigger to modify its timing without changing its cadence source.

mod calendar;
mod callback;
#[cfg(feature = "cron_trigger")]
mod cron;
mod exclude;
mod interval;
mod jitter;
mod once;

pub use calendar::{CalendarStep, CalendarTrigger};
pub use callback::CallbackTrigger;
#[cfg(feature = "cron_trigger")]
pub use cron::CronTrigger;
pub use exclude::ExcludeWindowTrigger;
pub use interval::{IntervalSpec, IntervalTrigger};
pub use jitter::JitterTrigger;
pub use once::OnceTrigger;

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::error::TriggerError;

/// A rule producing the next due instant after a reference instant.
///
/// # Contract
///
/// `next_run(after)` returns either `None` (the trigger is terminal and must
/// not be queried again) or an instant *strictly greater* than `after`.
/// Callers rely on strict progress to avoid infinite polling loops; a
/// non-terminal result `<= after` is a logic defect, not a recoverable
/// condition.
pub trait Trigger: Send + Sync {
  /// Computes the next due instant strictly after `after`, or `None` when
  /// no further firings exist.
  fn next_run(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>>;

  /// A stable, human-readable description for logs and introspection.
  /// Decorators compose their description around the inner trigger's.
  fn describe(&self) -> String;

  /// Notifies the trigger of the schedule start instant.
  ///
  /// Triggers that anchor themselves to a start instant (currently
  /// [`IntervalTrigger`]) record it here, but only if no anchor was
  /// configured explicitly; repeated calls are no-ops. Stateless triggers
  /// ignore this. Decorators forward it to their inner trigger.
  fn on_start(&self, _start: DateTime<Utc>) {}

  /// Capability hook for decorator introspection. Decorators return
  /// `Some(self)`; everything else keeps the default `None`.
  fn as_decorator(&self) -> Option<&dyn DecoratedTrigger> {
    None
  }
}

/// A trigger that delegates to and modifies an inner trigger.
pub trait DecoratedTrigger: Trigger {
  /// The directly wrapped trigger (which may itself be a decorator).
  fn inner(&self) -> &dyn Trigger;
}

/// Walks to the innermost non-decorator trigger of a decorator chain.
pub fn innermost(trigger: &dyn Trigger) -> &dyn Trigger {
  let mut current = trigger;
  while let Some(decorator) = current.as_decorator() {
    current = decorator.inner();
  }
  current
}

/// Enumerates a decorator chain outer-to-inner, starting with `trigger`
/// itself and ending at the innermost non-decorator trigger.
pub fn decorator_chain(trigger: &dyn Trigger) -> impl Iterator<Item = &dyn Trigger> {
  std::iter::successors(Some(trigger), |current| {
    current.as_decorator().map(|decorator| decorator.inner())
  })
}

/// Builds a fixed-interval trigger from an interval spec string.
///
/// Accepts everything [`IntervalSpec`] parses, as long as it resolves to a
/// fixed (non-calendar) interval: `every("30")`, `every("1h30m")`,
/// `every("PT90S")`. Calendar steps need a date range and are rejected with
/// [`TriggerError::CalendarRangeRequired`].
pub fn every(spec: &str) -> Result<IntervalTrigger, TriggerError> {
  IntervalTrigger::from_spec(spec)
}

/// Renders a duration compactly for trigger descriptions ("500ms", "2.5s",
/// "1h30m").
pub(crate) fn format_duration(duration: ChronoDuration) -> String {
  let total_ms = duration.num_milliseconds();
  if total_ms <= 0 {
    return format!("{}us", duration.num_microseconds().unwrap_or(0));
  }
  if total_ms < 1_000 {
    return format!("{}ms", total_ms);
  }
  let secs = duration.num_seconds();
  let sub_ms = total_ms - secs * 1_000;
  if sub_ms != 0 {
    return format!("{}.{:03}s", secs, sub_ms);
  }
  let hours = secs / 3_600;
  let minutes = (secs % 3_600) / 60;
  let seconds = secs % 60;
  let mut out = String::new();
  if hours > 0 {
    out.push_str(&format!("{}h", hours));
  }
  if minutes > 0 {
    out.push_str(&format!("{}m", minutes));
  }
  if seconds > 0 || out.is_empty() {
    out.push_str(&format!("{}s", seconds));
  }
  out
}
