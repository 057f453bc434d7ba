use std::fmt;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::Rng;

use super::{format_duration, DecoratedTrigger, Trigger};
use crate::error::TriggerError;

/// Adds a uniformly random delay in `[0, max_jitter]` to each firing of the
/// wrapped trigger.
///
/// Spreads out firings that would otherwise land on the same instant across
/// many schedules. Terminality is untouched: the decorator is exhausted
/// exactly when the inner trigger is.
pub struct JitterTrigger {
  inner: Arc<dyn Trigger>,
  max_jitter: ChronoDuration,
  max_jitter_ns: i64,
}

impl JitterTrigger {
  pub fn new(inner: Arc<dyn Trigger>, max_jitter: StdDuration) -> Result<Self, TriggerError> {
    let max = ChronoDuration::from_std(max_jitter)
      .map_err(|_| TriggerError::InvalidInterval(format!("{:?}", max_jitter)))?;
    let max_ns = max
      .num_nanoseconds()
      .ok_or_else(|| TriggerError::InvalidInterval(format!("{:?}", max_jitter)))?;
    Ok(Self {
      inner,
      max_jitter: max,
      max_jitter_ns: max_ns,
    })
  }
}

impl Trigger for JitterTrigger {
  fn next_run(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    self.inner.next_run(after).map(|next| {
      if self.max_jitter_ns == 0 {
        return next;
      }
      let jitter_ns = rand::thread_rng().gen_range(0..=self.max_jitter_ns);
      next
        .checked_add_signed(ChronoDuration::nanoseconds(jitter_ns))
        .unwrap_or(next)
    })
  }

  fn describe(&self) -> String {
    format!(
      "{}, with 0-{} jitter",
      self.inner.describe(),
      format_duration(self.max_jitter)
    )
  }

  fn on_start(&self, start: DateTime<Utc>) {
    self.inner.on_start(start);
  }

  fn as_decorator(&self) -> Option<&dyn DecoratedTrigger> {
    Some(self)
  }
}

impl DecoratedTrigger for JitterTrigger {
  fn inner(&self) -> &dyn Trigger {
    self.inner.as_ref()
  }
}

impl fmt::Debug for JitterTrigger {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("JitterTrigger")
      .field("inner", &self.inner.describe())
      .field("max_jitter", &self.max_jitter)
      .finish()
  }
}
