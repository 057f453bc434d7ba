use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{DecoratedTrigger, Trigger};
use crate::error::TriggerError;

/// Suppresses firings inside a blackout window `[from, until)`, deferring
/// them past the window's end.
///
/// A candidate inside the window is replaced by the inner trigger's next
/// firing computed from `until`. The skip is single-pass: the recomputed
/// candidate is not checked again, so an inner trigger whose post-window
/// value lands inside another blackout occurrence is returned as-is. Chain a
/// second decorator per additional window.
pub struct ExcludeWindowTrigger {
  inner: Arc<dyn Trigger>,
  from: DateTime<Utc>,
  until: DateTime<Utc>,
}

impl ExcludeWindowTrigger {
  pub fn new(
    inner: Arc<dyn Trigger>,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
  ) -> Result<Self, TriggerError> {
    if from >= until {
      return Err(TriggerError::EmptyWindow { from, until });
    }
    Ok(Self { inner, from, until })
  }
}

impl Trigger for ExcludeWindowTrigger {
  fn next_run(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let candidate = self.inner.next_run(after)?;
    if candidate >= self.from && candidate < self.until {
      debug!(
        trigger = %self.inner.describe(),
        %candidate,
        until = %self.until,
        "Firing falls inside blackout window; deferring past its end."
      );
      return self.inner.next_run(self.until);
    }
    Some(candidate)
  }

  fn describe(&self) -> String {
    format!(
      "{}, except between {} and {}",
      self.inner.describe(),
      self.from,
      self.until
    )
  }

  fn on_start(&self, start: DateTime<Utc>) {
    self.inner.on_start(start);
  }

  fn as_decorator(&self) -> Option<&dyn DecoratedTrigger> {
    Some(self)
  }
}

impl DecoratedTrigger for ExcludeWindowTrigger {
  fn inner(&self) -> &dyn Trigger {
    self.inner.as_ref()
  }
}

impl fmt::Debug for ExcludeWindowTrigger {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ExcludeWindowTrigger")
      .field("inner", &self.inner.describe())
      .field("from", &self.from)
      .field("until", &self.until)
      .finish()
  }
}
