use std::fmt;

use chrono::{DateTime, Days, Months, Utc};
use tracing::warn;

use super::Trigger;
use crate::error::TriggerError;

/// A step in calendar units: years, months, days.
///
/// Not reducible to a fixed second count; adding a month to Jan 31 lands on
/// the clamped end of February, which is exactly the behavior fixed-interval
/// arithmetic cannot express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalendarStep {
  pub years: u32,
  pub months: u32,
  pub days: u32,
}

impl CalendarStep {
  pub fn new(years: u32, months: u32, days: u32) -> Self {
    Self {
      years,
      months,
      days,
    }
  }

  pub fn days(days: u32) -> Self {
    Self::new(0, 0, days)
  }

  pub fn months(months: u32) -> Self {
    Self::new(0, months, 0)
  }

  pub fn years(years: u32) -> Self {
    Self::new(years, 0, 0)
  }

  pub fn is_zero(&self) -> bool {
    self.years == 0 && self.months == 0 && self.days == 0
  }

  /// Applies the step once. `None` on arithmetic overflow.
  pub(crate) fn apply_to(&self, instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let total_months = self.years.checked_mul(12)?.checked_add(self.months)?;
    let stepped = instant.checked_add_months(Months::new(total_months))?;
    stepped.checked_add_days(Days::new(u64::from(self.days)))
  }
}

impl fmt::Display for CalendarStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_zero() {
      return write!(f, "0d");
    }
    if self.years > 0 {
      write!(f, "{}y", self.years)?;
    }
    if self.months > 0 {
      write!(f, "{}mo", self.months)?;
    }
    if self.days > 0 {
      write!(f, "{}d", self.days)?;
    }
    Ok(())
  }
}

/// Fires at calendar-stepped instants over a bounded date range.
///
/// Boundaries are enumerated by stepping from `start`; the first boundary
/// strictly after the reference instant is the next firing. The `end` bound
/// is inclusive: a boundary landing exactly on it still fires, the one past
/// it is terminal.
#[derive(Debug, Clone)]
pub struct CalendarTrigger {
  start: DateTime<Utc>,
  step: CalendarStep,
  end: DateTime<Utc>,
}

impl CalendarTrigger {
  pub fn new(
    start: DateTime<Utc>,
    step: CalendarStep,
    end: DateTime<Utc>,
  ) -> Result<Self, TriggerError> {
    if step.is_zero() {
      return Err(TriggerError::ZeroInterval);
    }
    if end < start {
      return Err(TriggerError::EndBeforeStart { start, end });
    }
    Ok(Self { start, step, end })
  }
}

impl Trigger for CalendarTrigger {
  fn next_run(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let mut candidate = self.start;
    while candidate <= after {
      candidate = match self.step.apply_to(candidate) {
        Some(next) => next,
        None => {
          warn!(trigger = %self.describe(), "Calendar step overflowed; treating trigger as exhausted.");
          return None;
        }
      };
      if candidate > self.end {
        return None;
      }
    }
    if candidate > self.end {
      None
    } else {
      Some(candidate)
    }
  }

  fn describe(&self) -> String {
    format!(
      "every {} from {} until {}",
      self.step, self.start, self.end
    )
  }
}
