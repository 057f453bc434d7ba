use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule as CronSchedule;

use super::Trigger;
use crate::error::TriggerError;

/// Fires on the minute-aligned instants matched by a cron expression.
///
/// Standard five-field expressions are accepted and pinned to second zero of
/// the matching minute; six- and seven-field expressions (with seconds and
/// optional year) pass through unchanged. The expression is parsed once at
/// construction; a malformed expression never makes it to firing time.
#[derive(Debug, Clone)]
pub struct CronTrigger {
  expression: String,
  schedule: CronSchedule,
}

impl CronTrigger {
  pub fn new(expression: &str) -> Result<Self, TriggerError> {
    let normalized = if expression.split_whitespace().count() == 5 {
      format!("0 {}", expression)
    } else {
      expression.to_string()
    };
    let schedule = CronSchedule::from_str(&normalized).map_err(|e| TriggerError::InvalidCron {
      expression: expression.to_string(),
      reason: e.to_string(),
    })?;
    Ok(Self {
      expression: expression.to_string(),
      schedule,
    })
  }

  pub fn expression(&self) -> &str {
    &self.expression
  }
}

impl Trigger for CronTrigger {
  fn next_run(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    self.schedule.after(&after).next()
  }

  fn describe(&self) -> String {
    format!("cron ({})", self.expression)
  }
}
