use chrono::{DateTime, Utc};

use super::Trigger;

/// Fires exactly once, at a fixed target instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnceTrigger {
  at: DateTime<Utc>,
}

impl OnceTrigger {
  pub fn new(at: DateTime<Utc>) -> Self {
    Self { at }
  }

  pub fn at(&self) -> DateTime<Utc> {
    self.at
  }
}

impl Trigger for OnceTrigger {
  fn next_run(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if after < self.at {
      Some(self.at)
    } else {
      None
    }
  }

  fn describe(&self) -> String {
    format!("once at {}", self.at)
  }
}
