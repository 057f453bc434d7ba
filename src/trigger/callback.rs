use std::fmt;

use chrono::{DateTime, Utc};

use super::Trigger;

/// A trigger whose next-instant function is supplied by the caller.
///
/// No semantics are imposed beyond the [`Trigger`] contract: the callback
/// must return `None` or an instant strictly after its argument.
pub struct CallbackTrigger {
  description: String,
  next: Box<dyn Fn(DateTime<Utc>) -> Option<DateTime<Utc>> + Send + Sync>,
}

impl CallbackTrigger {
  pub fn new<F>(description: impl Into<String>, next: F) -> Self
  where
    F: Fn(DateTime<Utc>) -> Option<DateTime<Utc>> + Send + Sync + 'static,
  {
    Self {
      description: description.into(),
      next: Box::new(next),
    }
  }
}

impl Trigger for CallbackTrigger {
  fn next_run(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    (self.next)(after)
  }

  fn describe(&self) -> String {
    self.description.clone()
  }
}

impl fmt::Debug for CallbackTrigger {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CallbackTrigger")
      .field("description", &self.description)
      .field("next", &format_args!("<Fn>"))
      .finish()
  }
}
