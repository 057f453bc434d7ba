use std::fmt;
use std::slice;

use crate::message::RecurringMessage;

/// A named, ordered registry of recurring messages.
///
/// Holds static configuration only; all sequencing state lives in the
/// [`MessageGenerator`](crate::generator::MessageGenerator). Entries are
/// append-only and enumerate in insertion order.
#[derive(Clone)]
pub struct Schedule<M> {
  name: String,
  entries: Vec<RecurringMessage<M>>,
}

impl<M: Clone> Schedule<M> {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      entries: Vec::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Appends a recurring message.
  pub fn add(&mut self, message: RecurringMessage<M>) -> &mut Self {
    self.entries.push(message);
    self
  }

  /// Builder-style [`add`](Schedule::add).
  pub fn with(mut self, message: RecurringMessage<M>) -> Self {
    self.entries.push(message);
    self
  }

  pub fn messages(&self) -> &[RecurringMessage<M>] {
    &self.entries
  }

  pub fn iter(&self) -> slice::Iter<'_, RecurringMessage<M>> {
    self.entries.iter()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn describe(&self) -> String {
    format!("schedule '{}' ({} entries)", self.name, self.entries.len())
  }
}

impl<M> fmt::Debug for Schedule<M> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Schedule")
      .field("name", &self.name)
      .field("entries", &self.entries)
      .finish()
  }
}
