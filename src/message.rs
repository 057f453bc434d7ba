use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::trigger::Trigger;

/// Correlates one firing with the trigger that produced it and the instant
/// it fired *for* (which, under catch-up enumeration, may lie well before
/// the instant it was actually observed).
///
/// Constructed fresh for every firing and discarded after delivery.
#[derive(Clone)]
pub struct MessageContext {
  message_id: Uuid,
  trigger: Arc<dyn Trigger>,
  scheduled_at: DateTime<Utc>,
}

impl MessageContext {
  pub fn new(message_id: Uuid, trigger: Arc<dyn Trigger>, scheduled_at: DateTime<Utc>) -> Self {
    Self {
      message_id,
      trigger,
      scheduled_at,
    }
  }

  /// The id of the recurring message this firing belongs to.
  pub fn message_id(&self) -> Uuid {
    self.message_id
  }

  pub fn trigger(&self) -> &dyn Trigger {
    self.trigger.as_ref()
  }

  /// The boundary instant this firing is for.
  pub fn scheduled_at(&self) -> DateTime<Utc> {
    self.scheduled_at
  }
}

impl fmt::Debug for MessageContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MessageContext")
      .field("message_id", &self.message_id)
      .field("trigger", &self.trigger.describe())
      .field("scheduled_at", &self.scheduled_at)
      .finish()
  }
}

/// Supplies the payload(s) to deliver at a firing.
///
/// `provide` is called exactly once per firing and returns a finite,
/// possibly empty sequence; each payload becomes its own delivery sharing
/// the firing's context. A static provider must be deterministic with
/// respect to the context; a dynamic one may consult external state.
pub trait MessageProvider<M>: Send + Sync {
  /// A stable identifier for logs and introspection.
  fn id(&self) -> &str;

  /// A human-readable description; defaults to the id.
  fn describe(&self) -> String {
    self.id().to_string()
  }

  fn provide(&self, context: &MessageContext) -> Vec<M>;
}

/// The stock dynamic provider: payloads computed by a closure at fire time.
pub struct CallbackProvider<M> {
  id: String,
  description: String,
  provide: Box<dyn Fn(&MessageContext) -> Vec<M> + Send + Sync>,
}

impl<M> CallbackProvider<M> {
  pub fn new<F>(id: impl Into<String>, description: impl Into<String>, provide: F) -> Self
  where
    F: Fn(&MessageContext) -> Vec<M> + Send + Sync + 'static,
  {
    Self {
      id: id.into(),
      description: description.into(),
      provide: Box::new(provide),
    }
  }
}

impl<M> MessageProvider<M> for CallbackProvider<M> {
  fn id(&self) -> &str {
    &self.id
  }

  fn describe(&self) -> String {
    self.description.clone()
  }

  fn provide(&self, context: &MessageContext) -> Vec<M> {
    (self.provide)(context)
  }
}

impl<M> fmt::Debug for CallbackProvider<M> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CallbackProvider")
      .field("id", &self.id)
      .field("description", &self.description)
      .field("provide", &format_args!("<Fn>"))
      .finish()
  }
}

/// Where a recurring message's payloads come from.
#[derive(Clone)]
pub(crate) enum MessageSource<M> {
  Fixed(M),
  Provider(Arc<dyn MessageProvider<M>>),
}

/// One schedulable unit: exactly one trigger bound to a fixed payload or a
/// payload provider.
#[derive(Clone)]
pub struct RecurringMessage<M> {
  id: Uuid,
  trigger: Arc<dyn Trigger>,
  source: MessageSource<M>,
}

impl<M: Clone> RecurringMessage<M> {
  /// Binds `trigger` to a fixed payload, delivered verbatim at each firing.
  pub fn new(trigger: Arc<dyn Trigger>, payload: M) -> Self {
    Self {
      id: Uuid::new_v4(),
      trigger,
      source: MessageSource::Fixed(payload),
    }
  }

  /// Binds `trigger` to a provider consulted at each firing.
  pub fn with_provider(trigger: Arc<dyn Trigger>, provider: Arc<dyn MessageProvider<M>>) -> Self {
    Self {
      id: Uuid::new_v4(),
      trigger,
      source: MessageSource::Provider(provider),
    }
  }

  pub fn id(&self) -> Uuid {
    self.id
  }

  pub fn trigger(&self) -> &dyn Trigger {
    self.trigger.as_ref()
  }

  pub(crate) fn trigger_arc(&self) -> &Arc<dyn Trigger> {
    &self.trigger
  }

  pub(crate) fn has_provider(&self) -> bool {
    matches!(self.source, MessageSource::Provider(_))
  }

  /// Expands this message's payload(s) for one firing.
  pub(crate) fn payloads_for(&self, context: &MessageContext) -> Vec<M> {
    match &self.source {
      MessageSource::Fixed(payload) => vec![payload.clone()],
      MessageSource::Provider(provider) => provider.provide(context),
    }
  }

  pub fn describe(&self) -> String {
    match &self.source {
      MessageSource::Fixed(_) => format!("recurring message ({})", self.trigger.describe()),
      MessageSource::Provider(provider) => format!(
        "recurring message '{}' ({})",
        provider.id(),
        self.trigger.describe()
      ),
    }
  }
}

impl<M> fmt::Debug for RecurringMessage<M> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let source = match &self.source {
      MessageSource::Fixed(_) => "Fixed".to_string(),
      MessageSource::Provider(provider) => format!("Provider({})", provider.id()),
    };
    f.debug_struct("RecurringMessage")
      .field("id", &self.id)
      .field("trigger", &self.trigger.describe())
      .field("source", &source)
      .finish()
  }
}
