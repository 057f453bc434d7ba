//! The pull-queue face of a schedule: adapts the message generator to the
//! generic transport contract an external worker pool consumes.

use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::atomic::Ordering as AtomicOrdering;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::TransportError;
use crate::generator::{Cursor, MessageGenerator};
use crate::message::MessageContext;
use crate::metrics::GeneratorMetrics;
use crate::state::DurableState;

/// Scheduling metadata attached to each generated envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledStamp {
  /// The recurring message this firing belongs to.
  pub message_id: Uuid,
  /// The boundary instant the firing is for.
  pub scheduled_at: DateTime<Utc>,
  /// Description of the trigger that produced the firing.
  pub trigger: String,
}

impl ScheduledStamp {
  fn from_context(context: &MessageContext) -> Self {
    Self {
      message_id: context.message_id(),
      scheduled_at: context.scheduled_at(),
      trigger: context.trigger().describe(),
    }
  }
}

/// One deliverable unit of work: a payload plus its scheduling stamp.
#[derive(Debug, Clone)]
pub struct Envelope<M> {
  pub payload: M,
  pub stamp: ScheduledStamp,
}

/// The generic pull-based queue contract consumed by a worker pool.
///
/// Workers repeatedly call [`get`](Transport::get), process each envelope,
/// and [`ack`](Transport::ack) on success.
pub trait Transport<M>: Send + Sync {
  /// Fetches the currently due envelopes. Never blocks; an empty due set is
  /// an empty vec.
  fn get(&self) -> Result<Vec<Envelope<M>>, TransportError>;

  /// Confirms processing of an envelope.
  fn ack(&self, envelope: &Envelope<M>) -> Result<(), TransportError>;

  /// Returns an envelope as unprocessable.
  fn reject(&self, envelope: &Envelope<M>) -> Result<(), TransportError>;

  /// Submits an externally produced envelope.
  fn send(&self, envelope: Envelope<M>) -> Result<(), TransportError>;
}

/// A generative, read-only transport over a [`MessageGenerator`].
///
/// `get()` polls the generator and wraps each due (context, payload) pair as
/// an [`Envelope`]. Nothing is ever physically enqueued, so `ack` is a no-op
/// and `reject`/`send` always fail — this transport produces work, it does
/// not store it.
///
/// With a [`DurableState`] attached, each `get()` runs the whole
/// read-cursors → poll → write-cursors sequence under the named schedule's
/// lock: a restart resumes from the last confirmed cursors instead of
/// re-anchoring at "now", and at most one process advances a given named
/// schedule at any instant. Lock contention is not an error; the contended
/// poll just yields an empty due set and the next poll cycle retries.
pub struct ScheduleTransport<M> {
  generator: Mutex<MessageGenerator<M>>,
  durable: Option<DurableState>,
  metrics: GeneratorMetrics,
}

impl<M: Clone> ScheduleTransport<M> {
  pub fn new(generator: MessageGenerator<M>) -> Self {
    let metrics = generator.metrics();
    Self {
      generator: Mutex::new(generator),
      durable: None,
      metrics,
    }
  }

  /// Attaches durable cursor coordination.
  pub fn with_durable_state(mut self, state: DurableState) -> Self {
    self.durable = Some(state);
    self
  }

  /// A handle onto the underlying generator's metrics.
  pub fn metrics(&self) -> GeneratorMetrics {
    self.metrics.clone()
  }

  pub fn describe(&self) -> String {
    let generator = self.generator.lock();
    let durability = if self.durable.is_some() {
      ", durable"
    } else {
      ""
    };
    format!(
      "schedule transport over {}{}",
      generator.schedule().describe(),
      durability
    )
  }

  fn cache_key(schedule_name: &str) -> String {
    format!("schedule:{}:cursors", schedule_name)
  }

  fn wrap(due: Vec<(MessageContext, M)>) -> Vec<Envelope<M>> {
    due
      .into_iter()
      .map(|(context, payload)| Envelope {
        stamp: ScheduledStamp::from_context(&context),
        payload,
      })
      .collect()
  }
}

impl<M: Clone + Send> Transport<M> for ScheduleTransport<M> {
  fn get(&self) -> Result<Vec<Envelope<M>>, TransportError> {
    let mut generator = self.generator.lock();
    let state = match &self.durable {
      None => return Ok(Self::wrap(generator.poll())),
      Some(state) => state,
    };

    let name = generator.schedule().name().to_string();
    let guard = match state.lock.acquire(&name) {
      Some(guard) => guard,
      None => {
        self
          .metrics
          .lock_contention_total
          .fetch_add(1, AtomicOrdering::Relaxed);
        debug!(schedule = %name, "Cursor lock held elsewhere; yielding empty due set.");
        return Ok(Vec::new());
      }
    };

    let key = Self::cache_key(&name);
    if let Some(raw) = state.cache.get(&key) {
      match serde_json::from_str::<Vec<Cursor>>(&raw) {
        Ok(cursors) => generator.restore_cursors(cursors),
        Err(e) => {
          warn!(schedule = %name, error = %e, "Discarding unreadable cursor record.");
        }
      }
    }

    let due = generator.poll();

    match serde_json::to_string(generator.cursors()) {
      Ok(raw) => state.cache.set(&key, raw),
      Err(e) => {
        warn!(schedule = %name, error = %e, "Failed to serialize cursor record; not persisted.");
      }
    }
    drop(guard);

    Ok(Self::wrap(due))
  }

  fn ack(&self, _envelope: &Envelope<M>) -> Result<(), TransportError> {
    // Nothing was physically enqueued; there is nothing to confirm.
    Ok(())
  }

  fn reject(&self, _envelope: &Envelope<M>) -> Result<(), TransportError> {
    Err(TransportError::RejectNotSupported)
  }

  fn send(&self, _envelope: Envelope<M>) -> Result<(), TransportError> {
    Err(TransportError::SendNotSupported)
  }
}

impl<M> fmt::Debug for ScheduleTransport<M> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ScheduleTransport")
      .field("durable", &self.durable.is_some())
      .finish_non_exhaustive()
  }
}
