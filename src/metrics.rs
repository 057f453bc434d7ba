use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// --- Simple Histogram Implementation ---

/// A basic concurrent histogram storing count and sum.
///
/// Enough for tracking mean poll latency without percentile detail. Uses
/// `Relaxed` ordering; strict inter-metric consistency is not required.
#[derive(Debug, Default)]
pub struct SimpleHistogram {
  count: AtomicUsize,
  sum_micros: AtomicUsize,
}

impl SimpleHistogram {
  /// Records a duration observation.
  pub fn record(&self, duration: Duration) {
    self.count.fetch_add(1, Ordering::Relaxed);
    self.sum_micros.fetch_add(
      duration.as_micros().try_into().unwrap_or(usize::MAX),
      Ordering::Relaxed,
    );
  }

  pub fn get_count(&self) -> usize {
    self.count.load(Ordering::Relaxed)
  }

  pub fn get_sum_micros(&self) -> usize {
    self.sum_micros.load(Ordering::Relaxed)
  }
}

// --- Main Metrics Struct (Internal State) ---

/// Counters tracking generator and transport activity.
///
/// Cloning only clones the inner `Arc`s; the generator and its transport
/// share one set of underlying atomics.
#[derive(Debug, Clone)]
pub struct GeneratorMetrics {
  // --- Counters (Monotonically increasing) ---
  /// Total number of `poll()` calls completed.
  pub polls_total: Arc<AtomicUsize>,
  /// Total number of (context, payload) pairs generated across all polls.
  pub messages_generated_total: Arc<AtomicUsize>,
  /// Total number of provider invocations (one per firing of a
  /// provider-backed recurring message).
  pub providers_invoked_total: Arc<AtomicUsize>,
  /// Total number of triggers that reached their terminal state.
  pub triggers_retired_total: Arc<AtomicUsize>,
  /// Total number of polls that yielded nothing because the durable cursor
  /// lock was held elsewhere.
  pub lock_contention_total: Arc<AtomicUsize>,
  /// Total number of cursor restorations from a durable cache.
  pub cursors_restored_total: Arc<AtomicUsize>,

  // --- Gauges (Current state values) ---
  /// Current number of schedule entries whose trigger is not yet retired.
  pub entries_active_current: Arc<AtomicUsize>,

  // --- Histograms/Summaries ---
  /// Poll execution duration (microseconds).
  pub poll_duration: Arc<SimpleHistogram>,
}

impl GeneratorMetrics {
  pub fn new() -> Self {
    Self {
      polls_total: Default::default(),
      messages_generated_total: Default::default(),
      providers_invoked_total: Default::default(),
      triggers_retired_total: Default::default(),
      lock_contention_total: Default::default(),
      cursors_restored_total: Default::default(),
      entries_active_current: Default::default(),
      poll_duration: Arc::new(SimpleHistogram::default()),
    }
  }

  /// Creates a point-in-time snapshot of the current metric values.
  pub fn snapshot(&self) -> MetricsSnapshot {
    let order = Ordering::Relaxed;
    MetricsSnapshot {
      polls_total: self.polls_total.load(order),
      messages_generated_total: self.messages_generated_total.load(order),
      providers_invoked_total: self.providers_invoked_total.load(order),
      triggers_retired_total: self.triggers_retired_total.load(order),
      lock_contention_total: self.lock_contention_total.load(order),
      cursors_restored_total: self.cursors_restored_total.load(order),
      entries_active_current: self.entries_active_current.load(order),
      poll_duration_count: self.poll_duration.get_count(),
      poll_duration_sum_micros: self.poll_duration.get_sum_micros(),
    }
  }
}

impl Default for GeneratorMetrics {
  fn default() -> Self {
    Self::new()
  }
}

// --- Metrics Snapshot Struct (Public Data) ---

/// A snapshot of generator/transport metrics at a specific point in time.
///
/// Plain data; cheap to clone, serialize, or ship to monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct MetricsSnapshot {
  // Counters
  pub polls_total: usize,
  pub messages_generated_total: usize,
  pub providers_invoked_total: usize,
  pub triggers_retired_total: usize,
  pub lock_contention_total: usize,
  pub cursors_restored_total: usize,
  // Gauges
  pub entries_active_current: usize,
  // Histogram Data
  pub poll_duration_count: usize,
  pub poll_duration_sum_micros: usize,
}

impl MetricsSnapshot {
  /// Mean poll duration in microseconds, if any polls completed.
  pub fn mean_poll_duration_micros(&self) -> Option<f64> {
    if self.poll_duration_count == 0 {
      None
    } else {
      Some(self.poll_duration_sum_micros as f64 / self.poll_duration_count as f64)
    }
  }

  /// Mean poll duration, if any polls completed.
  pub fn mean_poll_duration(&self) -> Option<Duration> {
    self
      .mean_poll_duration_micros()
      .map(|micros| Duration::from_micros(micros as u64))
  }
}
