//! Resolution of `schedule://` DSNs into ready-to-poll transports.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::error::ResolveError;
use crate::generator::MessageGenerator;
use crate::schedule::Schedule;
use crate::state::{CursorCache, DurableState, LockBackend};
use crate::transport::ScheduleTransport;

/// A registry of named schedules and state backends, resolving DSNs of the
/// form `schedule://<name>[?cache=<cache-name>&lock=<lock-name>]`.
///
/// The `cache` and `lock` options select registered backends and must be
/// supplied together; a transport created with them coordinates its cursors
/// durably. Unknown schedule names, unknown option keys, and unknown backend
/// names are rejected at resolution time, naming the offending value.
pub struct TransportFactory<M> {
  schedules: HashMap<String, Schedule<M>>,
  caches: HashMap<String, Arc<dyn CursorCache>>,
  locks: HashMap<String, Arc<dyn LockBackend>>,
  clock: Arc<dyn Clock>,
}

impl<M: Clone> TransportFactory<M> {
  pub fn new() -> Self {
    Self {
      schedules: HashMap::new(),
      caches: HashMap::new(),
      locks: HashMap::new(),
      clock: Arc::new(SystemClock),
    }
  }

  /// Replaces the clock handed to created generators. Defaults to the
  /// system clock.
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  /// Registers a schedule under its own name. A schedule registered twice
  /// replaces the earlier registration.
  pub fn register_schedule(&mut self, schedule: Schedule<M>) -> &mut Self {
    self.schedules.insert(schedule.name().to_string(), schedule);
    self
  }

  pub fn register_cache(&mut self, name: impl Into<String>, cache: Arc<dyn CursorCache>) -> &mut Self {
    self.caches.insert(name.into(), cache);
    self
  }

  pub fn register_lock(&mut self, name: impl Into<String>, lock: Arc<dyn LockBackend>) -> &mut Self {
    self.locks.insert(name.into(), lock);
    self
  }

  /// Resolves a DSN into a transport over a fresh generator.
  pub fn create(&self, dsn: &str) -> Result<ScheduleTransport<M>, ResolveError> {
    let (name, options) = parse_dsn(dsn)?;
    let schedule = self
      .schedules
      .get(name)
      .cloned()
      .ok_or_else(|| ResolveError::UnknownSchedule(name.to_string()))?;

    let mut cache_name = None;
    let mut lock_name = None;
    for (key, value) in options {
      match key {
        "cache" => cache_name = Some(value),
        "lock" => lock_name = Some(value),
        other => return Err(ResolveError::UnknownOption(other.to_string())),
      }
    }
    let durable = match (cache_name, lock_name) {
      (None, None) => None,
      (Some(cache_name), Some(lock_name)) => {
        let cache = self
          .caches
          .get(cache_name)
          .cloned()
          .ok_or_else(|| ResolveError::UnknownCache(cache_name.to_string()))?;
        let lock = self
          .locks
          .get(lock_name)
          .cloned()
          .ok_or_else(|| ResolveError::UnknownLock(lock_name.to_string()))?;
        Some(DurableState::new(cache, lock))
      }
      _ => return Err(ResolveError::IncompleteDurableOptions),
    };

    let generator = MessageGenerator::new(schedule, Arc::clone(&self.clock));
    let mut transport = ScheduleTransport::new(generator);
    if let Some(state) = durable {
      transport = transport.with_durable_state(state);
    }
    Ok(transport)
  }
}

impl<M: Clone> Default for TransportFactory<M> {
  fn default() -> Self {
    Self::new()
  }
}

impl<M> fmt::Debug for TransportFactory<M> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TransportFactory")
      .field("schedules", &self.schedules.keys().collect::<Vec<_>>())
      .field("caches", &self.caches.keys().collect::<Vec<_>>())
      .field("locks", &self.locks.keys().collect::<Vec<_>>())
      .finish()
  }
}

fn parse_dsn(dsn: &str) -> Result<(&str, Vec<(&str, &str)>), ResolveError> {
  let invalid = || ResolveError::InvalidDsn(dsn.to_string());
  let rest = dsn.strip_prefix("schedule://").ok_or_else(invalid)?;
  let (name, query) = rest.split_once('?').unwrap_or((rest, ""));
  if name.is_empty() || name.contains('/') {
    return Err(invalid());
  }
  let mut options = Vec::new();
  for pair in query.split('&').filter(|pair| !pair.is_empty()) {
    let (key, value) = pair.split_once('=').ok_or_else(invalid)?;
    if key.is_empty() || value.is_empty() {
      return Err(invalid());
    }
    options.push((key, value));
  }
  Ok((name, options))
}
