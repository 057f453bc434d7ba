//! Durable state coordination for multi-process deployments.
//!
//! A named schedule can be advanced by many processes, but its cursors must
//! only ever move under mutual exclusion. The transport consumes two small
//! backend traits for that: a [`CursorCache`] storing the serialized cursor
//! record, and a [`LockBackend`] guarding the read-poll-write critical
//! section. In-process reference implementations ship for tests and
//! single-process durability; production deployments plug in shared stores.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

/// Keyed string storage for serialized cursor records.
pub trait CursorCache: Send + Sync {
  fn get(&self, key: &str) -> Option<String>;
  fn set(&self, key: &str, value: String);
}

/// Mutual exclusion on a named resource.
///
/// `acquire` must not block: contention returns `None`, and the caller
/// degrades to an empty poll rather than waiting. The returned guard holds
/// the lock until dropped.
pub trait LockBackend: Send + Sync {
  fn acquire(&self, name: &str) -> Option<LockGuard>;
}

/// Releases an acquired lock when dropped.
pub struct LockGuard {
  on_release: Option<Box<dyn FnOnce() + Send>>,
}

impl LockGuard {
  /// Builds a guard from the backend's release action.
  pub fn new(on_release: impl FnOnce() + Send + 'static) -> Self {
    Self {
      on_release: Some(Box::new(on_release)),
    }
  }
}

impl Drop for LockGuard {
  fn drop(&mut self) {
    if let Some(release) = self.on_release.take() {
      release();
    }
  }
}

impl fmt::Debug for LockGuard {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LockGuard").finish_non_exhaustive()
  }
}

/// The durable coordination pair for one named schedule: where cursors are
/// persisted, and the lock serializing their advancement.
#[derive(Clone)]
pub struct DurableState {
  pub cache: Arc<dyn CursorCache>,
  pub lock: Arc<dyn LockBackend>,
}

impl DurableState {
  pub fn new(cache: Arc<dyn CursorCache>, lock: Arc<dyn LockBackend>) -> Self {
    Self { cache, lock }
  }
}

impl fmt::Debug for DurableState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DurableState").finish_non_exhaustive()
  }
}

/// An in-process [`CursorCache`] over a hash map.
#[derive(Debug, Default)]
pub struct MemoryCache {
  entries: RwLock<HashMap<String, String>>,
}

impl MemoryCache {
  pub fn new() -> Self {
    Self::default()
  }
}

impl CursorCache for MemoryCache {
  fn get(&self, key: &str) -> Option<String> {
    self.entries.read().get(key).cloned()
  }

  fn set(&self, key: &str, value: String) {
    self.entries.write().insert(key.to_string(), value);
  }
}

/// An in-process [`LockBackend`] over a set of held names.
#[derive(Debug, Default)]
pub struct LocalLockBackend {
  held: Arc<Mutex<HashSet<String>>>,
}

impl LocalLockBackend {
  pub fn new() -> Self {
    Self::default()
  }
}

impl LockBackend for LocalLockBackend {
  fn acquire(&self, name: &str) -> Option<LockGuard> {
    let mut held = self.held.lock();
    if !held.insert(name.to_string()) {
      return None;
    }
    let registry = Arc::clone(&self.held);
    let name = name.to_string();
    Some(LockGuard::new(move || {
      registry.lock().remove(&name);
    }))
  }
}
