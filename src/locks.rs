//! Per-key async mutexes for the read-decide-write-append sequences.
//!
//! Lock order is ledger key first, then topic key.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

pub struct KeyedLocks<K> {
  inner: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
  pub fn new() -> Self {
    Self { inner: Mutex::new(HashMap::new()) }
  }

  /// Wait for exclusive access to `key`. The guard releases it on drop.
  pub async fn lock(&self, key: K) -> OwnedMutexGuard<()> {
    let slot = { self.inner.lock().entry(key).or_default().clone() };
    slot.lock_owned().await
  }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
  fn default() -> Self {
    Self::new()
  }
}
