//! Two-layer cache: hot in-memory map over the durable store.

use color_eyre::{eyre::eyre, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use super::entry::CacheEntry;
use crate::clock::Clock;
use crate::db::{DurableStore, CACHE_PREFIX};

/// TTL applied when the caller does not pick one.
pub const DEFAULT_TTL_MINUTES: i64 = 60;

/// Cache with per-entry expiry.
///
/// Reads check the in-memory layer first and fall back to the durable store
/// on a cold start. No operation fails: storage and parse errors are logged
/// and the affected entry is treated as missing.
pub struct ExpiringCache {
  store: Arc<dyn DurableStore>,
  clock: Arc<dyn Clock>,
  hot: Mutex<HashMap<String, CacheEntry>>,
  default_ttl_minutes: i64,
}

impl ExpiringCache {
  pub fn new(store: Arc<dyn DurableStore>, clock: Arc<dyn Clock>) -> Self {
    Self {
      store,
      clock,
      hot: Mutex::new(HashMap::new()),
      default_ttl_minutes: DEFAULT_TTL_MINUTES,
    }
  }

  /// Set the TTL used by [`ExpiringCache::set`].
  pub fn with_default_ttl(mut self, minutes: i64) -> Self {
    self.default_ttl_minutes = minutes;
    self
  }

  /// Store a value with the default TTL.
  pub fn set(&self, key: &str, value: Value) {
    self.set_with_ttl(key, value, self.default_ttl_minutes);
  }

  /// Store a value that expires `ttl_minutes` from now.
  pub fn set_with_ttl(&self, key: &str, value: Value, ttl_minutes: i64) {
    let entry = CacheEntry::new(key, value, self.clock.now_ms(), ttl_minutes);

    let serialized = serde_json::to_string(&entry);
    self.hot().insert(key.to_string(), entry);

    let result = serialized
      .map_err(|e| eyre!("Failed to serialize cache entry: {}", e))
      .and_then(|text| self.store.set_item(&durable_key(key), &text));
    if let Err(e) = result {
      warn!(key, error = %e, "Failed to persist cache entry");
    }
  }

  /// Serialize and store a typed value.
  pub fn set_as<T: Serialize>(&self, key: &str, value: &T, ttl_minutes: i64) {
    match serde_json::to_value(value) {
      Ok(value) => self.set_with_ttl(key, value, ttl_minutes),
      Err(e) => warn!(key, error = %e, "Failed to serialize cache value"),
    }
  }

  /// Get a value if present and unexpired.
  pub fn get(&self, key: &str) -> Option<Value> {
    let cached = self.hot().get(key).cloned();

    let entry = match cached {
      Some(entry) => entry,
      None => {
        let entry = self.load_durable(key)?;
        self.hot().insert(key.to_string(), entry.clone());
        entry
      }
    };

    if entry.is_expired(self.clock.now_ms()) {
      debug!(key, "Cache entry expired");
      self.remove(key);
      return None;
    }

    Some(entry.payload)
  }

  /// Get and deserialize a value. A payload of the wrong shape is evicted.
  pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    let value = self.get(key)?;
    match serde_json::from_value(value) {
      Ok(typed) => Some(typed),
      Err(e) => {
        warn!(key, error = %e, "Cached value has unexpected shape, evicting");
        self.remove(key);
        None
      }
    }
  }

  /// Remove a key from both layers.
  pub fn remove(&self, key: &str) {
    self.hot().remove(key);
    if let Err(e) = self.store.remove_item(&durable_key(key)) {
      warn!(key, error = %e, "Failed to remove cache entry");
    }
  }

  /// Remove every cache entry, leaving keys outside the cache prefix alone.
  pub fn clear(&self) {
    match self.durable_keys() {
      Ok(keys) => {
        if let Err(e) = self.store.multi_remove(&keys) {
          warn!(error = %e, "Failed to clear cache entries");
        }
      }
      Err(e) => warn!(error = %e, "Failed to list cache entries"),
    }
    self.hot().clear();
  }

  /// Number of cache entries in the durable store.
  pub fn durable_len(&self) -> usize {
    match self.durable_keys() {
      Ok(keys) => keys.len(),
      Err(e) => {
        warn!(error = %e, "Failed to list cache entries");
        0
      }
    }
  }

  fn durable_keys(&self) -> Result<Vec<String>> {
    Ok(
      self
        .store
        .all_keys()?
        .into_iter()
        .filter(|key| key.starts_with(CACHE_PREFIX))
        .collect(),
    )
  }

  fn load_durable(&self, key: &str) -> Option<CacheEntry> {
    let stored = match self.store.get_item(&durable_key(key)) {
      Ok(stored) => stored?,
      Err(e) => {
        warn!(key, error = %e, "Failed to read cache entry");
        return None;
      }
    };

    match serde_json::from_str(&stored) {
      Ok(entry) => Some(entry),
      Err(e) => {
        warn!(key, error = %e, "Error parsing cached data, evicting");
        self.remove(key);
        None
      }
    }
  }

  fn hot(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
    // The map is only touched by short, non-panicking sections.
    self.hot.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

fn durable_key(key: &str) -> String {
  format!("{}{}", CACHE_PREFIX, key)
}
