//! In-memory durable store for tests and throwaway sessions.

use color_eyre::{eyre::eyre, Result};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::DurableStore;

/// Durable store that forgets everything when dropped.
#[derive(Default)]
pub struct MemoryStore {
  items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>> {
    self.items.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

impl DurableStore for MemoryStore {
  fn get_item(&self, key: &str) -> Result<Option<String>> {
    Ok(self.lock()?.get(key).cloned())
  }

  fn set_item(&self, key: &str, value: &str) -> Result<()> {
    self.lock()?.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove_item(&self, key: &str) -> Result<()> {
    self.lock()?.remove(key);
    Ok(())
  }

  fn multi_remove(&self, keys: &[String]) -> Result<()> {
    let mut items = self.lock()?;
    for key in keys {
      items.remove(key);
    }
    Ok(())
  }

  fn all_keys(&self) -> Result<Vec<String>> {
    Ok(self.lock()?.keys().cloned().collect())
  }

  fn clear(&self) -> Result<()> {
    self.lock()?.clear();
    Ok(())
  }
}
