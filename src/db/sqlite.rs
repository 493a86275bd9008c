//! SQLite-backed durable store.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::schema::SCHEMA;
use super::DurableStore;

/// Durable store kept in a single SQLite table.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open or create the store at the given path.
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create store directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open store at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// Open a store that lives only as long as this value.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory store: {}", e))?;

    Self::with_connection(conn)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("profile-sync").join("store.db"))
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;

    Ok(store)
  }

  fn run_migrations(&self) -> Result<()> {
    self
      .lock()?
      .execute_batch(SCHEMA)
      .map_err(|e| eyre!("Failed to run store migrations: {}", e))?;

    Ok(())
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

impl DurableStore for SqliteStore {
  fn get_item(&self, key: &str) -> Result<Option<String>> {
    let conn = self.lock()?;

    conn
      .query_row(
        "SELECT value FROM kv_store WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read key {}: {}", key, e))
  }

  fn set_item(&self, key: &str, value: &str) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute(
        "INSERT OR REPLACE INTO kv_store (key, value, updated_at)
         VALUES (?, ?, datetime('now'))",
        params![key, value],
      )
      .map_err(|e| eyre!("Failed to write key {}: {}", key, e))?;

    Ok(())
  }

  fn remove_item(&self, key: &str) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute("DELETE FROM kv_store WHERE key = ?", params![key])
      .map_err(|e| eyre!("Failed to remove key {}: {}", key, e))?;

    Ok(())
  }

  fn multi_remove(&self, keys: &[String]) -> Result<()> {
    if keys.is_empty() {
      return Ok(());
    }

    let conn = self.lock()?;
    let tx = conn
      .unchecked_transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    for key in keys {
      tx.execute("DELETE FROM kv_store WHERE key = ?", params![key])
        .map_err(|e| eyre!("Failed to remove key {}: {}", key, e))?;
    }

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(())
  }

  fn all_keys(&self) -> Result<Vec<String>> {
    let conn = self.lock()?;

    let mut stmt = conn
      .prepare("SELECT key FROM kv_store ORDER BY key")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let keys = stmt
      .query_map([], |row| row.get(0))
      .map_err(|e| eyre!("Failed to list keys: {}", e))?
      .collect::<rusqlite::Result<Vec<String>>>()
      .map_err(|e| eyre!("Failed to read key: {}", e))?;

    Ok(keys)
  }

  fn clear(&self) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute("DELETE FROM kv_store", [])
      .map_err(|e| eyre!("Failed to clear store: {}", e))?;

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_set_get_overwrite() {
    let store = SqliteStore::open_in_memory().unwrap();
    assert_eq!(store.get_item("a").unwrap(), None);

    store.set_item("a", "1").unwrap();
    store.set_item("a", "2").unwrap();
    assert_eq!(store.get_item("a").unwrap().as_deref(), Some("2"));
  }

  #[test]
  fn test_remove_and_multi_remove() {
    let store = SqliteStore::open_in_memory().unwrap();
    for key in ["a", "b", "c"] {
      store.set_item(key, "{}").unwrap();
    }

    store.remove_item("a").unwrap();
    store.remove_item("missing").unwrap();
    store
      .multi_remove(&["b".to_string(), "zzz".to_string()])
      .unwrap();

    assert_eq!(store.all_keys().unwrap(), vec!["c".to_string()]);
  }

  #[test]
  fn test_clear_removes_everything() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.set_item("cache_x", "1").unwrap();
    store.set_item("offline_queue", "[]").unwrap();

    store.clear().unwrap();
    assert!(store.all_keys().unwrap().is_empty());
  }

  #[test]
  fn test_reopen_keeps_data() {
    let dir = std::env::temp_dir().join(format!("profile-sync-test-{}", std::process::id()));
    let path = dir.join("store.db");
    {
      let store = SqliteStore::open(&path).unwrap();
      store.set_item("hasRunBefore", "true").unwrap();
    }
    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(
      store.get_item("hasRunBefore").unwrap().as_deref(),
      Some("true")
    );
    let _ = std::fs::remove_dir_all(&dir);
  }
}
