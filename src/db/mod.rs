//! Durable key-value storage.
//!
//! Everything the sync layer persists goes through [`DurableStore`]: cache
//! entries, the offline mutation queue, the state snapshot and the
//! notification flags. Values are JSON text; keys live under disjoint
//! prefixes so clearing one family never touches another.

mod memory;
mod schema;
mod sqlite;

use color_eyre::Result;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Key holding the persisted application state snapshot.
pub const SNAPSHOT_KEY: &str = "redux_persisted_state";

/// Key holding the offline mutation queue.
pub const OFFLINE_QUEUE_KEY: &str = "offline_queue";

/// Key holding the profile the mock remote last confirmed.
pub const REMOTE_PROFILE_KEY: &str = "mock_remote_profile";

/// Prefix shared by every cache entry key.
pub const CACHE_PREFIX: &str = "cache_";

/// A string-keyed persistent map.
pub trait DurableStore: Send + Sync {
  /// Read a value, `None` if the key was never written or was removed.
  fn get_item(&self, key: &str) -> Result<Option<String>>;

  /// Insert or overwrite a value.
  fn set_item(&self, key: &str, value: &str) -> Result<()>;

  /// Remove a single key. Removing a missing key is not an error.
  fn remove_item(&self, key: &str) -> Result<()>;

  /// Remove several keys at once.
  fn multi_remove(&self, keys: &[String]) -> Result<()>;

  /// List every stored key.
  fn all_keys(&self) -> Result<Vec<String>>;

  /// Remove everything.
  fn clear(&self) -> Result<()>;
}
