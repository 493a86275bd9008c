//! Durable FIFO of mutations made while offline.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::api::RemoteApi;
use crate::clock::Clock;
use crate::db::{DurableStore, OFFLINE_QUEUE_KEY};

/// What a queued mutation does to its endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MutationKind {
  Create,
  Update,
  Delete,
}

/// A mutation waiting for connectivity.
///
/// The serialized field names are part of the persisted format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedMutation {
  pub id: String,
  #[serde(rename = "timestamp")]
  pub created_at_ms: i64,
  #[serde(rename = "action")]
  pub kind: MutationKind,
  pub endpoint: String,
  #[serde(rename = "data")]
  pub payload: Value,
}

/// Outcome of a replay pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayReport {
  pub attempted: usize,
  pub succeeded: usize,
  pub failed: usize,
  /// Another replay was already running, nothing was attempted
  pub skipped: bool,
}

/// Ordered log of pending mutations, mirrored to the durable store.
pub struct OfflineQueue {
  store: Arc<dyn DurableStore>,
  clock: Arc<dyn Clock>,
  items: Mutex<Vec<QueuedMutation>>,
  replaying: AtomicBool,
  sequence: AtomicU64,
}

/// Clears the in-flight flag when a replay ends, however it ends.
struct ReplayGuard<'a>(&'a AtomicBool);

impl Drop for ReplayGuard<'_> {
  fn drop(&mut self) {
    self.0.store(false, Ordering::SeqCst);
  }
}

impl OfflineQueue {
  pub fn new(store: Arc<dyn DurableStore>, clock: Arc<dyn Clock>) -> Self {
    Self {
      store,
      clock,
      items: Mutex::new(Vec::new()),
      replaying: AtomicBool::new(false),
      sequence: AtomicU64::new(0),
    }
  }

  /// Restore the queue persisted by a previous session.
  ///
  /// A missing or unreadable queue leaves the queue empty. Returns the number
  /// of restored mutations.
  pub fn load(&self) -> usize {
    let restored = match self.store.get_item(OFFLINE_QUEUE_KEY) {
      Ok(Some(stored)) => match serde_json::from_str::<Vec<QueuedMutation>>(&stored) {
        Ok(items) => items,
        Err(e) => {
          warn!(error = %e, "Error loading offline queue, starting empty");
          Vec::new()
        }
      },
      Ok(None) => Vec::new(),
      Err(e) => {
        warn!(error = %e, "Error loading offline queue, starting empty");
        Vec::new()
      }
    };

    let count = restored.len();
    *self.items() = restored;
    if count > 0 {
      info!(count, "Restored offline queue");
    }
    count
  }

  /// Append a mutation and persist the queue.
  pub fn enqueue(&self, kind: MutationKind, endpoint: &str, payload: Value) -> QueuedMutation {
    let now = self.clock.now_ms();
    let mutation = QueuedMutation {
      id: self.next_id(now),
      created_at_ms: now,
      kind,
      endpoint: endpoint.to_string(),
      payload,
    };

    self.items().push(mutation.clone());
    debug!(id = %mutation.id, endpoint, "Queued offline mutation");
    self.persist();

    mutation
  }

  /// Re-attempt every queued mutation, oldest first.
  ///
  /// Successful mutations leave the queue; failed ones stay where they were
  /// for the next pass. The queue is persisted afterwards whatever happened.
  /// A call made while another replay is running does nothing.
  pub async fn replay(&self, api: &dyn RemoteApi) -> ReplayReport {
    if self.replaying.swap(true, Ordering::SeqCst) {
      debug!("Replay already in flight, skipping");
      return ReplayReport {
        skipped: true,
        ..Default::default()
      };
    }
    let _guard = ReplayGuard(&self.replaying);

    let pending = self.snapshot();
    let mut report = ReplayReport::default();
    if pending.is_empty() {
      return report;
    }

    info!(count = pending.len(), "Processing offline queue");
    for item in &pending {
      report.attempted += 1;
      match api.apply_mutation(item).await {
        Ok(()) => {
          self.items().retain(|queued| queued.id != item.id);
          report.succeeded += 1;
        }
        Err(e) => {
          warn!(id = %item.id, endpoint = %item.endpoint, error = %e, "Error processing offline item");
          report.failed += 1;
        }
      }
    }

    self.persist();
    info!(
      succeeded = report.succeeded,
      failed = report.failed,
      "Offline queue processed"
    );
    report
  }

  /// Drop every queued mutation, in memory and on disk.
  pub fn clear(&self) {
    self.items().clear();
    if let Err(e) = self.store.remove_item(OFFLINE_QUEUE_KEY) {
      warn!(error = %e, "Error removing offline queue");
    }
  }

  pub fn len(&self) -> usize {
    self.items().len()
  }

  pub fn is_empty(&self) -> bool {
    self.items().is_empty()
  }

  /// Copy of the queue in FIFO order.
  pub fn snapshot(&self) -> Vec<QueuedMutation> {
    self.items().clone()
  }

  fn persist(&self) {
    let serialized = serde_json::to_string(&*self.items());
    let result = match serialized {
      Ok(text) => self.store.set_item(OFFLINE_QUEUE_KEY, &text),
      Err(e) => Err(e.into()),
    };
    if let Err(e) = result {
      warn!(error = %e, "Error saving offline queue");
    }
  }

  /// Timestamp followed by a short hash of (timestamp, sequence, process).
  fn next_id(&self, now_ms: i64) -> String {
    let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);

    let mut hasher = Sha256::new();
    hasher.update(now_ms.to_be_bytes());
    hasher.update(sequence.to_be_bytes());
    hasher.update(std::process::id().to_be_bytes());
    let digest = hex::encode(hasher.finalize());

    format!("{}{}", now_ms, &digest[..7])
  }

  fn items(&self) -> MutexGuard<'_, Vec<QueuedMutation>> {
    self.items.lock().unwrap_or_else(PoisonError::into_inner)
  }
}
