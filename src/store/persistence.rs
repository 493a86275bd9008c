//! Debounced snapshot persistence.

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::actions::Action;
use super::app::AppSettings;
use super::user::UserState;
use super::{Middleware, RootState};
use crate::clock::Clock;
use crate::db::{DurableStore, SNAPSHOT_KEY};

/// Quiet window before a snapshot is written.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Everything needed to restore the application state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSnapshot {
  #[serde(default)]
  pub user: UserState,
  #[serde(default)]
  pub app: AppSettings,
  pub timestamp: i64,
}

impl PersistedSnapshot {
  /// State to seed the store with. A snapshot written mid-request must not
  /// leave the store loading forever.
  pub fn into_state(self) -> RootState {
    RootState {
      user: UserState {
        is_loading: false,
        ..self.user
      },
      app: self.app,
    }
  }
}

/// Writes the whole state to the durable store after a burst of qualifying
/// actions has gone quiet.
///
/// Each qualifying action cancels the pending write and schedules a new one,
/// so only the state after the last action of a burst is written.
pub struct PersistenceMiddleware {
  writer: Arc<SnapshotWriter>,
  debounce: Duration,
  pending: Mutex<Option<JoinHandle<()>>>,
}

struct SnapshotWriter {
  store: Arc<dyn DurableStore>,
  clock: Arc<dyn Clock>,
  state: watch::Receiver<RootState>,
}

impl SnapshotWriter {
  fn write(&self) -> Result<()> {
    let state = self.state.borrow().clone();
    let snapshot = PersistedSnapshot {
      user: state.user,
      app: state.app,
      timestamp: self.clock.now_ms(),
    };

    let serialized =
      serde_json::to_string(&snapshot).map_err(|e| eyre!("Failed to serialize state: {}", e))?;
    self.store.set_item(SNAPSHOT_KEY, &serialized)?;

    info!(timestamp = snapshot.timestamp, "State saved");
    Ok(())
  }
}

impl PersistenceMiddleware {
  pub fn new(
    store: Arc<dyn DurableStore>,
    clock: Arc<dyn Clock>,
    state: watch::Receiver<RootState>,
    debounce: Duration,
  ) -> Self {
    Self {
      writer: Arc::new(SnapshotWriter {
        store,
        clock,
        state,
      }),
      debounce,
      pending: Mutex::new(None),
    }
  }

  /// Read the snapshot left by a previous session.
  ///
  /// A missing or unreadable snapshot yields `None`; the latter is logged.
  pub fn load_snapshot(store: &dyn DurableStore) -> Option<PersistedSnapshot> {
    let stored = match store.get_item(SNAPSHOT_KEY) {
      Ok(Some(stored)) => stored,
      Ok(None) => {
        debug!("No persisted state found");
        return None;
      }
      Err(e) => {
        warn!(error = %e, "Error loading state");
        return None;
      }
    };

    match serde_json::from_str(&stored) {
      Ok(snapshot) => Some(snapshot),
      Err(e) => {
        warn!(error = %e, "Persisted state is unreadable, using defaults");
        None
      }
    }
  }

  /// Whether a write is scheduled but has not happened yet.
  pub fn has_pending(&self) -> bool {
    self
      .pending()
      .as_ref()
      .is_some_and(|handle| !handle.is_finished())
  }

  /// Drop the scheduled write, if any.
  pub fn cancel(&self) {
    if let Some(handle) = self.pending().take() {
      handle.abort();
    }
  }

  /// Cancel the scheduled write and write the current state now.
  pub fn flush(&self) -> Result<()> {
    self.cancel();
    self.writer.write()
  }

  /// Remove the persisted snapshot.
  pub fn clear_snapshot(&self) -> Result<()> {
    self.cancel();
    self.writer.store.remove_item(SNAPSHOT_KEY)
  }

  fn schedule(&self) {
    let mut pending = self.pending();
    if let Some(previous) = pending.take() {
      previous.abort();
    }

    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
      // No runtime to wait on; write straight away.
      if let Err(e) = self.writer.write() {
        warn!(error = %e, "Error saving state");
      }
      return;
    };

    let writer = Arc::clone(&self.writer);
    let debounce = self.debounce;
    *pending = Some(runtime.spawn(async move {
      tokio::time::sleep(debounce).await;
      if let Err(e) = writer.write() {
        warn!(error = %e, "Error saving state");
      }
    }));
  }

  fn pending(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
    self.pending.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl Middleware for PersistenceMiddleware {
  fn after_dispatch(&self, action: &Action) {
    if action.is_persistable() {
      debug!(action = action.action_type(), "Triggering persistence");
      self.schedule();
    }
  }
}

impl Drop for PersistenceMiddleware {
  fn drop(&mut self) {
    self.cancel();
  }
}
