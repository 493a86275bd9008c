//! Online/offline state machine that drives queue replay.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::connectivity::Connectivity;
use super::queue::{OfflineQueue, ReplayReport};
use crate::api::RemoteApi;

/// What a connectivity report did to the recorded state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  /// Same as the current state, ignored
  Unchanged,
  WentOnline,
  WentOffline,
}

/// Tracks connectivity and replays the offline queue on every
/// offline-to-online edge.
pub struct NetworkObserver {
  online: AtomicBool,
  queue: Arc<OfflineQueue>,
  api: Arc<dyn RemoteApi>,
  listener: Mutex<Option<JoinHandle<()>>>,
}

impl NetworkObserver {
  pub fn new(online: bool, queue: Arc<OfflineQueue>, api: Arc<dyn RemoteApi>) -> Self {
    Self {
      online: AtomicBool::new(online),
      queue,
      api,
      listener: Mutex::new(None),
    }
  }

  /// Create an observer whose initial state comes from a one-shot probe.
  pub fn from_probe(
    connectivity: &dyn Connectivity,
    queue: Arc<OfflineQueue>,
    api: Arc<dyn RemoteApi>,
  ) -> Self {
    Self::new(connectivity.probe(), queue, api)
  }

  pub fn is_online(&self) -> bool {
    self.online.load(Ordering::SeqCst)
  }

  /// Record a connectivity report without acting on it.
  pub fn record(&self, online: bool) -> Transition {
    let was_online = self.online.swap(online, Ordering::SeqCst);
    match (was_online, online) {
      (false, true) => Transition::WentOnline,
      (true, false) => Transition::WentOffline,
      _ => Transition::Unchanged,
    }
  }

  /// Handle a connectivity report. Returns the replay report when the report
  /// was an offline-to-online edge.
  pub async fn report(&self, online: bool) -> Option<ReplayReport> {
    match self.record(online) {
      Transition::WentOnline => {
        info!("Back online, processing offline queue");
        Some(self.queue.replay(self.api.as_ref()).await)
      }
      Transition::WentOffline => {
        info!("Connection lost, queueing writes until it returns");
        None
      }
      Transition::Unchanged => {
        debug!(online, "Connectivity report repeats current state");
        None
      }
    }
  }

  /// Follow connectivity changes on a background task.
  pub fn spawn(self: &Arc<Self>, connectivity: &dyn Connectivity) {
    let mut changes = connectivity.subscribe();
    let observer = Arc::clone(self);

    let handle = tokio::spawn(async move {
      while changes.changed().await.is_ok() {
        let online = *changes.borrow_and_update();
        observer.report(online).await;
      }
    });

    let previous = self
      .listener
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .replace(handle);
    if let Some(previous) = previous {
      previous.abort();
    }
  }

  /// Stop following connectivity changes.
  pub fn shutdown(&self) {
    let listener = self
      .listener
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .take();
    if let Some(listener) = listener {
      listener.abort();
    }
  }
}
