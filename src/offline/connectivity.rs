//! Where connectivity reports come from.

use tokio::sync::watch;

/// Source of connectivity information.
pub trait Connectivity: Send + Sync {
  /// One-shot check of the current connectivity.
  fn probe(&self) -> bool;

  /// Subscribe to connectivity changes. The current value counts as seen.
  fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Connectivity driven from code: the CLI flag, tests, or a platform hook.
#[derive(Debug)]
pub struct ConnectivitySignal {
  tx: watch::Sender<bool>,
}

impl ConnectivitySignal {
  pub fn new(online: bool) -> Self {
    let (tx, _rx) = watch::channel(online);
    Self { tx }
  }

  pub fn set_online(&self, online: bool) {
    self.tx.send_replace(online);
  }
}

impl Connectivity for ConnectivitySignal {
  fn probe(&self) -> bool {
    *self.tx.borrow()
  }

  fn subscribe(&self) -> watch::Receiver<bool> {
    self.tx.subscribe()
  }
}
