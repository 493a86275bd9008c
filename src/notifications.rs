//! Notification permission and first-run flags.
//!
//! A refused permission is recorded as a persisted status, never raised as an
//! error; callers re-check it whenever it matters.

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::DurableStore;

const PERMISSION_KEY: &str = "notificationPermission";
const FIRST_RUN_KEY: &str = "hasRunBefore";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionStatus {
  Granted,
  Denied,
  NotRequested,
}

impl std::fmt::Display for PermissionStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let label = match self {
      PermissionStatus::Granted => "granted",
      PermissionStatus::Denied => "denied",
      PermissionStatus::NotRequested => "not-requested",
    };
    f.write_str(label)
  }
}

/// Persisted notification flags.
#[derive(Clone)]
pub struct NotificationSettings {
  store: Arc<dyn DurableStore>,
}

impl NotificationSettings {
  pub fn new(store: Arc<dyn DurableStore>) -> Self {
    Self { store }
  }

  /// Current permission; anything unreadable counts as not requested.
  pub fn check_permission(&self) -> PermissionStatus {
    let stored = match self.store.get_item(PERMISSION_KEY) {
      Ok(stored) => stored,
      Err(e) => {
        warn!(error = %e, "Error checking notification permission");
        return PermissionStatus::NotRequested;
      }
    };

    stored
      .and_then(|text| serde_json::from_str(&text).ok())
      .unwrap_or(PermissionStatus::NotRequested)
  }

  /// Record the user's answer to the permission prompt.
  pub fn record_permission(&self, granted: bool) -> Result<PermissionStatus> {
    let status = if granted {
      PermissionStatus::Granted
    } else {
      PermissionStatus::Denied
    };
    let serialized =
      serde_json::to_string(&status).map_err(|e| eyre!("Failed to serialize permission: {}", e))?;
    self.store.set_item(PERMISSION_KEY, &serialized)?;

    info!(%status, "Notification permission recorded");
    Ok(status)
  }

  pub fn is_first_run(&self) -> bool {
    match self.store.get_item(FIRST_RUN_KEY) {
      Ok(stored) => stored.is_none(),
      Err(e) => {
        warn!(error = %e, "Error checking first run");
        true
      }
    }
  }

  pub fn mark_first_run_complete(&self) -> Result<()> {
    self.store.set_item(FIRST_RUN_KEY, "true")
  }
}
