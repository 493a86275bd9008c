//! Application state store.
//!
//! The state has exactly two slices, `user` and `app`. It only changes through
//! [`Action`]s, which are applied in dispatch order; middleware sees every
//! action after it has been reduced.

mod actions;
mod app;
mod persistence;
mod user;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

pub use actions::{Action, PERSISTABLE_ACTIONS};
pub use app::AppSettings;
pub use persistence::{PersistedSnapshot, PersistenceMiddleware, DEFAULT_DEBOUNCE};
pub use user::UserState;

/// Both slices together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootState {
  #[serde(default)]
  pub user: UserState,
  #[serde(default)]
  pub app: AppSettings,
}

/// Observer of dispatched actions.
pub trait Middleware: Send + Sync {
  /// Called after `action` has been applied to the state.
  fn after_dispatch(&self, action: &Action);
}

/// Holds the application state.
pub struct Store {
  state: watch::Sender<RootState>,
  middleware: Vec<Arc<dyn Middleware>>,
}

impl Store {
  pub fn new(initial: RootState) -> Self {
    let (state, _rx) = watch::channel(initial);
    Self {
      state,
      middleware: Vec::new(),
    }
  }

  pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
    self.middleware.push(middleware);
  }

  /// Current state.
  pub fn state(&self) -> RootState {
    self.state.borrow().clone()
  }

  /// Watch the state; the receiver sees the latest state after each action.
  pub fn subscribe(&self) -> watch::Receiver<RootState> {
    self.state.subscribe()
  }

  pub fn dispatch(&self, action: Action) {
    debug!(action = action.action_type(), "Action dispatched");

    self.state.send_modify(|state| {
      user::reduce(&mut state.user, &action);
      app::reduce(&mut state.app, &action);
    });

    for middleware in &self.middleware {
      middleware.after_dispatch(&action);
    }
  }
}

impl Default for Store {
  fn default() -> Self {
    Self::new(RootState::default())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::default_profile;
  use std::sync::Mutex;

  #[derive(Default)]
  struct Recorder {
    seen: Mutex<Vec<&'static str>>,
  }

  impl Middleware for Recorder {
    fn after_dispatch(&self, action: &Action) {
      self.seen.lock().unwrap().push(action.action_type());
    }
  }

  #[test]
  fn test_user_is_none_until_fetched() {
    let store = Store::default();
    assert_eq!(store.state().user.user, None);

    store.dispatch(Action::FetchUserPending);
    assert!(store.state().user.is_loading);
    store.dispatch(Action::FetchUserFulfilled(default_profile()));
    assert_eq!(store.state().user.user, Some(default_profile()));
  }

  #[test]
  fn test_middleware_sees_actions_in_order() {
    let recorder = Arc::new(Recorder::default());
    let mut store = Store::default();
    store.add_middleware(recorder.clone());

    store.dispatch(Action::ToggleDarkMode);
    store.dispatch(Action::ClearError);
    store.dispatch(Action::ResetAppState);

    assert_eq!(
      *recorder.seen.lock().unwrap(),
      vec!["app/toggleDarkMode", "user/clearError", "app/resetAppState"]
    );
  }

  #[test]
  fn test_subscribers_see_latest_state() {
    let store = Store::default();
    let mut rx = store.subscribe();

    store.dispatch(Action::ToggleDarkMode);
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().app.is_dark_mode);
  }

  #[test]
  fn test_root_state_json_shape() {
    let value = serde_json::to_value(RootState::default()).unwrap();
    assert_eq!(
      value,
      serde_json::json!({
        "user": {"user": null, "isLoading": false, "error": null},
        "app": {"isDarkMode": false}
      })
    );
  }
}
