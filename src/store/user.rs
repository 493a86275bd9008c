use serde::{Deserialize, Serialize};

use super::actions::Action;
use crate::api::UserProfile;

/// The `user` slice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
  /// `None` until the first successful fetch
  #[serde(default)]
  pub user: Option<UserProfile>,
  #[serde(default)]
  pub is_loading: bool,
  #[serde(default)]
  pub error: Option<String>,
}

pub fn reduce(state: &mut UserState, action: &Action) {
  match action {
    Action::FetchUserPending | Action::UpdateUserPending => {
      state.is_loading = true;
      state.error = None;
    }
    Action::FetchUserFulfilled(profile) | Action::UpdateUserFulfilled(profile) => {
      state.is_loading = false;
      state.user = Some(profile.clone());
    }
    Action::FetchUserRejected(message) | Action::UpdateUserRejected(message) => {
      state.is_loading = false;
      state.error = Some(message.clone());
    }
    Action::UpdatePreferences(update) => {
      if let Some(user) = &mut state.user {
        user.preferences = user.preferences.merged(update);
      }
    }
    Action::ClearError => state.error = None,
    Action::ResetUserState => *state = UserState::default(),
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::{default_profile, PreferencesUpdate};

  #[test]
  fn test_pending_fulfilled_cycle() {
    let mut state = UserState {
      error: Some("old".to_string()),
      ..Default::default()
    };

    reduce(&mut state, &Action::FetchUserPending);
    assert!(state.is_loading);
    assert_eq!(state.error, None);

    reduce(&mut state, &Action::FetchUserFulfilled(default_profile()));
    assert!(!state.is_loading);
    assert_eq!(state.user, Some(default_profile()));
  }

  #[test]
  fn test_rejected_keeps_user() {
    let mut state = UserState {
      user: Some(default_profile()),
      ..Default::default()
    };
    reduce(&mut state, &Action::UpdateUserPending);
    reduce(&mut state, &Action::UpdateUserRejected("nope".to_string()));

    assert!(!state.is_loading);
    assert_eq!(state.error.as_deref(), Some("nope"));
    assert_eq!(state.user, Some(default_profile()));

    reduce(&mut state, &Action::ClearError);
    assert_eq!(state.error, None);
  }

  #[test]
  fn test_preferences_without_user_is_noop() {
    let mut state = UserState::default();
    reduce(
      &mut state,
      &Action::UpdatePreferences(PreferencesUpdate {
        email_notifications: Some(false),
        ..Default::default()
      }),
    );
    assert_eq!(state, UserState::default());
  }

  #[test]
  fn test_preferences_merge() {
    let mut state = UserState {
      user: Some(default_profile()),
      ..Default::default()
    };
    reduce(
      &mut state,
      &Action::UpdatePreferences(PreferencesUpdate {
        email_notifications: Some(false),
        ..Default::default()
      }),
    );
    let prefs = state.user.unwrap().preferences;
    assert!(!prefs.email_notifications);
    assert!(prefs.push_notifications);
  }

  #[test]
  fn test_reset() {
    let mut state = UserState {
      user: Some(default_profile()),
      is_loading: true,
      error: Some("x".to_string()),
    };
    reduce(&mut state, &Action::ResetUserState);
    assert_eq!(state, UserState::default());
  }
}
