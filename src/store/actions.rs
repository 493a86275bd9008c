use crate::api::{PreferencesUpdate, UserProfile};

use super::app::AppSettings;

/// Every way the application state can change.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
  FetchUserPending,
  FetchUserFulfilled(UserProfile),
  FetchUserRejected(String),
  UpdateUserPending,
  UpdateUserFulfilled(UserProfile),
  UpdateUserRejected(String),
  UpdatePreferences(PreferencesUpdate),
  ClearError,
  ResetUserState,
  ToggleDarkMode,
  SetDarkMode(bool),
  UpdateSettings(AppSettings),
  ResetAppState,
}

/// Action types that schedule a snapshot write.
pub const PERSISTABLE_ACTIONS: &[&str] = &[
  "user/updateUser/fulfilled",
  "user/fetchUser/fulfilled",
  "user/updatePreferences",
  "app/updateSettings",
  "app/toggleDarkMode",
  "app/setDarkMode",
];

impl Action {
  /// Stable name of the action, `slice/name[/phase]`.
  pub fn action_type(&self) -> &'static str {
    match self {
      Action::FetchUserPending => "user/fetchUser/pending",
      Action::FetchUserFulfilled(_) => "user/fetchUser/fulfilled",
      Action::FetchUserRejected(_) => "user/fetchUser/rejected",
      Action::UpdateUserPending => "user/updateUser/pending",
      Action::UpdateUserFulfilled(_) => "user/updateUser/fulfilled",
      Action::UpdateUserRejected(_) => "user/updateUser/rejected",
      Action::UpdatePreferences(_) => "user/updatePreferences",
      Action::ClearError => "user/clearError",
      Action::ResetUserState => "user/resetUserState",
      Action::ToggleDarkMode => "app/toggleDarkMode",
      Action::SetDarkMode(_) => "app/setDarkMode",
      Action::UpdateSettings(_) => "app/updateSettings",
      Action::ResetAppState => "app/resetAppState",
    }
  }

  pub fn is_persistable(&self) -> bool {
    PERSISTABLE_ACTIONS.contains(&self.action_type())
  }
}
