use serde::{Deserialize, Serialize};

use super::actions::Action;

/// The `app` slice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
  #[serde(default)]
  pub is_dark_mode: bool,
}

pub fn reduce(state: &mut AppSettings, action: &Action) {
  match action {
    Action::ToggleDarkMode => state.is_dark_mode = !state.is_dark_mode,
    Action::SetDarkMode(dark) => state.is_dark_mode = *dark,
    Action::UpdateSettings(settings) => *state = *settings,
    Action::ResetAppState => *state = AppSettings::default(),
    _ => {}
  }
}
