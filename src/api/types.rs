use serde::{Deserialize, Serialize};

/// The user's profile as the remote and the state store see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  pub id: String,
  pub name: String,
  pub email: String,
  pub bio: String,
  /// URI of the profile picture
  pub profile_picture: String,
  /// ISO-8601 date or date-time
  pub birthday: String,
  pub preferences: Preferences,
}

/// Notification preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
  pub email_notifications: bool,
  pub push_notifications: bool,
}

/// A partial profile. Fields left as `None` are kept as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub bio: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub profile_picture: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub birthday: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub preferences: Option<PreferencesUpdate>,
}

/// A partial set of preferences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email_notifications: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub push_notifications: Option<bool>,
}

impl UserProfile {
  /// Shallow merge: every field present in `update` wins.
  pub fn merged(&self, update: &ProfileUpdate) -> UserProfile {
    let mut profile = self.clone();
    if let Some(name) = &update.name {
      profile.name = name.clone();
    }
    if let Some(email) = &update.email {
      profile.email = email.clone();
    }
    if let Some(bio) = &update.bio {
      profile.bio = bio.clone();
    }
    if let Some(picture) = &update.profile_picture {
      profile.profile_picture = picture.clone();
    }
    if let Some(birthday) = &update.birthday {
      profile.birthday = birthday.clone();
    }
    if let Some(preferences) = &update.preferences {
      profile.preferences = profile.preferences.merged(preferences);
    }
    profile
  }
}

impl Preferences {
  pub fn merged(&self, update: &PreferencesUpdate) -> Preferences {
    Preferences {
      email_notifications: update
        .email_notifications
        .unwrap_or(self.email_notifications),
      push_notifications: update.push_notifications.unwrap_or(self.push_notifications),
    }
  }
}
