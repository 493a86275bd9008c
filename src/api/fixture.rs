//! The mock remote's notion of the "current user".

use color_eyre::eyre::eyre;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::warn;

use super::types::{Preferences, UserProfile};
use crate::db::{DurableStore, REMOTE_PROFILE_KEY};

/// Where the mock remote keeps the profile it serves.
pub trait FixtureStore: Send + Sync {
  fn current(&self) -> UserProfile;
  fn replace(&self, profile: UserProfile);
  /// Go back to the default fixture.
  fn reset(&self);
}

/// The profile every fresh install starts from.
pub fn default_profile() -> UserProfile {
  UserProfile {
    id: "1".to_string(),
    name: "John Doe".to_string(),
    email: "john.doe@example.com".to_string(),
    bio: "Mobile app enthusiast and coffee lover ☕".to_string(),
    profile_picture: "https://i.pravatar.cc/300".to_string(),
    birthday: "1992-09-28T00:00:00.000Z".to_string(),
    preferences: Preferences {
      email_notifications: true,
      push_notifications: true,
    },
  }
}

/// Fixture store held in memory.
pub struct InMemoryFixtures {
  default: UserProfile,
  current: Mutex<UserProfile>,
}

impl InMemoryFixtures {
  pub fn new() -> Self {
    Self::with_default(default_profile())
  }

  pub fn with_default(profile: UserProfile) -> Self {
    Self {
      current: Mutex::new(profile.clone()),
      default: profile,
    }
  }

  fn lock(&self) -> MutexGuard<'_, UserProfile> {
    self.current.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl Default for InMemoryFixtures {
  fn default() -> Self {
    Self::new()
  }
}

impl FixtureStore for InMemoryFixtures {
  fn current(&self) -> UserProfile {
    self.lock().clone()
  }

  fn replace(&self, profile: UserProfile) {
    *self.lock() = profile;
  }

  fn reset(&self) {
    *self.lock() = self.default.clone();
  }
}

/// Fixture store kept in the durable store, so the mock remote survives
/// restarts.
///
/// Only the remote writes here, and only for writes it accepted. Edits still
/// waiting in the offline queue never show up.
pub struct DurableFixtures {
  store: Arc<dyn DurableStore>,
  default: UserProfile,
}

impl DurableFixtures {
  pub fn new(store: Arc<dyn DurableStore>) -> Self {
    Self {
      store,
      default: default_profile(),
    }
  }
}

impl FixtureStore for DurableFixtures {
  fn current(&self) -> UserProfile {
    let stored = match self.store.get_item(REMOTE_PROFILE_KEY) {
      Ok(Some(stored)) => stored,
      Ok(None) => return self.default.clone(),
      Err(e) => {
        warn!(error = %e, "Error loading remote profile, serving default");
        return self.default.clone();
      }
    };

    match serde_json::from_str(&stored) {
      Ok(profile) => profile,
      Err(e) => {
        warn!(error = %e, "Remote profile is unreadable, serving default");
        self.default.clone()
      }
    }
  }

  fn replace(&self, profile: UserProfile) {
    let saved = serde_json::to_string(&profile)
      .map_err(|e| eyre!("Failed to serialize remote profile: {}", e))
      .and_then(|serialized| self.store.set_item(REMOTE_PROFILE_KEY, &serialized));
    if let Err(e) = saved {
      warn!(error = %e, "Error saving remote profile");
    }
  }

  fn reset(&self) {
    if let Err(e) = self.store.remove_item(REMOTE_PROFILE_KEY) {
      warn!(error = %e, "Error resetting remote profile");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::MemoryStore;

  #[test]
  fn test_reset_restores_default() {
    let fixtures = InMemoryFixtures::new();
    let mut changed = fixtures.current();
    changed.name = "Someone Else".to_string();
    fixtures.replace(changed);
    assert_eq!(fixtures.current().name, "Someone Else");

    fixtures.reset();
    assert_eq!(fixtures.current(), default_profile());
  }

  #[test]
  fn test_durable_fixture_survives_reopen() {
    let store = Arc::new(MemoryStore::new());
    let fixtures = DurableFixtures::new(store.clone());
    assert_eq!(fixtures.current(), default_profile());
    assert_eq!(store.get_item(REMOTE_PROFILE_KEY).unwrap(), None);

    let mut changed = fixtures.current();
    changed.bio = "Confirmed".to_string();
    fixtures.replace(changed.clone());

    let reopened = DurableFixtures::new(store.clone());
    assert_eq!(reopened.current(), changed);

    reopened.reset();
    assert_eq!(store.get_item(REMOTE_PROFILE_KEY).unwrap(), None);
    assert_eq!(fixtures.current(), default_profile());
  }

  #[test]
  fn test_durable_fixture_ignores_corrupt_value() {
    let store = Arc::new(MemoryStore::new());
    store.set_item(REMOTE_PROFILE_KEY, "{").unwrap();
    assert_eq!(DurableFixtures::new(store).current(), default_profile());
  }
}
