//! Data-access facade.
//!
//! Every read and write the application makes goes through [`ProfileService`],
//! which chooses between the remote, the cache and the offline queue based on
//! connectivity, and keeps the state store in step.

use chrono::{DateTime, NaiveDate, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::api::{
  Preferences, PreferencesUpdate, ProfileUpdate, ProgressFn, RemoteApi, UserProfile,
  PROFILE_ENDPOINT, SETTINGS_ENDPOINT,
};
use crate::cache::{CacheResult, ExpiringCache};
use crate::clock::Clock;
use crate::config::CacheConfig;
use crate::db::DurableStore;
use crate::notifications::{NotificationSettings, PermissionStatus};
use crate::offline::{MutationKind, NetworkObserver, OfflineQueue};
use crate::store::{Action, AppSettings, PersistenceMiddleware, RootState, Store};
use crate::validation::validate_update;

/// Cache key of the last known profile.
pub const USER_PROFILE_KEY: &str = "user_profile";

/// Cache key of the settings shadow copy.
pub const APP_SETTINGS_KEY: &str = "app_settings";

pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch user profile";
pub const NO_PROFILE_MESSAGE: &str = "No user profile found";

const FETCH_USER: &str = "user/fetchUser";
const UPDATE_USER: &str = "user/updateUser";

/// An operation that ended in a rejected action. The message is also in the
/// store's `user.error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RejectedAction {
  pub action: &'static str,
  pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceOutcome {
  Applied,
  /// Push notifications were not enabled because permission is missing
  PushBlocked(PermissionStatus),
}

/// Settings as cached and sent to the settings endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedSettings {
  pub is_dark_mode: bool,
  #[serde(default)]
  pub preferences: Option<Preferences>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageInfo {
  pub cache_entries: usize,
  pub queue_length: usize,
  pub keys: Vec<String>,
  /// Total length of all stored values
  pub used_bytes: usize,
}

/// Everything the facade is built from.
pub struct ServiceParts {
  pub store: Arc<Store>,
  pub persistence: Arc<PersistenceMiddleware>,
  pub cache: Arc<ExpiringCache>,
  pub queue: Arc<OfflineQueue>,
  pub network: Arc<NetworkObserver>,
  pub api: Arc<dyn RemoteApi>,
  pub durable: Arc<dyn DurableStore>,
  pub clock: Arc<dyn Clock>,
  pub ttls: CacheConfig,
}

pub struct ProfileService {
  store: Arc<Store>,
  persistence: Arc<PersistenceMiddleware>,
  cache: Arc<ExpiringCache>,
  queue: Arc<OfflineQueue>,
  network: Arc<NetworkObserver>,
  api: Arc<dyn RemoteApi>,
  durable: Arc<dyn DurableStore>,
  notifications: NotificationSettings,
  clock: Arc<dyn Clock>,
  ttls: CacheConfig,
}

impl ProfileService {
  pub fn new(parts: ServiceParts) -> Self {
    Self {
      notifications: NotificationSettings::new(parts.durable.clone()),
      store: parts.store,
      persistence: parts.persistence,
      cache: parts.cache,
      queue: parts.queue,
      network: parts.network,
      api: parts.api,
      durable: parts.durable,
      clock: parts.clock,
      ttls: parts.ttls,
    }
  }

  /// Load the profile.
  ///
  /// Offline with a cached profile, the cache is served without calling the
  /// remote. Otherwise the remote is asked and the cache is the fallback.
  pub async fn fetch_user(&self) -> Result<CacheResult<UserProfile>, RejectedAction> {
    self.store.dispatch(Action::FetchUserPending);

    let cached: Option<UserProfile> = self.cache.get_as(USER_PROFILE_KEY);
    if let Some(profile) = &cached {
      if !self.network.is_online() {
        info!("Offline, using cached user profile");
        self.store.dispatch(Action::FetchUserFulfilled(profile.clone()));
        return Ok(CacheResult::offline(profile.clone()));
      }
    }

    match self.api.fetch_profile().await {
      Ok(profile) => {
        self.cache_profile(&profile);
        self.store.dispatch(Action::FetchUserFulfilled(profile.clone()));
        Ok(CacheResult::from_network(profile))
      }
      Err(e) => {
        warn!(error = %e, "Error fetching user profile");
        match cached {
          Some(profile) => {
            info!("Using cached user profile as fallback");
            self.store.dispatch(Action::FetchUserFulfilled(profile.clone()));
            Ok(CacheResult::fallback(profile))
          }
          None => Err(self.reject_fetch(FETCH_FAILED_MESSAGE.to_string())),
        }
      }
    }
  }

  /// Apply a partial update to the loaded profile.
  ///
  /// Online, the remote's confirmed profile is committed. Offline, the merged
  /// profile is committed at once and queued for the profile endpoint.
  pub async fn update_user(&self, update: ProfileUpdate) -> Result<UserProfile, RejectedAction> {
    self.store.dispatch(Action::UpdateUserPending);

    let Some(current) = self.store.state().user.user else {
      return Err(self.reject_update(NO_PROFILE_MESSAGE.to_string()));
    };
    if let Err(e) = validate_update(&update, self.today()) {
      return Err(self.reject_update(e.to_string()));
    }

    let merged = current.merged(&update);

    if !self.network.is_online() {
      let payload = match serde_json::to_value(&merged) {
        Ok(payload) => payload,
        Err(e) => return Err(self.reject_update(format!("Failed to queue update: {}", e))),
      };
      self.cache_profile(&merged);
      self.queue.enqueue(MutationKind::Update, PROFILE_ENDPOINT, payload);
      info!("Offline, profile update queued");

      self.store.dispatch(Action::UpdateUserFulfilled(merged.clone()));
      return Ok(merged);
    }

    match self.api.update_profile(update).await {
      Ok(confirmed) => {
        self.cache_profile(&confirmed);
        self.store.dispatch(Action::UpdateUserFulfilled(confirmed.clone()));
        Ok(confirmed)
      }
      Err(e) => {
        warn!(error = %e, "Error updating user profile");
        Err(self.reject_update(e.to_string()))
      }
    }
  }

  /// Upload a picture and make it the profile picture.
  pub async fn upload_picture(
    &self,
    uri: &str,
    on_progress: ProgressFn<'_>,
  ) -> Result<UserProfile, RejectedAction> {
    self.store.dispatch(Action::UpdateUserPending);

    let remote_uri = match self.api.upload_picture(uri, on_progress).await {
      Ok(remote_uri) => remote_uri,
      Err(e) => {
        warn!(error = %e, "Error uploading picture");
        return Err(self.reject_update(e.to_string()));
      }
    };

    self
      .update_user(ProfileUpdate {
        profile_picture: Some(remote_uri),
        ..Default::default()
      })
      .await
  }

  /// Merge notification preferences into the loaded profile.
  ///
  /// Turning push notifications on needs a granted permission. Without one
  /// the push preference is left alone and the rest of the update applies.
  pub fn update_preferences(&self, mut update: PreferencesUpdate) -> PreferenceOutcome {
    let mut outcome = PreferenceOutcome::Applied;

    if update.push_notifications == Some(true) {
      let status = self.notifications.check_permission();
      if status != PermissionStatus::Granted {
        info!(%status, "Push notifications need permission");
        update.push_notifications = None;
        outcome = PreferenceOutcome::PushBlocked(status);
      }
    }

    if update != PreferencesUpdate::default() {
      self.store.dispatch(Action::UpdatePreferences(update));
      if let Some(profile) = self.store.state().user.user {
        self.cache_profile(&profile);
      }
      self.save_settings();
    }

    outcome
  }

  /// Flip the theme and return whether dark mode is now on.
  pub fn toggle_theme(&self) -> bool {
    self.store.dispatch(Action::ToggleDarkMode);
    self.save_settings();
    self.store.state().app.is_dark_mode
  }

  pub fn set_dark_mode(&self, dark: bool) {
    self.store.dispatch(Action::SetDarkMode(dark));
    self.save_settings();
  }

  /// Settings saved by an earlier session, if still cached.
  pub fn cached_settings(&self) -> Option<SyncedSettings> {
    self.cache.get_as(APP_SETTINGS_KEY)
  }

  /// Apply cached settings to the app slice. Returns whether any were found.
  pub fn restore_cached_settings(&self) -> bool {
    match self.cached_settings() {
      Some(settings) => {
        self.store.dispatch(Action::UpdateSettings(AppSettings {
          is_dark_mode: settings.is_dark_mode,
        }));
        true
      }
      None => false,
    }
  }

  /// Wipe everything and start again from the remote's default profile.
  pub async fn reset_all_data(&self) -> Result<UserProfile> {
    info!("Resetting all data");
    self.persistence.cancel();

    self.durable.clear()?;
    self.queue.clear();
    self.cache.clear();
    self.store.dispatch(Action::ResetUserState);
    self.store.dispatch(Action::ResetAppState);
    self.api.reset_to_default();

    Ok(self.fetch_user().await?.data)
  }

  pub fn storage_info(&self) -> Result<StorageInfo> {
    let keys = self.durable.all_keys()?;
    let mut used_bytes = 0;
    for key in &keys {
      if let Some(value) = self.durable.get_item(key)? {
        used_bytes += value.len();
      }
    }

    Ok(StorageInfo {
      cache_entries: self.cache.durable_len(),
      queue_length: self.queue.len(),
      keys,
      used_bytes,
    })
  }

  pub fn clear_error(&self) {
    self.store.dispatch(Action::ClearError);
  }

  pub fn is_online(&self) -> bool {
    self.network.is_online()
  }

  pub fn state(&self) -> RootState {
    self.store.state()
  }

  pub fn subscribe(&self) -> watch::Receiver<RootState> {
    self.store.subscribe()
  }

  pub fn notifications(&self) -> &NotificationSettings {
    &self.notifications
  }

  pub fn queue(&self) -> &Arc<OfflineQueue> {
    &self.queue
  }

  pub fn network(&self) -> &Arc<NetworkObserver> {
    &self.network
  }

  fn cache_profile(&self, profile: &UserProfile) {
    self
      .cache
      .set_as(USER_PROFILE_KEY, profile, self.ttls.profile_ttl_minutes);
  }

  /// Cache the settings shadow copy and, offline, queue it for the remote.
  fn save_settings(&self) {
    let state = self.store.state();
    let settings = SyncedSettings {
      is_dark_mode: state.app.is_dark_mode,
      preferences: state.user.user.map(|user| user.preferences),
    };
    self
      .cache
      .set_as(APP_SETTINGS_KEY, &settings, self.ttls.settings_ttl_minutes);

    if !self.network.is_online() {
      match serde_json::to_value(settings) {
        Ok(payload) => {
          self.queue.enqueue(MutationKind::Update, SETTINGS_ENDPOINT, payload);
        }
        Err(e) => warn!(error = %e, "Failed to queue settings"),
      }
    }
  }

  fn reject_fetch(&self, message: String) -> RejectedAction {
    self.store.dispatch(Action::FetchUserRejected(message.clone()));
    RejectedAction {
      action: FETCH_USER,
      message,
    }
  }

  fn reject_update(&self, message: String) -> RejectedAction {
    self.store.dispatch(Action::UpdateUserRejected(message.clone()));
    RejectedAction {
      action: UPDATE_USER,
      message,
    }
  }

  fn today(&self) -> NaiveDate {
    DateTime::<Utc>::from_timestamp_millis(self.clock.now_ms())
      .unwrap_or_else(Utc::now)
      .date_naive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::{default_profile, InMemoryFixtures, MockApi, UPDATE_FAILED_MESSAGE};
  use crate::clock::ManualClock;
  use crate::db::{MemoryStore, CACHE_PREFIX, OFFLINE_QUEUE_KEY};
  use crate::store::DEFAULT_DEBOUNCE;
  use std::sync::Mutex;

  // 2024-06-01T00:00:00Z
  const NOW_MS: i64 = 1_717_200_000_000;

  struct Harness {
    service: ProfileService,
    api: Arc<MockApi>,
    durable: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
  }

  fn harness(online: bool) -> Harness {
    let durable = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(NOW_MS));
    let api = Arc::new(MockApi::instant(Arc::new(InMemoryFixtures::new())));

    let mut store = Store::default();
    let persistence = Arc::new(PersistenceMiddleware::new(
      durable.clone(),
      clock.clone(),
      store.subscribe(),
      DEFAULT_DEBOUNCE,
    ));
    store.add_middleware(persistence.clone());

    let cache = Arc::new(ExpiringCache::new(durable.clone(), clock.clone()));
    let queue = Arc::new(OfflineQueue::new(durable.clone(), clock.clone()));
    let network = Arc::new(NetworkObserver::new(online, queue.clone(), api.clone()));

    let service = ProfileService::new(ServiceParts {
      store: Arc::new(store),
      persistence,
      cache,
      queue,
      network,
      api: api.clone(),
      durable: durable.clone(),
      clock: clock.clone(),
      ttls: CacheConfig::default(),
    });

    Harness {
      service,
      api,
      durable,
      clock,
    }
  }

  fn rename(name: &str) -> ProfileUpdate {
    ProfileUpdate {
      name: Some(name.to_string()),
      ..Default::default()
    }
  }

  #[tokio::test]
  async fn test_online_fetch_caches_profile() {
    let h = harness(true);
    let result = h.service.fetch_user().await.unwrap();

    assert_eq!(result, CacheResult::from_network(default_profile()));
    assert_eq!(h.service.state().user.user, Some(default_profile()));
    assert!(h.durable.get_item("cache_user_profile").unwrap().is_some());
  }

  #[tokio::test]
  async fn test_offline_fetch_serves_cache_without_remote_call() {
    let h = harness(true);
    h.service.fetch_user().await.unwrap();
    h.service.network().record(false);

    let result = h.service.fetch_user().await.unwrap();

    assert_eq!(result, CacheResult::offline(default_profile()));
    assert_eq!(h.api.calls().fetch, 1);
    assert!(!h.service.state().user.is_loading);
  }

  #[tokio::test]
  async fn test_fetch_falls_back_to_cache_when_remote_fails() {
    let h = harness(true);
    h.service.fetch_user().await.unwrap();
    h.api.set_reachable(false);

    let result = h.service.fetch_user().await.unwrap();
    assert_eq!(result, CacheResult::fallback(default_profile()));
    assert_eq!(h.service.state().user.error, None);
  }

  #[tokio::test]
  async fn test_fetch_rejects_without_cache_or_remote() {
    let h = harness(false);
    h.api.set_reachable(false);

    let err = h.service.fetch_user().await.unwrap_err();
    assert_eq!(err.action, "user/fetchUser");
    assert_eq!(err.message, FETCH_FAILED_MESSAGE);

    let state = h.service.state().user;
    assert_eq!(state.error.as_deref(), Some(FETCH_FAILED_MESSAGE));
    assert_eq!(state.user, None);
    assert!(!state.is_loading);
  }

  #[tokio::test]
  async fn test_expired_profile_cache_is_not_served_offline() {
    let h = harness(true);
    h.service.fetch_user().await.unwrap();
    h.service.network().record(false);
    h.clock.advance_minutes(60 * 24 + 1);

    let result = h.service.fetch_user().await.unwrap();
    assert_eq!(result.source, crate::cache::CacheSource::Network);
    assert_eq!(h.api.calls().fetch, 2);
  }

  #[tokio::test]
  async fn test_online_update_commits_confirmed_profile() {
    let h = harness(true);
    h.service.fetch_user().await.unwrap();

    let updated = h.service.update_user(rename("Jane")).await.unwrap();
    assert_eq!(updated.name, "Jane");
    assert_eq!(h.api.fixtures().current().name, "Jane");
    assert_eq!(h.service.state().user.user.unwrap().name, "Jane");
    assert!(h.service.queue().is_empty());
  }

  #[tokio::test]
  async fn test_online_update_failure_keeps_profile() {
    let h = harness(true);
    h.service.fetch_user().await.unwrap();
    h.api.set_failure_rate(1.0);

    let err = h.service.update_user(rename("Jane")).await.unwrap_err();
    assert_eq!(err.message, UPDATE_FAILED_MESSAGE);

    let state = h.service.state().user;
    assert_eq!(state.user, Some(default_profile()));
    assert_eq!(state.error.as_deref(), Some(UPDATE_FAILED_MESSAGE));
    assert!(!state.is_loading);
  }

  #[tokio::test]
  async fn test_update_without_profile_is_rejected() {
    let h = harness(true);
    let err = h.service.update_user(rename("Jane")).await.unwrap_err();
    assert_eq!(err.message, NO_PROFILE_MESSAGE);
    assert_eq!(h.api.calls().update, 0);
  }

  #[tokio::test]
  async fn test_invalid_update_never_reaches_remote() {
    let h = harness(true);
    h.service.fetch_user().await.unwrap();

    let err = h
      .service
      .update_user(ProfileUpdate {
        email: Some("not-an-email".to_string()),
        ..Default::default()
      })
      .await
      .unwrap_err();

    assert_eq!(err.message, "Invalid email format");
    assert_eq!(h.api.calls().update, 0);
    assert_eq!(h.service.state().user.user, Some(default_profile()));

    h.service.clear_error();
    assert_eq!(h.service.state().user.error, None);
  }

  #[tokio::test]
  async fn test_offline_update_commits_and_queues() {
    let h = harness(true);
    h.service.fetch_user().await.unwrap();
    h.service.network().record(false);

    let updated = h.service.update_user(rename("Jane")).await.unwrap();

    assert_eq!(updated.name, "Jane");
    assert_eq!(h.service.state().user.user.unwrap().name, "Jane");
    assert_eq!(h.api.calls().update, 0);

    let queued = h.service.queue().snapshot();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].kind, MutationKind::Update);
    assert_eq!(queued[0].endpoint, PROFILE_ENDPOINT);
    assert_eq!(queued[0].payload["name"], "Jane");

    // The cache follows the local edit.
    let result = h.service.fetch_user().await.unwrap();
    assert_eq!(result.data.name, "Jane");
  }

  #[tokio::test]
  async fn test_reconnect_replays_offline_update() {
    let h = harness(true);
    h.service.fetch_user().await.unwrap();
    h.service.network().record(false);
    h.service.update_user(rename("Jane")).await.unwrap();

    let report = h.service.network().report(true).await.unwrap();

    assert_eq!(report.succeeded, 1);
    assert!(h.service.queue().is_empty());
    assert_eq!(h.api.fixtures().current().name, "Jane");
    assert_eq!(h.durable.get_item(OFFLINE_QUEUE_KEY).unwrap().as_deref(), Some("[]"));
  }

  #[tokio::test]
  async fn test_failed_replay_keeps_mutation_queued() {
    let h = harness(true);
    h.service.fetch_user().await.unwrap();
    h.service.network().record(false);
    h.service.update_user(rename("Jane")).await.unwrap();
    let before = h.service.queue().snapshot();

    h.api.set_failure_rate(1.0);
    let report = h.service.network().report(true).await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(h.service.queue().snapshot(), before);
    assert_eq!(h.api.fixtures().current().name, "John Doe");
  }

  #[tokio::test]
  async fn test_push_needs_granted_permission() {
    let h = harness(true);
    h.service.fetch_user().await.unwrap();
    h.service.update_preferences(PreferencesUpdate {
      push_notifications: Some(false),
      ..Default::default()
    });

    let outcome = h.service.update_preferences(PreferencesUpdate {
      push_notifications: Some(true),
      email_notifications: Some(false),
    });
    assert_eq!(outcome, PreferenceOutcome::PushBlocked(PermissionStatus::NotRequested));
    let prefs = h.service.state().user.user.unwrap().preferences;
    assert!(!prefs.push_notifications);
    assert!(!prefs.email_notifications);

    h.service.notifications().record_permission(true).unwrap();
    let outcome = h.service.update_preferences(PreferencesUpdate {
      push_notifications: Some(true),
      ..Default::default()
    });
    assert_eq!(outcome, PreferenceOutcome::Applied);
    assert!(h.service.state().user.user.unwrap().preferences.push_notifications);
  }

  #[tokio::test]
  async fn test_offline_theme_change_is_cached_and_queued() {
    let h = harness(true);
    h.service.fetch_user().await.unwrap();

    assert!(h.service.toggle_theme());
    assert!(h.service.queue().is_empty());

    h.service.network().record(false);
    assert!(!h.service.toggle_theme());

    let queued = h.service.queue().snapshot();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].endpoint, SETTINGS_ENDPOINT);
    assert_eq!(queued[0].payload["isDarkMode"], false);

    let cached = h.service.cached_settings().unwrap();
    assert!(!cached.is_dark_mode);
    assert_eq!(cached.preferences, Some(default_profile().preferences));
  }

  #[tokio::test]
  async fn test_restore_cached_settings() {
    let h = harness(true);
    assert!(!h.service.restore_cached_settings());

    h.service.set_dark_mode(true);
    h.service.store.dispatch(Action::ResetAppState);
    assert!(h.service.restore_cached_settings());
    assert!(h.service.state().app.is_dark_mode);
  }

  #[tokio::test]
  async fn test_upload_sets_profile_picture() {
    let h = harness(true);
    h.service.fetch_user().await.unwrap();
    let progress = Arc::new(Mutex::new(Vec::new()));
    let loading_during_upload = Arc::new(Mutex::new(Vec::new()));

    let updated = {
      let progress = progress.clone();
      let loading = loading_during_upload.clone();
      let states = h.service.subscribe();
      h.service
        .upload_picture(
          "file:///me.png",
          Box::new(move |p: u8| {
            progress.lock().unwrap().push(p);
            loading.lock().unwrap().push(states.borrow().user.is_loading);
          }),
        )
        .await
        .unwrap()
    };

    assert_eq!(updated.profile_picture, "file:///me.png");
    assert_eq!(progress.lock().unwrap().last(), Some(&100));
    assert!(loading_during_upload.lock().unwrap().iter().all(|loading| *loading));
    assert!(!h.service.state().user.is_loading);
    assert_eq!(h.api.calls().upload, 1);
  }

  #[tokio::test]
  async fn test_failed_upload_settles_loading_with_error() {
    let h = harness(true);
    h.service.fetch_user().await.unwrap();
    h.api.set_reachable(false);

    let err = h
      .service
      .upload_picture("file:///me.png", Box::new(|_: u8| {}))
      .await
      .unwrap_err();
    assert_eq!(err.message, "Network request failed");

    let state = h.service.state().user;
    assert!(!state.is_loading);
    assert_eq!(state.error.as_deref(), Some("Network request failed"));
    assert_eq!(state.user, Some(default_profile()));
    assert_eq!(h.api.calls().upload, 1);
  }

  #[tokio::test]
  async fn test_reset_returns_default_profile_with_empty_queue() {
    let h = harness(true);
    h.service.fetch_user().await.unwrap();
    h.service.update_user(rename("Jane")).await.unwrap();
    h.service.toggle_theme();
    h.service.network().record(false);
    h.service.update_user(rename("Janet")).await.unwrap();
    h.service.notifications().mark_first_run_complete().unwrap();
    h.service.network().record(true);

    let profile = h.service.reset_all_data().await.unwrap();
    // Only the refetched profile is stored; no stale settings or snapshot.
    assert_eq!(h.durable.all_keys().unwrap(), vec!["cache_user_profile".to_string()]);

    assert_eq!(profile, default_profile());
    assert!(h.service.queue().is_empty());
    assert!(h.service.notifications().is_first_run());

    let state = h.service.state();
    assert_eq!(state.user.user, Some(default_profile()));
    assert!(!state.app.is_dark_mode);
    assert_eq!(h.durable.get_item(OFFLINE_QUEUE_KEY).unwrap(), None);
  }

  #[tokio::test]
  async fn test_storage_info() {
    let h = harness(true);
    h.service.fetch_user().await.unwrap();
    h.service.network().record(false);
    h.service.toggle_theme();

    let info = h.service.storage_info().unwrap();
    assert_eq!(info.cache_entries, 2);
    assert_eq!(info.queue_length, 1);
    assert!(info.keys.iter().any(|k| k.starts_with(CACHE_PREFIX)));
    assert!(info.keys.contains(&OFFLINE_QUEUE_KEY.to_string()));

    let expected: usize = info
      .keys
      .iter()
      .map(|k| h.durable.get_item(k).unwrap().unwrap().len())
      .sum();
    assert_eq!(info.used_bytes, expected);
  }
}
