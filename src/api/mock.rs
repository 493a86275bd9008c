//! Latency-simulating stand-in for the profile backend.

use color_eyre::{eyre::eyre, Result};
use futures::future::{BoxFuture, FutureExt};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

use super::client::{ProgressFn, RemoteApi, PROFILE_ENDPOINT};
use super::fixture::FixtureStore;
use super::types::{ProfileUpdate, UserProfile};
use crate::config::ApiConfig;
use crate::offline::{MutationKind, QueuedMutation};

/// Message reported when a simulated update fails.
pub const UPDATE_FAILED_MESSAGE: &str = "Failed to update profile. Please try again.";

const UNREACHABLE_MESSAGE: &str = "Network request failed";

/// How many times each endpoint was called.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApiCalls {
  pub fetch: usize,
  pub update: usize,
  pub upload: usize,
  pub replay: usize,
}

struct FailureInjector {
  rate: f64,
  rng: StdRng,
}

impl FailureInjector {
  fn should_fail(&mut self) -> bool {
    if self.rate <= 0.0 {
      false
    } else if self.rate >= 1.0 {
      true
    } else {
      self.rng.gen_bool(self.rate)
    }
  }
}

/// Mock remote API.
///
/// Serves the profile held by a [`FixtureStore`], sleeps to simulate latency
/// and fails writes at a configurable rate.
pub struct MockApi {
  fixtures: Arc<dyn FixtureStore>,
  latency: Duration,
  replay_latency: Duration,
  upload_step: Duration,
  failures: Mutex<FailureInjector>,
  reachable: AtomicBool,
  fetch_calls: AtomicUsize,
  update_calls: AtomicUsize,
  upload_calls: AtomicUsize,
  replay_calls: AtomicUsize,
}

impl MockApi {
  /// Mock with no latency and no injected failures.
  pub fn instant(fixtures: Arc<dyn FixtureStore>) -> Self {
    Self {
      fixtures,
      latency: Duration::ZERO,
      replay_latency: Duration::ZERO,
      upload_step: Duration::ZERO,
      failures: Mutex::new(FailureInjector {
        rate: 0.0,
        rng: StdRng::seed_from_u64(0),
      }),
      reachable: AtomicBool::new(true),
      fetch_calls: AtomicUsize::new(0),
      update_calls: AtomicUsize::new(0),
      upload_calls: AtomicUsize::new(0),
      replay_calls: AtomicUsize::new(0),
    }
  }

  pub fn from_config(config: &ApiConfig, fixtures: Arc<dyn FixtureStore>) -> Self {
    let rng = match config.seed {
      Some(seed) => StdRng::seed_from_u64(seed),
      None => StdRng::from_entropy(),
    };

    Self {
      latency: Duration::from_millis(config.latency_ms),
      replay_latency: Duration::from_millis(config.replay_latency_ms),
      upload_step: Duration::from_millis(config.upload_step_ms),
      failures: Mutex::new(FailureInjector {
        rate: config.failure_rate,
        rng,
      }),
      ..Self::instant(fixtures)
    }
  }

  /// Probability (0.0 to 1.0) that a write or replay fails.
  pub fn set_failure_rate(&self, rate: f64) {
    self.failures().rate = rate;
  }

  /// Make every call fail as if the backend could not be reached.
  pub fn set_reachable(&self, reachable: bool) {
    self.reachable.store(reachable, Ordering::SeqCst);
  }

  pub fn calls(&self) -> ApiCalls {
    ApiCalls {
      fetch: self.fetch_calls.load(Ordering::SeqCst),
      update: self.update_calls.load(Ordering::SeqCst),
      upload: self.upload_calls.load(Ordering::SeqCst),
      replay: self.replay_calls.load(Ordering::SeqCst),
    }
  }

  pub fn fixtures(&self) -> &Arc<dyn FixtureStore> {
    &self.fixtures
  }

  fn failures(&self) -> std::sync::MutexGuard<'_, FailureInjector> {
    self.failures.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn ensure_reachable(&self) -> Result<()> {
    if self.reachable.load(Ordering::SeqCst) {
      Ok(())
    } else {
      Err(eyre!(UNREACHABLE_MESSAGE))
    }
  }

  fn apply_profile_update(&self, update: &ProfileUpdate) -> UserProfile {
    let updated = self.fixtures.current().merged(update);
    self.fixtures.replace(updated.clone());
    updated
  }
}

impl RemoteApi for MockApi {
  fn fetch_profile(&self) -> BoxFuture<'_, Result<UserProfile>> {
    async move {
      self.fetch_calls.fetch_add(1, Ordering::SeqCst);
      tokio::time::sleep(self.latency).await;
      self.ensure_reachable()?;

      Ok(self.fixtures.current())
    }
    .boxed()
  }

  fn update_profile(&self, update: ProfileUpdate) -> BoxFuture<'_, Result<UserProfile>> {
    async move {
      self.update_calls.fetch_add(1, Ordering::SeqCst);
      tokio::time::sleep(self.latency).await;
      self.ensure_reachable()?;

      if self.failures().should_fail() {
        return Err(eyre!(UPDATE_FAILED_MESSAGE));
      }

      Ok(self.apply_profile_update(&update))
    }
    .boxed()
  }

  fn upload_picture<'a>(
    &'a self,
    uri: &'a str,
    mut on_progress: ProgressFn<'a>,
  ) -> BoxFuture<'a, Result<String>> {
    async move {
      self.upload_calls.fetch_add(1, Ordering::SeqCst);
      self.ensure_reachable()?;

      for progress in (10..=100).step_by(10) {
        tokio::time::sleep(self.upload_step).await;
        on_progress(progress);
      }

      Ok(uri.to_string())
    }
    .boxed()
  }

  fn apply_mutation<'a>(&'a self, mutation: &'a QueuedMutation) -> BoxFuture<'a, Result<()>> {
    async move {
      self.replay_calls.fetch_add(1, Ordering::SeqCst);
      debug!(
        id = %mutation.id,
        kind = ?mutation.kind,
        endpoint = %mutation.endpoint,
        "Processing offline item"
      );
      tokio::time::sleep(self.replay_latency).await;
      self.ensure_reachable()?;

      if self.failures().should_fail() {
        return Err(eyre!(
          "Failed to sync {:?} to {}",
          mutation.kind,
          mutation.endpoint
        ));
      }

      if mutation.endpoint == PROFILE_ENDPOINT && mutation.kind == MutationKind::Update {
        let update: ProfileUpdate = serde_json::from_value(mutation.payload.clone())
          .map_err(|e| eyre!("Queued profile update is malformed: {}", e))?;
        self.apply_profile_update(&update);
      }

      info!(id = %mutation.id, "Successfully processed offline item");
      Ok(())
    }
    .boxed()
  }

  fn reset_to_default(&self) {
    self.fixtures.reset();
  }
}
