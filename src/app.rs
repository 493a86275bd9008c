use color_eyre::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::api::{DurableFixtures, MockApi, RemoteApi};
use crate::cache::ExpiringCache;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::db::{DurableStore, MemoryStore, SqliteStore};
use crate::offline::{Connectivity, NetworkObserver, OfflineQueue};
use crate::service::{ProfileService, ServiceParts};
use crate::store::{PersistenceMiddleware, Store};

/// External capabilities the application runs on.
pub struct Components {
  pub durable: Arc<dyn DurableStore>,
  pub clock: Arc<dyn Clock>,
  pub api: Arc<dyn RemoteApi>,
  pub connectivity: Arc<dyn Connectivity>,
}

impl Components {
  /// Real clock, mock remote, and either the on-disk store or, when
  /// `ephemeral`, an in-memory one.
  pub fn from_config(
    config: &Config,
    ephemeral: bool,
    connectivity: Arc<dyn Connectivity>,
  ) -> Result<Self> {
    let durable: Arc<dyn DurableStore> = if ephemeral {
      Arc::new(MemoryStore::new())
    } else {
      let path = config.database_path()?;
      debug!(path = %path.display(), "Opening durable store");
      Arc::new(SqliteStore::open(&path)?)
    };

    let fixtures = Arc::new(DurableFixtures::new(durable.clone()));
    let api = Arc::new(MockApi::from_config(&config.api, fixtures));

    Ok(Self {
      durable,
      clock: Arc::new(SystemClock),
      api,
      connectivity,
    })
  }
}

/// A running application: the wired-up service plus the background pieces
/// that need stopping.
pub struct App {
  service: Arc<ProfileService>,
  persistence: Arc<PersistenceMiddleware>,
  network: Arc<NetworkObserver>,
}

impl App {
  /// Restore the previous session and start following connectivity.
  ///
  /// Must be called from within a tokio runtime.
  pub fn start(config: &Config, components: Components) -> Result<Self> {
    let Components {
      durable,
      clock,
      api,
      connectivity,
    } = components;

    let snapshot = PersistenceMiddleware::load_snapshot(durable.as_ref());
    let restored = snapshot.is_some();

    let mut store = Store::new(snapshot.map(|s| s.into_state()).unwrap_or_default());
    let persistence = Arc::new(PersistenceMiddleware::new(
      durable.clone(),
      clock.clone(),
      store.subscribe(),
      Duration::from_millis(config.persistence.debounce_ms),
    ));
    store.add_middleware(persistence.clone());

    let cache = Arc::new(
      ExpiringCache::new(durable.clone(), clock.clone())
        .with_default_ttl(config.cache.default_ttl_minutes),
    );
    let queue = Arc::new(OfflineQueue::new(durable.clone(), clock.clone()));
    queue.load();

    let network = Arc::new(NetworkObserver::from_probe(
      connectivity.as_ref(),
      queue.clone(),
      api.clone(),
    ));
    network.spawn(connectivity.as_ref());

    let service = Arc::new(ProfileService::new(ServiceParts {
      store: Arc::new(store),
      persistence: persistence.clone(),
      cache,
      queue,
      network: network.clone(),
      api,
      durable,
      clock,
      ttls: config.cache.clone(),
    }));

    if !restored && service.restore_cached_settings() {
      debug!("Settings restored from cache");
    }

    let notifications = service.notifications();
    if notifications.is_first_run() {
      info!("First run");
      notifications.mark_first_run_complete()?;
    }

    info!(
      online = network.is_online(),
      queued = service.queue().len(),
      restored,
      "Profile sync started"
    );

    Ok(Self {
      service,
      persistence,
      network,
    })
  }

  pub fn service(&self) -> &Arc<ProfileService> {
    &self.service
  }

  /// Stop the connectivity listener and write any pending snapshot.
  pub fn shutdown(self) -> Result<()> {
    self.network.shutdown();
    if self.persistence.has_pending() {
      self.persistence.flush()?;
    }
    info!("Profile sync stopped");
    Ok(())
  }
}
