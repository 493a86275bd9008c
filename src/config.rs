use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::db::SqliteStore;

const APP_DIR: &str = "profile-sync";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Directory holding the durable store (defaults to the XDG data directory)
  pub data_dir: Option<PathBuf>,
  pub cache: CacheConfig,
  pub persistence: PersistenceConfig,
  pub api: ApiConfig,
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub default_ttl_minutes: i64,
  /// How long a fetched profile is served while offline
  pub profile_ttl_minutes: i64,
  pub settings_ttl_minutes: i64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      default_ttl_minutes: 60,
      profile_ttl_minutes: 60 * 24,
      settings_ttl_minutes: 60 * 24 * 7,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
  /// Quiet window before the state snapshot is written
  pub debounce_ms: u64,
}

impl Default for PersistenceConfig {
  fn default() -> Self {
    Self { debounce_ms: 500 }
  }
}

/// Behaviour of the mock remote.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub latency_ms: u64,
  pub replay_latency_ms: u64,
  /// Delay between upload progress reports
  pub upload_step_ms: u64,
  /// Probability that an update or replayed mutation fails
  pub failure_rate: f64,
  /// Seed for failure injection; random when unset
  pub seed: Option<u64>,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      latency_ms: 1500,
      replay_latency_ms: 1000,
      upload_step_ms: 300,
      failure_rate: 0.1,
      seed: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  /// Write logs to daily files here instead of stderr
  pub directory: Option<PathBuf>,
  /// Filter used when RUST_LOG is not set
  pub filter: String,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      directory: None,
      filter: "info".to_string(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./profile-sync.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/profile-sync/config.yaml
  ///
  /// Without a config file every setting takes its default.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("profile-sync.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join(APP_DIR).join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  pub fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))?;
    config.validate()?;
    Ok(config)
  }

  fn validate(&self) -> Result<()> {
    if !(0.0..=1.0).contains(&self.api.failure_rate) {
      return Err(eyre!(
        "api.failure_rate must be between 0 and 1, got {}",
        self.api.failure_rate
      ));
    }
    let ttls = [
      self.cache.default_ttl_minutes,
      self.cache.profile_ttl_minutes,
      self.cache.settings_ttl_minutes,
    ];
    if ttls.iter().any(|ttl| *ttl < 0) {
      return Err(eyre!("Cache TTLs cannot be negative"));
    }
    Ok(())
  }

  /// Path of the durable store database.
  ///
  /// `PROFILE_SYNC_DATA_DIR` overrides `data_dir`, which overrides the XDG
  /// data directory.
  pub fn database_path(&self) -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("PROFILE_SYNC_DATA_DIR") {
      return Ok(PathBuf::from(dir).join("store.db"));
    }
    match &self.data_dir {
      Some(dir) => Ok(dir.join("store.db")),
      None => SqliteStore::default_path(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_config_uses_defaults() {
    let config = Config::parse("{}").unwrap();
    assert_eq!(config.cache.profile_ttl_minutes, 1440);
    assert_eq!(config.cache.settings_ttl_minutes, 10080);
    assert_eq!(config.persistence.debounce_ms, 500);
    assert_eq!(config.api.latency_ms, 1500);
    assert_eq!(config.api.failure_rate, 0.1);
    assert_eq!(config.log.filter, "info");
  }

  #[test]
  fn test_partial_sections_keep_other_defaults() {
    let config = Config::parse(
      r#"
data_dir: /tmp/profile-sync-test
api:
  failure_rate: 0.0
  seed: 7
log:
  directory: /var/log/profile-sync
"#,
    )
    .unwrap();

    assert_eq!(config.api.failure_rate, 0.0);
    assert_eq!(config.api.seed, Some(7));
    assert_eq!(config.api.replay_latency_ms, 1000);
    assert_eq!(config.log.filter, "info");
    assert_eq!(config.log.directory, Some(PathBuf::from("/var/log/profile-sync")));
  }

  #[test]
  fn test_rejects_out_of_range_failure_rate() {
    let err = Config::parse("api:\n  failure_rate: 1.5\n").unwrap_err();
    assert!(err.to_string().contains("failure_rate"));
  }

  #[test]
  fn test_missing_explicit_file_is_an_error() {
    let err = Config::load(Some(Path::new("/definitely/not/here.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }

  #[test]
  fn test_load_from_path_reads_yaml() {
    let dir = std::env::temp_dir().join(format!("profile-sync-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.yaml");
    std::fs::write(&path, "persistence:\n  debounce_ms: 50\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.persistence.debounce_ms, 50);

    std::fs::remove_dir_all(&dir).unwrap();
  }
}
