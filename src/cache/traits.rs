//! Result types describing where cached data came from.

/// Result from a cache-aware read, including data and its source.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
}

impl<T> CacheResult<T> {
  /// Fresh data from the remote.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
    }
  }

  /// Cached data served without trying the remote because we are offline.
  pub fn offline(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Offline,
    }
  }

  /// Cached data served because the remote call failed.
  pub fn fallback(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Fallback,
    }
  }
}

/// Indicates where data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from the remote
  Network,
  /// Offline mode - remote not attempted, serving cached data
  Offline,
  /// Remote failed, serving cached data
  Fallback,
}

impl std::fmt::Display for CacheSource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let label = match self {
      CacheSource::Network => "network",
      CacheSource::Offline => "cache (offline)",
      CacheSource::Fallback => "cache (remote failed)",
    };
    f.write_str(label)
  }
}
