//! Expiring key/value cache for offline bootstrap.
//!
//! This module provides a two-layer cache that:
//! - Keeps a hot in-memory map mirroring durable entries
//! - Persists every entry under the `cache_` key prefix
//! - Expires entries lazily after their TTL (in minutes)
//! - Heals itself by evicting entries whose payload no longer parses

mod entry;
mod layer;
mod traits;

pub use entry::CacheEntry;
pub use layer::{ExpiringCache, DEFAULT_TTL_MINUTES};
pub use traits::{CacheResult, CacheSource};
