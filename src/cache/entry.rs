use serde::{Deserialize, Serialize};
use serde_json::Value;

const MS_PER_MINUTE: i64 = 60_000;

/// A single cached value with its expiry window.
///
/// The serialized field names are part of the persisted format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
  pub key: String,
  #[serde(rename = "data")]
  pub payload: Value,
  /// When the entry was written, in epoch milliseconds
  #[serde(rename = "timestamp")]
  pub written_at_ms: i64,
  #[serde(rename = "expiry")]
  pub ttl_minutes: i64,
}

impl CacheEntry {
  pub fn new(key: impl Into<String>, payload: Value, written_at_ms: i64, ttl_minutes: i64) -> Self {
    Self {
      key: key.into(),
      payload,
      written_at_ms,
      ttl_minutes,
    }
  }

  /// Last instant (inclusive) at which the entry is still valid.
  pub fn expires_at_ms(&self) -> i64 {
    self
      .written_at_ms
      .saturating_add(self.ttl_minutes.saturating_mul(MS_PER_MINUTE))
  }

  pub fn is_expired(&self, now_ms: i64) -> bool {
    now_ms > self.expires_at_ms()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_expiry_boundary_is_inclusive() {
    let entry = CacheEntry::new("k", json!(1), 1_000, 1);
    assert!(!entry.is_expired(61_000));
    assert!(entry.is_expired(61_001));
  }

  #[test]
  fn test_persisted_field_names() {
    let entry = CacheEntry::new("user_profile", json!({"name": "x"}), 5, 60);
    let value = serde_json::to_value(&entry).unwrap();
    assert_eq!(
      value,
      json!({"key": "user_profile", "data": {"name": "x"}, "timestamp": 5, "expiry": 60})
    );
  }
}
