//! Cache types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A signed URL and the time it was minted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub url: String,
    pub minted_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(url: impl Into<String>, minted_at: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            minted_at,
        }
    }

    /// Whether the entry has outlived `ttl` as of `now`.
    ///
    /// An entry is valid only while `now - minted_at < ttl`. Entries minted
    /// in the future (clock skew) count as fresh.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.minted_at >= ttl
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub memory_entries: usize,
    pub persistent_entries: usize,
    pub max_memory_size: usize,
    pub ttl_minutes: u64,
    pub memory_hits: u64,
    pub persistent_hits: u64,
    pub misses: u64,
    pub mints: u64,
    pub mint_failures: u64,
}
