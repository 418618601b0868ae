use chrono::Duration;

const DEFAULT_TTL_MINUTES: i64 = 30;
const DEFAULT_MEMORY_ENTRIES: usize = 100;
const DEFAULT_MINT_EXPIRY_SECS: u64 = 3600; // provider-side validity
const DEFAULT_KEY_PREFIX: &str = "img_cache_";
const DEFAULT_LEGACY_PREFIX: &str = "baritems/";

/// Tuning for a [`SignedUrlCache`](crate::SignedUrlCache)
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long an entry is served from either tier
    pub ttl: Duration,
    /// Memory tier capacity
    pub max_memory_entries: usize,
    /// Lifetime requested from the storage provider when minting
    pub mint_expiry: std::time::Duration,
    /// Namespace for cache keys in the persistent store
    pub key_prefix: String,
    /// Bucket-name prefix stripped from incoming paths
    pub legacy_prefix: String,
}

impl CacheConfig {
    pub fn ttl_minutes(&self) -> u64 {
        self.ttl.num_minutes().max(0) as u64
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(DEFAULT_TTL_MINUTES),
            max_memory_entries: DEFAULT_MEMORY_ENTRIES,
            mint_expiry: std::time::Duration::from_secs(DEFAULT_MINT_EXPIRY_SECS),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            legacy_prefix: DEFAULT_LEGACY_PREFIX.to_string(),
        }
    }
}
