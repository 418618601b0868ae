//! Two-tier signed URL caching with coalesced minting

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::memory::MemoryTier;
use crate::minter::UrlMinter;
use crate::path::{is_absolute_url, normalize_key};
use crate::store::KeyValueStore;
use crate::types::{CacheEntry, CacheStats};

type MintFlight = Shared<BoxFuture<'static, Option<String>>>;

/// Where a lookup's answer came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Empty path; nothing to resolve
    Empty,
    /// Already an absolute URL, returned untouched
    Passthrough(String),
    Memory(String),
    Persistent(String),
    /// Freshly minted, possibly by a concurrent lookup for the same key
    Minted(String),
    /// The storage provider could not mint a URL
    Failed,
}

impl Lookup {
    pub fn url(&self) -> Option<&str> {
        match self {
            Lookup::Passthrough(url)
            | Lookup::Memory(url)
            | Lookup::Persistent(url)
            | Lookup::Minted(url) => Some(url),
            Lookup::Empty | Lookup::Failed => None,
        }
    }

    pub fn into_url(self) -> Option<String> {
        match self {
            Lookup::Passthrough(url)
            | Lookup::Memory(url)
            | Lookup::Persistent(url)
            | Lookup::Minted(url) => Some(url),
            Lookup::Empty | Lookup::Failed => None,
        }
    }

    pub fn is_cache_hit(&self) -> bool {
        matches!(self, Lookup::Memory(_) | Lookup::Persistent(_))
    }
}

/// Signed URL cache with a bounded memory tier over a persistent tier.
///
/// Cloning is cheap; clones share the same tiers and counters.
#[derive(Clone)]
pub struct SignedUrlCache {
    inner: Arc<Inner>,
}

struct Inner {
    config: CacheConfig,
    memory: RwLock<MemoryTier>,
    persistent: Arc<dyn KeyValueStore>,
    minter: Arc<dyn UrlMinter>,
    clock: Arc<dyn Clock>,
    /// Mints currently running, keyed by cache key
    inflight: Mutex<HashMap<String, MintFlight>>,
    /// Bumped by `invalidate_all`; mints from an older epoch are not stored
    epoch: AtomicU64,
    memory_hits: AtomicU64,
    persistent_hits: AtomicU64,
    misses: AtomicU64,
    mints: AtomicU64,
    mint_failures: AtomicU64,
}

impl SignedUrlCache {
    /// Create a cache using wall-clock time
    pub fn new(
        config: CacheConfig,
        persistent: Arc<dyn KeyValueStore>,
        minter: Arc<dyn UrlMinter>,
    ) -> Self {
        Self::with_clock(config, persistent, minter, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: CacheConfig,
        persistent: Arc<dyn KeyValueStore>,
        minter: Arc<dyn UrlMinter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let memory = RwLock::new(MemoryTier::new(config.max_memory_entries));
        Self {
            inner: Arc::new(Inner {
                config,
                memory,
                persistent,
                minter,
                clock,
                inflight: Mutex::new(HashMap::new()),
                epoch: AtomicU64::new(0),
                memory_hits: AtomicU64::new(0),
                persistent_hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                mints: AtomicU64::new(0),
                mint_failures: AtomicU64::new(0),
            }),
        }
    }

    /// Startup housekeeping: drop persistent entries left over from earlier
    /// sessions that have since expired. Returns how many were removed.
    pub async fn init(&self) -> usize {
        let removed = self.sweep_expired().await;
        info!(
            removed,
            ttl_minutes = self.inner.config.ttl_minutes(),
            max_memory_entries = self.inner.config.max_memory_entries,
            "Signed URL cache initialized"
        );
        removed
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Resolve an object path to a usable URL, or `None` when the path is
    /// empty or the provider failed to mint.
    pub async fn resolve(&self, path: &str) -> Option<String> {
        self.lookup(path).await.into_url()
    }

    /// Same as [`resolve`](Self::resolve), also reporting which tier answered
    pub async fn lookup(&self, path: &str) -> Lookup {
        if path.is_empty() {
            return Lookup::Empty;
        }
        if is_absolute_url(path) {
            return Lookup::Passthrough(path.to_string());
        }

        let key = normalize_key(path, &self.inner.config.legacy_prefix);
        if key.is_empty() {
            return Lookup::Empty;
        }

        if let Some(url) = self.inner.memory_lookup(key).await {
            self.inner.memory_hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Cache hit (memory)");
            return Lookup::Memory(url);
        }

        if let Some(url) = self.inner.persistent_lookup(key).await {
            self.inner.persistent_hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Cache hit (persistent)");
            return Lookup::Persistent(url);
        }

        self.inner.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, "Cache miss, minting signed URL");

        match self.join_or_start_mint(key).await {
            Some(url) => Lookup::Minted(url),
            None => Lookup::Failed,
        }
    }

    fn join_or_start_mint(&self, key: &str) -> MintFlight {
        let mut inflight = self.inner.inflight();
        if let Some(flight) = inflight.get(key) {
            debug!(key = %key, "Joining in-flight mint");
            return flight.clone();
        }

        let inner = Arc::clone(&self.inner);
        let epoch = inner.epoch.load(Ordering::SeqCst);
        let owned_key = key.to_string();
        let flight = async move { inner.mint_and_store(owned_key, epoch).await }
            .boxed()
            .shared();

        inflight.insert(key.to_string(), flight.clone());
        flight
    }

    /// Drop one object's cached URL from both tiers
    pub async fn invalidate(&self, path: &str) {
        if path.is_empty() || is_absolute_url(path) {
            return;
        }
        let key = normalize_key(path, &self.inner.config.legacy_prefix);
        if key.is_empty() {
            return;
        }

        self.inner.memory.write().await.remove(key);
        self.inner.remove_persistent(&self.inner.store_key(key)).await;
        debug!(key = %key, "Invalidated cache entry");
    }

    /// Clear both tiers. Mints already running still answer their callers
    /// but their URLs are not stored.
    pub async fn invalidate_all(&self) {
        {
            let mut inflight = self.inner.inflight();
            self.inner.epoch.fetch_add(1, Ordering::SeqCst);
            inflight.clear();
        }

        let memory_cleared = {
            let mut memory = self.inner.memory.write().await;
            let count = memory.len();
            memory.clear();
            count
        };

        let mut persistent_cleared = 0;
        for store_key in self.inner.persistent_keys().await {
            if self.inner.remove_persistent(&store_key).await {
                persistent_cleared += 1;
            }
        }

        info!(
            memory_cleared,
            persistent_cleared, "Cleared signed URL cache"
        );
    }

    /// Remove expired or unreadable entries from the persistent tier.
    /// Returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        let now = self.inner.clock.now();
        let ttl = self.inner.config.ttl;
        let mut removed = 0;

        for store_key in self.inner.persistent_keys().await {
            let raw = match self.inner.persistent.get(&store_key).await {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    warn!(key = %store_key, error = %e, "Failed to read cache entry during sweep");
                    continue;
                }
            };

            let stale = match CacheEntry::from_json(&raw) {
                Ok(entry) => entry.is_expired(now, ttl),
                Err(e) => {
                    warn!(key = %store_key, error = %e, "Malformed cache entry, removing");
                    true
                }
            };

            if stale && self.inner.remove_persistent(&store_key).await {
                removed += 1;
            }
        }

        if removed > 0 {
            info!(removed, "Swept expired signed URL cache entries");
        }
        removed
    }

    /// Current cache statistics
    pub async fn stats(&self) -> CacheStats {
        let inner = &self.inner;
        let (memory_entries, max_memory_size) = {
            let memory = inner.memory.read().await;
            (memory.len(), memory.capacity())
        };

        CacheStats {
            memory_entries,
            persistent_entries: inner.persistent_keys().await.len(),
            max_memory_size,
            ttl_minutes: inner.config.ttl_minutes(),
            memory_hits: inner.memory_hits.load(Ordering::Relaxed),
            persistent_hits: inner.persistent_hits.load(Ordering::Relaxed),
            misses: inner.misses.load(Ordering::Relaxed),
            mints: inner.mints.load(Ordering::Relaxed),
            mint_failures: inner.mint_failures.load(Ordering::Relaxed),
        }
    }
}

impl Inner {
    fn inflight(&self) -> MutexGuard<'_, HashMap<String, MintFlight>> {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn store_key(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }

    async fn memory_lookup(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        let ttl = self.config.ttl;

        {
            let memory = self.memory.read().await;
            match memory.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now, ttl) => return Some(entry.url.clone()),
                Some(_) => {}
            }
        }

        let mut memory = self.memory.write().await;
        if memory.get(key).is_some_and(|e| e.is_expired(now, ttl)) {
            memory.remove(key);
            debug!(key = %key, "Memory cache entry expired");
        }
        None
    }

    async fn persistent_lookup(&self, key: &str) -> Option<String> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let store_key = self.store_key(key);
        let raw = match self.persistent.get(&store_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "Persistent cache unavailable, skipping");
                return None;
            }
        };

        match CacheEntry::from_json(&raw) {
            Ok(entry) if !entry.is_expired(self.clock.now(), self.config.ttl) => {
                let url = entry.url.clone();
                let mut memory = self.memory.write().await;
                // invalidate_all bumps the epoch before it clears memory
                if self.epoch.load(Ordering::SeqCst) != epoch {
                    debug!(key = %key, "Cache invalidated during read, treating as miss");
                    return None;
                }
                memory.put(key, entry);
                Some(url)
            }
            Ok(_) => {
                debug!(key = %key, "Persistent cache entry expired");
                self.remove_persistent(&store_key).await;
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Malformed cache entry, removing");
                self.remove_persistent(&store_key).await;
                None
            }
        }
    }

    async fn mint_and_store(self: Arc<Self>, key: String, epoch: u64) -> Option<String> {
        let result = self.minter.mint(&key, self.config.mint_expiry).await;

        let url = match result {
            Ok(url) => {
                self.mints.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Minted signed URL");
                self.store(&key, &url, epoch).await;
                Some(url)
            }
            Err(e) => {
                self.mint_failures.fetch_add(1, Ordering::Relaxed);
                error!(key = %key, error = %e, "Failed to mint signed URL");
                None
            }
        };

        let mut inflight = self.inflight();
        if self.epoch.load(Ordering::SeqCst) == epoch {
            inflight.remove(&key);
        }
        url
    }

    /// Write a minted URL to both tiers unless the cache was invalidated
    /// since `epoch`
    async fn store(&self, key: &str, url: &str, epoch: u64) {
        let entry = CacheEntry::new(url, self.clock.now());

        {
            let mut memory = self.memory.write().await;
            if self.epoch.load(Ordering::SeqCst) != epoch {
                debug!(key = %key, "Cache invalidated during mint, not storing");
                return;
            }
            if let Some(evicted) = memory.put(key, entry.clone()) {
                debug!(key = %evicted, "Evicted oldest memory cache entry");
            }
        }

        let store_key = self.store_key(key);
        let written = match entry.to_json() {
            Ok(json) => self.persistent.set(&store_key, &json).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = written {
            warn!(key = %key, error = %e, "Failed to write persistent cache entry");
            return;
        }

        if self.epoch.load(Ordering::SeqCst) != epoch {
            // The invalidation may have listed keys before our write landed
            self.remove_persistent_if(&store_key, url).await;
        }
    }

    /// Remove a persistent entry only if it still holds `url`, leaving any
    /// newer mint for the same key alone
    async fn remove_persistent_if(&self, store_key: &str, url: &str) {
        let current = match self.persistent.get(store_key).await {
            Ok(Some(raw)) => CacheEntry::from_json(&raw).ok(),
            Ok(None) => return,
            Err(e) => {
                warn!(key = %store_key, error = %e, "Failed to read persistent cache entry");
                return;
            }
        };
        if current.is_some_and(|entry| entry.url == url) {
            self.remove_persistent(store_key).await;
        }
    }

    /// Returns whether the entry was removed
    async fn remove_persistent(&self, store_key: &str) -> bool {
        match self.persistent.remove(store_key).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %store_key, error = %e, "Failed to remove persistent cache entry");
                false
            }
        }
    }

    /// Persistent keys in this cache's namespace; empty if the store is unreadable
    async fn persistent_keys(&self) -> Vec<String> {
        match self.persistent.keys().await {
            Ok(keys) => keys
                .into_iter()
                .filter(|k| k.starts_with(&self.config.key_prefix))
                .collect(),
            Err(e) => {
                warn!(error = %e, "Failed to list persistent cache keys");
                Vec::new()
            }
        }
    }
}
