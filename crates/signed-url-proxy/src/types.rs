//! Core types for the signed URL proxy

use serde::{Deserialize, Serialize};
use signed_url_cache::{CacheStats, Lookup};
use std::path::PathBuf;

/// Configuration for the signed URL proxy
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub port: u16,
    /// Directory for the persistent tier; `None` keeps it in process
    pub cache_dir: Option<PathBuf>,
    pub cache_ttl_secs: u64,
    pub memory_cache_size: usize,
    pub signed_url_expiry_secs: u64,
    pub storage_url: String,
    pub storage_bucket: String,
    pub storage_api_key: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: 3005,
            cache_dir: Some(PathBuf::from("./cache/signed-urls")),
            cache_ttl_secs: 30 * 60,         // 30 minutes
            memory_cache_size: 100,
            signed_url_expiry_secs: 60 * 60, // 1 hour
            storage_url: String::new(),
            storage_bucket: "baritems".to_string(),
            storage_api_key: String::new(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: CacheStats,
}

/// Which tier answered a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlSource {
    Passthrough,
    Memory,
    Persistent,
    Minted,
}

impl UrlSource {
    pub fn from_lookup(lookup: &Lookup) -> Option<Self> {
        match lookup {
            Lookup::Passthrough(_) => Some(Self::Passthrough),
            Lookup::Memory(_) => Some(Self::Memory),
            Lookup::Persistent(_) => Some(Self::Persistent),
            Lookup::Minted(_) => Some(Self::Minted),
            Lookup::Empty | Lookup::Failed => None,
        }
    }

    /// Value for the `X-Cache` header
    pub fn cache_header(self) -> &'static str {
        match self {
            Self::Passthrough => "PASS",
            Self::Memory | Self::Persistent => "HIT",
            Self::Minted => "MISS",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub url: String,
    pub source: UrlSource,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SweepResponse {
    pub removed: usize,
}
