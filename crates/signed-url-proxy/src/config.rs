use std::env;
use std::path::PathBuf;

use crate::error::{ProxyError, Result};
use crate::types::ProxyConfig;

/// Parse configuration from environment variables
pub fn load_config() -> Result<ProxyConfig> {
    load_config_from(|name| env::var(name).ok())
}

/// Convert the cache TTL to a chrono duration, rejecting values it cannot hold
pub fn cache_ttl(secs: u64) -> Result<chrono::Duration> {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .ok_or_else(|| ProxyError::Config(format!("CACHE_TTL_SECS ({secs}) is out of range")))
}

/// Parse configuration from any variable source
pub fn load_config_from(var: impl Fn(&str) -> Option<String>) -> Result<ProxyConfig> {
    let defaults = ProxyConfig::default();

    let port = var("PORT")
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(defaults.port);

    // An empty CACHE_DIR keeps the persistent tier in process
    let cache_dir = match var("CACHE_DIR") {
        Some(dir) if dir.trim().is_empty() => None,
        Some(dir) => Some(PathBuf::from(dir)),
        None => defaults.cache_dir,
    };

    let cache_ttl_secs = var("CACHE_TTL_SECS")
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(defaults.cache_ttl_secs);

    let memory_cache_size = var("MEMORY_CACHE_SIZE")
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(defaults.memory_cache_size);

    let signed_url_expiry_secs = var("SIGNED_URL_EXPIRY_SECS")
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(defaults.signed_url_expiry_secs);

    let storage_url = var("STORAGE_URL")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProxyError::Config("STORAGE_URL is required".to_string()))?;

    let storage_api_key = var("STORAGE_API_KEY")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProxyError::Config("STORAGE_API_KEY is required".to_string()))?;

    let storage_bucket = var("STORAGE_BUCKET")
        .filter(|s| !s.is_empty())
        .unwrap_or(defaults.storage_bucket);

    cache_ttl(cache_ttl_secs)?;
    if cache_ttl_secs >= signed_url_expiry_secs {
        return Err(ProxyError::Config(format!(
            "CACHE_TTL_SECS ({cache_ttl_secs}) must be shorter than SIGNED_URL_EXPIRY_SECS ({signed_url_expiry_secs})"
        )));
    }

    Ok(ProxyConfig {
        port,
        cache_dir,
        cache_ttl_secs,
        memory_cache_size,
        signed_url_expiry_secs,
        storage_url,
        storage_bucket,
        storage_api_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<ProxyConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        load_config_from(|name| vars.get(name).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("STORAGE_URL", "https://abc.example.co"),
        ("STORAGE_API_KEY", "anon-key"),
    ];

    #[test]
    fn test_defaults_with_required_vars() {
        let config = from_pairs(&REQUIRED).unwrap();
        assert_eq!(config.port, 3005);
        assert_eq!(config.cache_dir, Some(PathBuf::from("./cache/signed-urls")));
        assert_eq!(config.cache_ttl_secs, 1800);
        assert_eq!(config.storage_bucket, "baritems");
        assert_eq!(config.storage_url, "https://abc.example.co");
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("PORT", "8080"),
            ("CACHE_DIR", "/var/cache/urls"),
            ("CACHE_TTL_SECS", "600"),
            ("MEMORY_CACHE_SIZE", "25"),
            ("STORAGE_BUCKET", "profiles"),
        ]);
        let config = from_pairs(&pairs).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.cache_dir, Some(PathBuf::from("/var/cache/urls")));
        assert_eq!(config.cache_ttl_secs, 600);
        assert_eq!(config.memory_cache_size, 25);
        assert_eq!(config.storage_bucket, "profiles");
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "not-a-port"));
        assert_eq!(from_pairs(&pairs).unwrap().port, 3005);
    }

    #[test]
    fn test_empty_cache_dir_means_in_process() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("CACHE_DIR", ""));
        assert_eq!(from_pairs(&pairs).unwrap().cache_dir, None);
    }

    #[test]
    fn test_missing_required() {
        let err = from_pairs(&[("STORAGE_API_KEY", "k")]).unwrap_err();
        assert!(err.to_string().contains("STORAGE_URL"));

        let err = from_pairs(&[("STORAGE_URL", "https://abc.example.co")]).unwrap_err();
        assert!(err.to_string().contains("STORAGE_API_KEY"));
    }

    #[test]
    fn test_ttl_must_be_shorter_than_expiry() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("CACHE_TTL_SECS", "3600"));
        assert!(from_pairs(&pairs).is_err());
    }

    #[test]
    fn test_huge_ttl_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        let expiry = u64::MAX.to_string();
        pairs.extend([
            ("CACHE_TTL_SECS", "10000000000000000"),
            ("SIGNED_URL_EXPIRY_SECS", expiry.as_str()),
        ]);
        let err = from_pairs(&pairs).unwrap_err();
        assert!(err.to_string().contains("CACHE_TTL_SECS"));
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_cache_ttl_conversion() {
        assert_eq!(cache_ttl(1800).unwrap(), chrono::Duration::minutes(30));
        assert!(cache_ttl(u64::MAX).is_err());
    }
}
