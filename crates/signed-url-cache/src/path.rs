//! Object path handling

use url::Url;

/// Whether `path` is already a fully-qualified http(s) URL
pub fn is_absolute_url(path: &str) -> bool {
    Url::parse(path)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Turn an object path into a cache key: drop leading slashes, then one
/// leading `legacy_prefix` (a bucket name older rows still carry).
pub fn normalize_key<'a>(path: &'a str, legacy_prefix: &str) -> &'a str {
    let trimmed = path.trim_start_matches('/');
    if legacy_prefix.is_empty() {
        return trimmed;
    }
    trimmed.strip_prefix(legacy_prefix).unwrap_or(trimmed)
}
