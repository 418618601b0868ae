//! Remote signed URL minting

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

/// Produces time-limited access URLs for stored objects
#[async_trait]
pub trait UrlMinter: Send + Sync {
    /// Mint a URL for the object at `key`, valid for `expires_in` on the
    /// provider side.
    async fn mint(&self, key: &str, expires_in: Duration) -> Result<String, MintError>;
}

/// Errors from a storage provider while minting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintError {
    NotFound(String),
    Denied(String),
    Transport(String),
    InvalidResponse(String),
}

impl fmt::Display for MintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "Object not found: {key}"),
            Self::Denied(msg) => write!(f, "Access denied: {msg}"),
            Self::Transport(msg) => write!(f, "Transport error: {msg}"),
            Self::InvalidResponse(msg) => write!(f, "Invalid response: {msg}"),
        }
    }
}

impl std::error::Error for MintError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_error_display() {
        assert_eq!(
            MintError::Denied("status 403".to_string()).to_string(),
            "Access denied: status 403"
        );
        assert_eq!(
            MintError::InvalidResponse("missing signedURL".to_string()).to_string(),
            "Invalid response: missing signedURL"
        );
    }
}
