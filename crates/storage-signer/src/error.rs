//! Error types for the storage signer

use std::fmt;

#[derive(Debug)]
pub enum SignerError {
    Http(Box<reqwest::Error>),
    Config(String),
}

impl fmt::Display for SignerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignerError::Http(err) => write!(f, "HTTP error: {}", err),
            SignerError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for SignerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SignerError::Http(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SignerError {
    fn from(err: reqwest::Error) -> Self {
        SignerError::Http(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, SignerError>;
