//! Error types for the signed URL cache

use std::fmt;

#[derive(Debug)]
pub enum CacheError {
    Io(Box<std::io::Error>),
    Malformed(serde_json::Error),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Io(err) => write!(f, "IO error: {}", err),
            CacheError::Malformed(err) => write!(f, "Malformed cache entry: {}", err),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Io(err) => Some(err.as_ref()),
            CacheError::Malformed(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Io(Box::new(err))
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Malformed(err)
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let err = CacheError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "img_cache_whiskey.jpg",
        ));
        assert_eq!(format!("{}", err), "IO error: img_cache_whiskey.jpg");
    }

    #[test]
    fn test_malformed_error_display() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CacheError::from(parse_err);
        assert!(format!("{}", err).starts_with("Malformed cache entry:"));
    }

    #[test]
    fn test_io_error_has_source() {
        use std::error::Error;

        let err = CacheError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "quota exceeded",
        ));
        assert!(err.source().is_some());
        assert!(format!("{}", err).contains("quota exceeded"));
    }
}
