//! Wire types for the object sign endpoint

use serde::{Deserialize, Serialize};

/// Body of `POST /object/sign/{bucket}/{path}`
#[derive(Debug, Serialize)]
pub struct SignRequest {
    #[serde(rename = "expiresIn")]
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub struct SignResponse {
    /// Path relative to the storage API root, or sometimes a full URL
    #[serde(rename = "signedURL", alias = "signedUrl")]
    pub signed_url: String,
}

/// Error body returned by the storage API
#[derive(Debug, Default, Deserialize)]
pub struct StorageErrorBody {
    #[serde(rename = "statusCode", default)]
    pub status_code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl StorageErrorBody {
    /// Best human-readable description
    pub fn describe(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code.as_deref() == Some("404")
            || self
                .error
                .as_deref()
                .is_some_and(|e| e.eq_ignore_ascii_case("not_found"))
            || self
                .message
                .as_deref()
                .is_some_and(|m| m.to_ascii_lowercase().contains("not found"))
    }
}
