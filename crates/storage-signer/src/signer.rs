//! HTTP client for the storage sign endpoint

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use signed_url_cache::{MintError, UrlMinter};
use tracing::{debug, warn};

use crate::error::{Result, SignerError};
use crate::types::{SignRequest, SignResponse, StorageErrorBody};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct SignerConfig {
    /// Project root, e.g. `https://abc.supabase.co`
    pub base_url: String,
    pub bucket: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl SignerConfig {
    pub fn new(base_url: &str, bucket: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            api_key: api_key.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Mints signed URLs for objects in one bucket
pub struct StorageSigner {
    client: Client,
    config: SignerConfig,
}

impl StorageSigner {
    pub fn new(config: SignerConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| SignerError::Config(format!("invalid storage URL: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(SignerError::Config(format!(
                "storage URL must be http(s), got {}",
                base.scheme()
            )));
        }
        if config.bucket.is_empty() {
            return Err(SignerError::Config("bucket name is empty".to_string()));
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { client, config })
    }

    fn storage_root(&self) -> String {
        format!("{}/storage/v1", self.config.base_url)
    }

    fn sign_endpoint(&self, key: &str) -> String {
        format!(
            "{}/object/sign/{}/{}",
            self.storage_root(),
            urlencoding::encode(&self.config.bucket),
            encode_object_path(key)
        )
    }

    /// The endpoint answers with a path under the storage root
    fn absolute_url(&self, signed: &str) -> String {
        if signed.starts_with("http://") || signed.starts_with("https://") {
            return signed.to_string();
        }
        if signed.starts_with('/') {
            format!("{}{}", self.storage_root(), signed)
        } else {
            format!("{}/{}", self.storage_root(), signed)
        }
    }

    /// Create a signed URL for `key`, valid for `expires_in`
    pub async fn create_signed_url(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> std::result::Result<String, MintError> {
        let url = self.sign_endpoint(key);
        debug!(url = %url, expires_in = expires_in.as_secs(), "Requesting signed URL");

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .json(&SignRequest {
                expires_in: expires_in.as_secs(),
            })
            .send()
            .await
            .map_err(|e| MintError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body: StorageErrorBody = response.json().await.unwrap_or_default();
            warn!(key, status = %status, error = ?body.describe(), "Storage refused to sign");
            return Err(classify_failure(key, status, &body));
        }

        let data: SignResponse = response
            .json()
            .await
            .map_err(|e| MintError::InvalidResponse(e.to_string()))?;

        if data.signed_url.is_empty() {
            return Err(MintError::InvalidResponse("empty signedURL".to_string()));
        }

        Ok(self.absolute_url(&data.signed_url))
    }
}

#[async_trait]
impl UrlMinter for StorageSigner {
    async fn mint(&self, key: &str, expires_in: Duration) -> std::result::Result<String, MintError> {
        self.create_signed_url(key, expires_in).await
    }
}

fn classify_failure(key: &str, status: StatusCode, body: &StorageErrorBody) -> MintError {
    let detail = body
        .describe()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("status {status}"));

    match status {
        StatusCode::NOT_FOUND => MintError::NotFound(key.to_string()),
        // The storage API reports missing objects as 400 with a not_found body
        StatusCode::BAD_REQUEST if body.is_not_found() => MintError::NotFound(key.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => MintError::Denied(detail),
        s if s.is_server_error() => MintError::Transport(detail),
        _ => MintError::InvalidResponse(detail),
    }
}

/// Percent-encode each segment, keeping `/` separators
fn encode_object_path(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
