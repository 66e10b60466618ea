//! Client for the external key server
//!
//! The key server maps a room name to the room's current public key:
//! `GET {base_url}/api/keys/{room_name}/public` answers
//! `{"public_key": "..."}`. Requests are single-shot with a bounded timeout.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_BASE_URL: &str = "http://192.168.11.24:8081";

/// Key server configuration
#[derive(Debug, Clone)]
pub struct KeyServerConfig {
    /// Base URL of the key server, without trailing slash
    pub base_url: String,
    /// Timeout for a whole request
    pub timeout: Duration,
}

impl KeyServerConfig {
    /// Create a new KeyServerConfig from environment variables
    ///
    /// # Environment Variables
    /// - `KEY_SERVER_URL`: Base URL (default: "http://192.168.11.24:8081")
    /// - `KEY_SERVER_TIMEOUT`: Request timeout in seconds (default: 5)
    pub fn from_env() -> Self {
        let base_url = std::env::var("KEY_SERVER_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout = std::env::var("KEY_SERVER_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        KeyServerConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout),
        }
    }
}

/// Key server failures
#[derive(Error, Debug)]
pub enum KeyServiceError {
    /// Network failure, timeout or non-200 answer
    #[error("Key server unavailable: {0}")]
    Unavailable(String),

    /// The answer was not the expected JSON document
    #[error("Key server returned an invalid response: {0}")]
    Protocol(String),
}

/// Resolves a room name to its public key
#[async_trait]
pub trait KeyService: Send + Sync {
    async fn fetch_public_key(&self, room_name: &str) -> Result<String, KeyServiceError>;
}

#[derive(Deserialize)]
struct PublicKeyResponse {
    public_key: String,
}

/// HTTP implementation of [`KeyService`]
#[derive(Clone)]
pub struct HttpKeyService {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpKeyService {
    /// Create a new key server client
    pub fn new(config: &KeyServerConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| anyhow::anyhow!("Invalid KEY_SERVER_URL {:?}: {}", config.base_url, e))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Invalid KEY_SERVER_URL {:?}", config.base_url);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .no_proxy()
            .build()?;

        info!("Key server client targeting {}", base_url);
        Ok(Self { client, base_url })
    }

    fn public_key_url(&self, room_name: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "keys", room_name, "public"]);
        }
        url
    }
}

#[async_trait]
impl KeyService for HttpKeyService {
    async fn fetch_public_key(&self, room_name: &str) -> Result<String, KeyServiceError> {
        let url = self.public_key_url(room_name);

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            warn!("Key server request to {} failed: {}", url, e);
            KeyServiceError::Unavailable(e.to_string())
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("Key server answered {} for {}", status, url);
            return Err(KeyServiceError::Unavailable(format!(
                "unexpected status {}",
                status
            )));
        }

        let body = response.json::<PublicKeyResponse>().await.map_err(|e| {
            if e.is_decode() {
                KeyServiceError::Protocol(e.to_string())
            } else {
                KeyServiceError::Unavailable(e.to_string())
            }
        })?;

        Ok(body.public_key)
    }
}
