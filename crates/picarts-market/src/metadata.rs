//! Token metadata documents fetched from the pinning gateway.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use crate::error::{MarketError, Result};

/// Longest body excerpt quoted in a non-JSON error.
const BODY_EXCERPT_LEN: usize = 120;

/// The fields of an ERC-721 metadata document the gallery uses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Image pointer, usually `ipfs://<hash>`.
    pub image: String,
}

/// Fetches a metadata document by URL.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Fails with [`MarketError::Http`] on transport errors, non-2xx status,
    /// non-JSON content types, or documents without an `image`.
    async fn fetch_metadata(&self, url: &str) -> Result<TokenMetadata>;
}

/// [`MetadataFetcher`] over HTTP.
#[derive(Debug, Clone, Default)]
pub struct HttpMetadataFetcher {
    client: reqwest::Client,
}

impl HttpMetadataFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    async fn fetch_metadata(&self, url: &str) -> Result<TokenMetadata> {
        let http_error = |reason: String| MarketError::Http {
            url: url.to_string(),
            reason,
        };

        tracing::debug!(url, "fetching token metadata");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| http_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(http_error(format!("status {status}")));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("application/json") {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(BODY_EXCERPT_LEN).collect();
            let shown = if content_type.is_empty() { "no content type" } else { content_type.as_str() };
            return Err(http_error(format!("expected JSON, got {shown}: {excerpt}")));
        }

        response
            .json::<TokenMetadata>()
            .await
            .map_err(|e| http_error(format!("malformed metadata: {e}")))
    }
}
