//! Asset Publisher: pins images and metadata documents.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::config::{MarketConfig, MetadataDefaults, PinningCredentials};
use crate::error::{MarketError, Result};
use crate::ipfs::ContentId;
use crate::units::Price;

/// Key/value tags attached to every pinned file.
const PIN_TAGS: &[(&str, &str)] = &[("app", "picarts"), ("kind", "nft-image")];

/// A file chosen for minting.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads a file from disk, naming it after its final path component.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| MarketError::Io(format!("{}: {e}", path.display())))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Metadata document pinned for each minted token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataDocument {
    pub name: String,
    pub description: String,
    /// `ipfs://<image hash>`.
    pub image: String,
    /// Asking price in ether at mint time.
    pub price: String,
}

impl MetadataDocument {
    pub fn new(defaults: &MetadataDefaults, image: &ContentId, price: &Price) -> Self {
        Self {
            name: defaults.name.clone(),
            description: defaults.description.clone(),
            image: image.to_ipfs_uri(),
            price: price.to_ether_string(),
        }
    }
}

/// Uploads images and metadata to a pinning service.
#[async_trait]
pub trait AssetPublisher: Send + Sync {
    /// Pins the file and returns its content id.
    async fn upload_file(&self, file: &SelectedFile) -> Result<ContentId>;

    /// Pins the metadata document for `image` and returns `ipfs://<hash>`.
    async fn publish_metadata(&self, image: &ContentId, price: &Price) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

/// [`AssetPublisher`] for the Pinata pinning API.
pub struct PinataPublisher {
    client: reqwest::Client,
    api_url: String,
    credentials: Option<PinningCredentials>,
    defaults: MetadataDefaults,
}

impl PinataPublisher {
    pub fn new(
        client: reqwest::Client,
        api_url: impl Into<String>,
        credentials: Option<PinningCredentials>,
        defaults: MetadataDefaults,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            credentials,
            defaults,
        }
    }

    pub fn from_config(client: reqwest::Client, config: &MarketConfig) -> Self {
        Self::new(
            client,
            config.pinning_api_url.clone(),
            config.pinning_credentials.clone(),
            config.metadata.clone(),
        )
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/pinning/{path}", self.api_url)
    }

    fn post(&self, path: &str) -> std::result::Result<reqwest::RequestBuilder, String> {
        let request = self.client.post(self.endpoint(path));
        match &self.credentials {
            Some(PinningCredentials::ApiKey { key, secret }) => Ok(request
                .header("pinata_api_key", key)
                .header("pinata_secret_api_key", secret.expose())),
            Some(PinningCredentials::Jwt(token)) => Ok(request.bearer_auth(token.expose())),
            None => Err("pinning credentials are not configured".to_string()),
        }
    }
}

#[async_trait]
impl AssetPublisher for PinataPublisher {
    async fn upload_file(&self, file: &SelectedFile) -> Result<ContentId> {
        let keyvalues: serde_json::Map<String, serde_json::Value> = PIN_TAGS
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::from(*v)))
            .collect();
        let envelope = serde_json::json!({ "name": file.name, "keyvalues": keyvalues });
        let options = serde_json::json!({ "cidVersion": 0 });

        let form = Form::new()
            .part(
                "file",
                Part::bytes(file.bytes.to_vec()).file_name(file.name.clone()),
            )
            .text("pinataMetadata", envelope.to_string())
            .text("pinataOptions", options.to_string());

        let request = self.post("pinFileToIPFS").map_err(MarketError::Upload)?;
        let cid = send_pin(request.multipart(form))
            .await
            .map_err(MarketError::Upload)?;
        tracing::info!(file = %file.name, bytes = file.len(), cid = %cid, "image pinned");
        Ok(cid)
    }

    async fn publish_metadata(&self, image: &ContentId, price: &Price) -> Result<String> {
        let document = MetadataDocument::new(&self.defaults, image, price);
        let request = self
            .post("pinJSONToIPFS")
            .map_err(MarketError::MetadataUpload)?;
        let cid = send_pin(request.json(&document))
            .await
            .map_err(MarketError::MetadataUpload)?;
        tracing::info!(image = %image, cid = %cid, "metadata pinned");
        Ok(cid.to_ipfs_uri())
    }
}

/// Sends a pin request and extracts the returned hash.
async fn send_pin(request: reqwest::RequestBuilder) -> std::result::Result<ContentId, String> {
    let response = request.send().await.map_err(|e| e.to_string())?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(format!("status {status}: {}", body.trim()));
    }
    let pinned: PinResponse = response
        .json()
        .await
        .map_err(|e| format!("malformed response: {e}"))?;
    if pinned.ipfs_hash.trim().is_empty() {
        return Err("response carried an empty IpfsHash".to_string());
    }
    Ok(ContentId::new(pinned.ipfs_hash.trim()))
}
