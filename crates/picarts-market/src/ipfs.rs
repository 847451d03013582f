//! Content identifiers and `ipfs://` URI resolution.

use std::fmt;

/// URI scheme used for on-chain token and image pointers.
pub const IPFS_SCHEME: &str = "ipfs://";

/// Identifier returned by the pinning service for an uploaded blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `ipfs://<hash>` pointer stored in metadata and on-chain.
    pub fn to_ipfs_uri(&self) -> String {
        format!("{IPFS_SCHEME}{}", self.0)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rewrites `ipfs://` pointers to a pinning gateway's HTTP form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpfsGateway {
    /// Always ends in `/ipfs/`.
    base: String,
}

impl IpfsGateway {
    /// Creates a resolver for a gateway origin such as `https://gateway.pinata.cloud`.
    pub fn new(gateway_url: &str) -> Self {
        let origin = gateway_url.trim().trim_end_matches('/');
        let origin = origin.strip_suffix("/ipfs").unwrap_or(origin);
        Self {
            base: format!("{origin}/ipfs/"),
        }
    }

    /// Base URL every resolved pointer starts with.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Resolves a pointer for fetching.
    ///
    /// `ipfs://<hash>` (and the legacy `ipfs://ipfs/<hash>`) becomes
    /// `<gateway>/ipfs/<hash>`; anything else is returned unchanged. The
    /// output never starts with the scheme, so resolving twice is the same
    /// as resolving once.
    pub fn resolve(&self, uri: &str) -> String {
        let trimmed = uri.trim();
        let Some(mut path) = trimmed.strip_prefix(IPFS_SCHEME) else {
            return uri.to_string();
        };
        while let Some(rest) = path.strip_prefix(IPFS_SCHEME) {
            path = rest;
        }
        let path = path.strip_prefix("ipfs/").unwrap_or(path);
        format!("{}{}", self.base, path)
    }

    /// Gateway URL for a content id.
    pub fn url_for(&self, cid: &ContentId) -> String {
        format!("{}{}", self.base, cid.as_str())
    }
}
