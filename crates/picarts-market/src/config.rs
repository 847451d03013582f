//! Configuration for the PicArts market client.
//!
//! Contract addresses, the RPC endpoint and pinning credentials are supplied
//! at process start through [`MarketConfigBuilder`]; nothing is compiled in.

use std::fmt;
use std::time::Duration;

use ethers::types::Address;

use crate::error::{MarketError, Result};

/// Default pinning API origin.
pub const DEFAULT_PINNING_API_URL: &str = "https://api.pinata.cloud";

/// Default pinning gateway origin.
pub const DEFAULT_GATEWAY_URL: &str = "https://gateway.pinata.cloud";

/// Default interval between account polls on a node wallet.
pub const DEFAULT_ACCOUNT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// A credential whose value never appears in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Addresses of the two contracts the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    pub nft: Address,
    pub marketplace: Address,
}

/// Pinning service credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinningCredentials {
    /// `pinata_api_key` / `pinata_secret_api_key` header pair.
    ApiKey { key: String, secret: Secret },
    /// Bearer token.
    Jwt(Secret),
}

/// Name and description written into every minted token's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDefaults {
    pub name: String,
    pub description: String,
}

impl Default for MetadataDefaults {
    fn default() -> Self {
        Self {
            name: "PicArts NFT".to_string(),
            description: "Minted with PicArts".to_string(),
        }
    }
}

/// Validated client configuration.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// JSON-RPC endpoint; `None` means no wallet provider is available.
    pub rpc_url: Option<String>,
    /// Local signing key; selects a key wallet instead of the node's accounts.
    pub private_key: Option<Secret>,
    pub contracts: ContractAddresses,
    pub pinning_api_url: String,
    pub gateway_url: String,
    pub pinning_credentials: Option<PinningCredentials>,
    pub account_poll_interval: Duration,
    pub metadata: MetadataDefaults,
}

impl MarketConfig {
    pub fn builder() -> MarketConfigBuilder {
        MarketConfigBuilder::new()
    }
}

/// Builder for [`MarketConfig`].
#[derive(Debug, Clone, Default)]
pub struct MarketConfigBuilder {
    rpc_url: Option<String>,
    private_key: Option<Secret>,
    nft_contract: Option<String>,
    marketplace_contract: Option<String>,
    pinning_api_url: Option<String>,
    gateway_url: Option<String>,
    api_key: Option<String>,
    api_secret: Option<Secret>,
    jwt: Option<Secret>,
    account_poll_interval: Option<Duration>,
    metadata: MetadataDefaults,
}

impl MarketConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the JSON-RPC endpoint of the wallet provider.
    pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    /// Sign locally with this hex private key.
    pub fn private_key(mut self, key: impl Into<String>) -> Self {
        self.private_key = Some(Secret::new(key));
        self
    }

    pub fn nft_contract(mut self, address: impl Into<String>) -> Self {
        self.nft_contract = Some(address.into());
        self
    }

    pub fn marketplace_contract(mut self, address: impl Into<String>) -> Self {
        self.marketplace_contract = Some(address.into());
        self
    }

    pub fn pinning_api_url(mut self, url: impl Into<String>) -> Self {
        self.pinning_api_url = Some(url.into());
        self
    }

    pub fn gateway_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_url = Some(url.into());
        self
    }

    /// Authenticate pinning requests with an API key and secret.
    pub fn pinning_api_key(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self.api_secret = Some(Secret::new(secret));
        self
    }

    /// Authenticate pinning requests with a bearer JWT.
    pub fn pinning_jwt(mut self, token: impl Into<String>) -> Self {
        self.jwt = Some(Secret::new(token));
        self
    }

    pub fn account_poll_interval(mut self, interval: Duration) -> Self {
        self.account_poll_interval = Some(interval);
        self
    }

    pub fn metadata_name(mut self, name: impl Into<String>) -> Self {
        self.metadata.name = name.into();
        self
    }

    pub fn metadata_description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = description.into();
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<MarketConfig> {
        let contracts = ContractAddresses {
            nft: parse_address("NFT contract", self.nft_contract.as_deref())?,
            marketplace: parse_address(
                "marketplace contract",
                self.marketplace_contract.as_deref(),
            )?,
        };

        let rpc_url = self
            .rpc_url
            .map(|url| check_http_url("RPC URL", url))
            .transpose()?;
        if self.private_key.is_some() && rpc_url.is_none() {
            return Err(MarketError::Config(
                "a private key needs an RPC URL to sign through".into(),
            ));
        }

        let pinning_credentials = match (self.api_key, self.api_secret, self.jwt) {
            (_, _, Some(jwt)) => Some(PinningCredentials::Jwt(jwt)),
            (Some(key), Some(secret), None) => Some(PinningCredentials::ApiKey { key, secret }),
            (None, None, None) => None,
            _ => {
                return Err(MarketError::Config(
                    "pinning API key and secret must be given together".into(),
                ));
            }
        };

        let account_poll_interval = self
            .account_poll_interval
            .unwrap_or(DEFAULT_ACCOUNT_POLL_INTERVAL);
        if account_poll_interval.is_zero() {
            return Err(MarketError::Config(
                "account poll interval must be positive".into(),
            ));
        }

        Ok(MarketConfig {
            rpc_url,
            private_key: self.private_key,
            contracts,
            pinning_api_url: check_http_url(
                "pinning API URL",
                self.pinning_api_url
                    .unwrap_or_else(|| DEFAULT_PINNING_API_URL.to_string()),
            )?,
            gateway_url: check_http_url(
                "gateway URL",
                self.gateway_url
                    .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string()),
            )?,
            pinning_credentials,
            account_poll_interval,
            metadata: self.metadata,
        })
    }
}

fn parse_address(field: &str, raw: Option<&str>) -> Result<Address> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| MarketError::Config(format!("{field} address is required")))?;
    let address: Address = raw
        .parse()
        .map_err(|_| MarketError::Config(format!("{field} address {raw:?} is not valid")))?;
    if address.is_zero() {
        return Err(MarketError::Config(format!("{field} address is the zero address")));
    }
    Ok(address)
}

fn check_http_url(field: &str, url: String) -> Result<String> {
    let url = url.trim().trim_end_matches('/').to_string();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url)
    } else {
        Err(MarketError::Config(format!("{field} {url:?} must be an http(s) URL")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NFT: &str = "0xdD91452C8D94aDd2c6ba238a0a7FD6F1b4910643";
    const MARKET: &str = "0x4C808527a631E9817C522566173FD40Bbb087c27";

    fn base() -> MarketConfigBuilder {
        MarketConfig::builder()
            .nft_contract(NFT)
            .marketplace_contract(MARKET)
    }

    #[test]
    fn defaults_apply() {
        let config = base().build().unwrap();
        assert_eq!(config.rpc_url, None);
        assert_eq!(config.pinning_api_url, DEFAULT_PINNING_API_URL);
        assert_eq!(config.gateway_url, DEFAULT_GATEWAY_URL);
        assert_eq!(config.account_poll_interval, DEFAULT_ACCOUNT_POLL_INTERVAL);
        assert_eq!(config.pinning_credentials, None);
        assert_eq!(config.contracts.nft, NFT.parse::<Address>().unwrap());
    }

    #[test]
    fn contracts_are_required_and_validated() {
        let err = MarketConfig::builder().marketplace_contract(MARKET).build().unwrap_err();
        assert!(matches!(err, MarketError::Config(msg) if msg.contains("NFT contract")));

        let err = base().nft_contract("0x1234").build().unwrap_err();
        assert!(matches!(err, MarketError::Config(_)));

        let err = base()
            .marketplace_contract("0x0000000000000000000000000000000000000000")
            .build()
            .unwrap_err();
        assert!(matches!(err, MarketError::Config(msg) if msg.contains("zero address")));
    }

    #[test]
    fn credentials_pair_up() {
        let config = base().pinning_api_key("key", "secret").build().unwrap();
        assert_eq!(
            config.pinning_credentials,
            Some(PinningCredentials::ApiKey {
                key: "key".into(),
                secret: Secret::new("secret"),
            })
        );

        let config = base().pinning_jwt("token").build().unwrap();
        assert_eq!(
            config.pinning_credentials,
            Some(PinningCredentials::Jwt(Secret::new("token")))
        );
    }

    #[test]
    fn private_key_needs_rpc() {
        let err = base().private_key("0x01").build().unwrap_err();
        assert!(matches!(err, MarketError::Config(_)));
        assert!(base().private_key("0x01").rpc_url("http://localhost:8545").build().is_ok());
    }

    #[test]
    fn urls_are_checked_and_trimmed() {
        let config = base().gateway_url("https://gw.example/").build().unwrap();
        assert_eq!(config.gateway_url, "https://gw.example");
        assert!(base().rpc_url("ws://node").build().is_err());
    }

    #[test]
    fn secrets_are_redacted() {
        let config = base().pinning_api_key("key", "hunter2").build().unwrap();
        let printed = format!("{config:?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("Secret(***)"));
    }
}
