//! In-memory test doubles for the wallet, gateway, publisher and metadata
//! fetcher.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ethers::types::Address;
use tokio::sync::watch;

use crate::config::ContractAddresses;
use crate::error::{MarketError, Result};
use crate::gateway::{MarketGateway, TxReceipt};
use crate::ipfs::ContentId;
use crate::metadata::{MetadataFetcher, TokenMetadata};
use crate::publisher::{AssetPublisher, SelectedFile};
use crate::record::TokenId;
use crate::units::Price;
use crate::wallet::{AccountsSubscription, WalletProvider};

/// A call recorded by [`MockGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Mint(String),
    Approve,
    List(TokenId, Price),
    Buy(TokenId, Price),
    ListedIds,
    OwnedIds(Address),
    TokenUri(TokenId),
    ListingPrice(TokenId),
}

#[derive(Default)]
struct GatewayInner {
    calls: Vec<GatewayCall>,
    listed: Vec<TokenId>,
    owned: HashMap<Address, Vec<TokenId>>,
    uris: HashMap<TokenId, String>,
    prices: HashMap<TokenId, Price>,
    failing_uris: HashSet<TokenId>,
    failing_prices: HashSet<TokenId>,
    listed_ids_error: Option<MarketError>,
    failed_receipts: HashSet<&'static str>,
}

/// Scriptable [`MarketGateway`] that records every call.
#[derive(Clone, Default)]
pub struct MockGateway {
    inner: Arc<Mutex<GatewayInner>>,
    reads: Arc<AtomicUsize>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut GatewayInner) -> R) -> R {
        f(&mut self.inner.lock().unwrap())
    }

    /// Adds a token with its metadata URI.
    pub fn with_token(self, id: u64, uri: &str) -> Self {
        self.with_inner(|i| i.uris.insert(TokenId(id), uri.to_string()));
        self
    }

    pub fn with_listing(self, id: u64, price: &str) -> Self {
        self.with_inner(|i| {
            i.listed.push(TokenId(id));
            i.prices.insert(TokenId(id), Price::parse(price).unwrap());
        });
        self
    }

    pub fn with_owned(self, owner: Address, ids: &[u64]) -> Self {
        self.with_inner(|i| {
            i.owned
                .insert(owner, ids.iter().copied().map(TokenId).collect());
        });
        self
    }

    pub fn with_failing_uri(self, id: u64) -> Self {
        self.with_inner(|i| i.failing_uris.insert(TokenId(id)));
        self
    }

    pub fn with_failing_price(self, id: u64) -> Self {
        self.with_inner(|i| i.failing_prices.insert(TokenId(id)));
        self
    }

    pub fn with_listed_ids_error(self, error: MarketError) -> Self {
        self.with_inner(|i| i.listed_ids_error = Some(error));
        self
    }

    /// Makes receipts for `action` ("Mint", "Approval", "Listing", "Purchase")
    /// report status 0.
    pub fn with_failed_receipt(self, action: &'static str) -> Self {
        self.with_inner(|i| i.failed_receipts.insert(action));
        self
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.with_inner(|i| i.calls.clone())
    }

    /// Number of read-only calls served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn record(&self, call: GatewayCall) {
        self.with_inner(|i| i.calls.push(call));
    }

    fn read(&self, call: GatewayCall) {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.record(call);
    }

    fn receipt(&self, action: &'static str) -> TxReceipt {
        let calls = self.with_inner(|i| i.calls.len());
        TxReceipt {
            tx_hash: format!("0x{calls:064x}"),
            succeeded: !self.with_inner(|i| i.failed_receipts.contains(action)),
        }
    }
}

#[async_trait]
impl MarketGateway for MockGateway {
    async fn mint(&self, metadata_uri: &str) -> Result<TxReceipt> {
        self.record(GatewayCall::Mint(metadata_uri.to_string()));
        Ok(self.receipt("Mint"))
    }

    async fn approve_marketplace(&self) -> Result<TxReceipt> {
        self.record(GatewayCall::Approve);
        Ok(self.receipt("Approval"))
    }

    async fn list_token(&self, id: TokenId, price: Price) -> Result<TxReceipt> {
        self.record(GatewayCall::List(id, price));
        Ok(self.receipt("Listing"))
    }

    async fn buy_token(&self, id: TokenId, price: Price) -> Result<TxReceipt> {
        self.record(GatewayCall::Buy(id, price));
        Ok(self.receipt("Purchase"))
    }

    async fn listed_token_ids(&self) -> Result<Vec<TokenId>> {
        self.read(GatewayCall::ListedIds);
        self.with_inner(|i| match &i.listed_ids_error {
            Some(err) => Err(err.clone()),
            None => Ok(i.listed.clone()),
        })
    }

    async fn owned_token_ids(&self, owner: Address) -> Result<Vec<TokenId>> {
        self.read(GatewayCall::OwnedIds(owner));
        Ok(self.with_inner(|i| i.owned.get(&owner).cloned().unwrap_or_default()))
    }

    async fn token_uri(&self, id: TokenId) -> Result<String> {
        self.read(GatewayCall::TokenUri(id));
        self.with_inner(|i| {
            if i.failing_uris.contains(&id) {
                return Err(MarketError::ContractRead {
                    call: "tokenURI",
                    reason: "execution reverted".into(),
                });
            }
            i.uris.get(&id).cloned().ok_or(MarketError::ContractRead {
                call: "tokenURI",
                reason: "nonexistent token".into(),
            })
        })
    }

    async fn listing_price(&self, id: TokenId) -> Result<Option<Price>> {
        self.read(GatewayCall::ListingPrice(id));
        self.with_inner(|i| {
            if i.failing_prices.contains(&id) {
                return Err(MarketError::ContractRead {
                    call: "listings",
                    reason: "execution reverted".into(),
                });
            }
            Ok(i.prices.get(&id).copied())
        })
    }
}

/// Scriptable [`WalletProvider`] that hands out one shared gateway.
pub struct MockWallet {
    accounts: Vec<Address>,
    request_error: Option<MarketError>,
    gateway: MockGateway,
    sender: watch::Sender<Vec<Address>>,
}

impl MockWallet {
    pub fn new(accounts: Vec<Address>, gateway: MockGateway) -> Self {
        let (sender, _) = watch::channel(accounts.clone());
        Self {
            accounts,
            request_error: None,
            gateway,
            sender,
        }
    }

    pub fn with_request_error(mut self, error: MarketError) -> Self {
        self.request_error = Some(error);
        self
    }

    /// Sender that drives every subscription handed out by this wallet.
    pub fn accounts_sender(&self) -> watch::Sender<Vec<Address>> {
        self.sender.clone()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        match &self.request_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.accounts.clone()),
        }
    }

    async fn signer_gateway(
        &self,
        _account: Address,
        _contracts: &ContractAddresses,
    ) -> Result<Arc<dyn MarketGateway>> {
        Ok(Arc::new(self.gateway.clone()))
    }

    fn subscribe_accounts(&self) -> AccountsSubscription {
        AccountsSubscription::from_receiver(self.sender.subscribe())
    }
}

/// A call recorded by [`MockPublisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishCall {
    Upload(String),
    Metadata(ContentId, Price),
}

/// Scriptable [`AssetPublisher`].
#[derive(Clone)]
pub struct MockPublisher {
    upload: std::result::Result<ContentId, MarketError>,
    metadata: std::result::Result<String, MarketError>,
    calls: Arc<Mutex<Vec<PublishCall>>>,
}

impl MockPublisher {
    pub fn new(image_cid: &str, metadata_uri: &str) -> Self {
        Self {
            upload: Ok(ContentId::new(image_cid)),
            metadata: Ok(metadata_uri.to_string()),
            calls: Arc::default(),
        }
    }

    pub fn failing_upload(mut self) -> Self {
        self.upload = Err(MarketError::Upload("status 401".into()));
        self
    }

    pub fn failing_metadata(mut self) -> Self {
        self.metadata = Err(MarketError::MetadataUpload("status 500".into()));
        self
    }

    pub fn calls(&self) -> Vec<PublishCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetPublisher for MockPublisher {
    async fn upload_file(&self, file: &SelectedFile) -> Result<ContentId> {
        self.calls
            .lock()
            .unwrap()
            .push(PublishCall::Upload(file.name.clone()));
        self.upload.clone()
    }

    async fn publish_metadata(&self, image: &ContentId, price: &Price) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push(PublishCall::Metadata(image.clone(), *price));
        self.metadata.clone()
    }
}

/// [`MetadataFetcher`] serving documents from a map keyed by URL.
#[derive(Clone, Default)]
pub struct MockMetadata {
    documents: Arc<Mutex<BTreeMap<String, std::result::Result<TokenMetadata, MarketError>>>>,
    hanging: Arc<Mutex<HashSet<String>>>,
    delay: Option<Duration>,
    fetches: Arc<AtomicUsize>,
}

impl MockMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(self, url: &str, image: &str) -> Self {
        self.documents.lock().unwrap().insert(
            url.to_string(),
            Ok(TokenMetadata {
                name: None,
                description: None,
                image: image.to_string(),
            }),
        );
        self
    }

    pub fn with_error(self, url: &str) -> Self {
        self.documents.lock().unwrap().insert(
            url.to_string(),
            Err(MarketError::Http {
                url: url.to_string(),
                reason: "status 504 Gateway Timeout".into(),
            }),
        );
        self
    }

    /// Fetches of `url` never complete.
    pub fn with_hang(self, url: &str) -> Self {
        self.hanging.lock().unwrap().insert(url.to_string());
        self
    }

    /// Every fetch waits `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataFetcher for MockMetadata {
    async fn fetch_metadata(&self, url: &str) -> Result<TokenMetadata> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let hangs = self.hanging.lock().unwrap().contains(url);
        if hangs {
            futures::future::pending::<()>().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.documents
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| {
                Err(MarketError::Http {
                    url: url.to_string(),
                    reason: "status 404 Not Found".into(),
                })
            })
    }
}
