//! Wallet Session Manager.
//!
//! A [`WalletProvider`] hands out accounts and signer-bound gateways; the
//! [`SessionManager`] turns those into a [`Session`] on connect and on every
//! account switch.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::{ContractAddresses, MarketConfig};
use crate::error::{MarketError, Result};
use crate::gateway::{EthersGateway, MarketGateway};

/// EIP-1193 "user rejected request".
const USER_REJECTED_CODE: i64 = 4001;

/// JSON-RPC "method not found".
const METHOD_NOT_FOUND_CODE: i64 = -32601;

/// A connected account and its signer-bound contract gateway.
#[derive(Clone)]
pub struct Session {
    address: Address,
    gateway: Arc<dyn MarketGateway>,
}

impl Session {
    pub fn new(address: Address, gateway: Arc<dyn MarketGateway>) -> Self {
        Self { address, gateway }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn gateway(&self) -> &dyn MarketGateway {
        self.gateway.as_ref()
    }

    /// Whether both sessions share the same gateway instance.
    pub fn same_gateway(&self, other: &Session) -> bool {
        Arc::ptr_eq(&self.gateway, &other.gateway)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Receives the provider's account list every time it changes.
///
/// Dropping the subscription deregisters it and stops any background poller.
pub struct AccountsSubscription {
    rx: watch::Receiver<Vec<Address>>,
    poller: Option<JoinHandle<()>>,
    // Keeps a fixed subscription pending instead of closing.
    _sender: Option<watch::Sender<Vec<Address>>>,
}

impl AccountsSubscription {
    /// Subscription fed by a background poller owned by this handle.
    pub fn polling(rx: watch::Receiver<Vec<Address>>, poller: JoinHandle<()>) -> Self {
        Self {
            rx,
            poller: Some(poller),
            _sender: None,
        }
    }

    /// Subscription whose account list never changes.
    pub fn fixed(accounts: Vec<Address>) -> Self {
        let (tx, rx) = watch::channel(accounts);
        Self {
            rx,
            poller: None,
            _sender: Some(tx),
        }
    }

    /// Subscription fed by an external sender.
    pub fn from_receiver(rx: watch::Receiver<Vec<Address>>) -> Self {
        Self {
            rx,
            poller: None,
            _sender: None,
        }
    }

    /// Waits for the next account change. Returns `None` once the source closes.
    pub async fn next(&mut self) -> Option<Vec<Address>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

impl Drop for AccountsSubscription {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }
}

/// Source of accounts and signing identities.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Requests access to the provider's accounts, first account first.
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    /// Builds a gateway whose transactions are signed by `account`.
    async fn signer_gateway(
        &self,
        account: Address,
        contracts: &ContractAddresses,
    ) -> Result<Arc<dyn MarketGateway>>;

    /// Registers for account-change notifications.
    fn subscribe_accounts(&self) -> AccountsSubscription;
}

/// Wallet backed by a JSON-RPC node's unlocked accounts.
///
/// Account switches are detected by polling `eth_accounts`.
pub struct NodeWallet {
    provider: Provider<Http>,
    poll_interval: Duration,
}

impl NodeWallet {
    pub fn new(rpc_url: &str, poll_interval: Duration) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| MarketError::Config(format!("RPC URL {rpc_url:?}: {e}")))?;
        Ok(Self {
            provider,
            poll_interval,
        })
    }
}

#[async_trait]
impl WalletProvider for NodeWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        match self
            .provider
            .request::<_, Vec<Address>>("eth_requestAccounts", ())
            .await
        {
            Ok(accounts) => Ok(accounts),
            Err(e) if rpc_code(&e) == Some(METHOD_NOT_FOUND_CODE) => {
                tracing::debug!("eth_requestAccounts unsupported, falling back to eth_accounts");
                self.provider
                    .get_accounts()
                    .await
                    .map_err(classify_provider_error)
            }
            Err(e) => Err(classify_provider_error(e)),
        }
    }

    async fn signer_gateway(
        &self,
        account: Address,
        contracts: &ContractAddresses,
    ) -> Result<Arc<dyn MarketGateway>> {
        let client = Arc::new(self.provider.clone().with_sender(account));
        Ok(Arc::new(EthersGateway::new(client, contracts)?))
    }

    fn subscribe_accounts(&self) -> AccountsSubscription {
        let (tx, rx) = watch::channel(Vec::new());
        let provider = self.provider.clone();
        let poll_interval = self.poll_interval;

        let poller = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            let mut last: Option<Vec<Address>> = None;
            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    break;
                }
                match provider.get_accounts().await {
                    Ok(accounts) => {
                        // The first poll only records the baseline.
                        if last.is_some() && last.as_ref() != Some(&accounts) {
                            tracing::info!(count = accounts.len(), "wallet accounts changed");
                            tx.send_replace(accounts.clone());
                        }
                        last = Some(accounts);
                    }
                    Err(e) => tracing::debug!(error = %e, "account poll failed"),
                }
            }
        });

        AccountsSubscription::polling(rx, poller)
    }
}

/// Wallet signing locally with a private key, sending through an RPC node.
pub struct KeyWallet {
    provider: Provider<Http>,
    wallet: LocalWallet,
}

impl KeyWallet {
    pub fn new(rpc_url: &str, private_key: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| MarketError::Config(format!("RPC URL {rpc_url:?}: {e}")))?;
        let wallet = private_key
            .trim()
            .parse::<LocalWallet>()
            .map_err(|_| MarketError::Config("private key is not valid hex".into()))?;
        Ok(Self { provider, wallet })
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }
}

#[async_trait]
impl WalletProvider for KeyWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        Ok(vec![self.wallet.address()])
    }

    async fn signer_gateway(
        &self,
        account: Address,
        contracts: &ContractAddresses,
    ) -> Result<Arc<dyn MarketGateway>> {
        if account != self.wallet.address() {
            return Err(MarketError::Provider(format!(
                "account {account:?} is not held by this key"
            )));
        }
        let chain_id = self
            .provider
            .get_chainid()
            .await
            .map_err(classify_provider_error)?;
        let signer = self.wallet.clone().with_chain_id(chain_id.as_u64());
        let client = Arc::new(SignerMiddleware::new(self.provider.clone(), signer));
        Ok(Arc::new(EthersGateway::new(client, contracts)?))
    }

    fn subscribe_accounts(&self) -> AccountsSubscription {
        AccountsSubscription::fixed(vec![self.wallet.address()])
    }
}

/// Derives sessions from a wallet provider.
pub struct SessionManager {
    provider: Option<Arc<dyn WalletProvider>>,
    contracts: ContractAddresses,
}

impl SessionManager {
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, contracts: ContractAddresses) -> Self {
        Self {
            provider,
            contracts,
        }
    }

    /// Picks the provider the configuration describes: a key wallet when a
    /// private key is set, a node wallet when only an RPC URL is set, and no
    /// provider otherwise.
    pub fn from_config(config: &MarketConfig) -> Result<Self> {
        let provider: Option<Arc<dyn WalletProvider>> =
            match (&config.rpc_url, &config.private_key) {
                (Some(url), Some(key)) => Some(Arc::new(KeyWallet::new(url, key.expose())?)),
                (Some(url), None) => {
                    Some(Arc::new(NodeWallet::new(url, config.account_poll_interval)?))
                }
                (None, _) => None,
            };
        Ok(Self::new(provider, config.contracts))
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Requests account access and opens a session for the first account.
    pub async fn connect(&self) -> Result<Session> {
        let provider = self
            .provider
            .as_ref()
            .ok_or(MarketError::ProviderUnavailable)?;
        let accounts = provider.request_accounts().await?;
        let account = first_account(&accounts).ok_or(MarketError::NoAccounts)?;
        self.open(provider.as_ref(), account).await
    }

    /// Reacts to an account-change notification.
    ///
    /// Returns the new session, or `None` when the wallet logged out.
    pub async fn on_accounts_changed(&self, accounts: &[Address]) -> Result<Option<Session>> {
        let Some(account) = first_account(accounts) else {
            return Ok(None);
        };
        let provider = self
            .provider
            .as_ref()
            .ok_or(MarketError::ProviderUnavailable)?;
        self.open(provider.as_ref(), account).await.map(Some)
    }

    /// Registers for account changes; `None` without a provider.
    pub fn subscribe(&self) -> Option<AccountsSubscription> {
        self.provider.as_ref().map(|p| p.subscribe_accounts())
    }

    async fn open(&self, provider: &dyn WalletProvider, account: Address) -> Result<Session> {
        let gateway = provider.signer_gateway(account, &self.contracts).await?;
        Ok(Session::new(account, gateway))
    }
}

fn first_account(accounts: &[Address]) -> Option<Address> {
    accounts.first().copied().filter(|a| !a.is_zero())
}

fn rpc_code(err: &ProviderError) -> Option<i64> {
    err.as_error_response().map(|e| e.code)
}

fn classify_provider_error(err: ProviderError) -> MarketError {
    match rpc_code(&err) {
        Some(USER_REJECTED_CODE) => MarketError::UserRejected,
        _ => MarketError::Provider(err.to_string()),
    }
}
