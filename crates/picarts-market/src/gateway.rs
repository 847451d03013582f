//! Contract Gateway: NFT and marketplace contract calls.
//!
//! Writes are two-phase (submit, then wait for the inclusion receipt) and
//! report the receipt status instead of judging it; the handlers decide what
//! a failed receipt means for their flow.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::contract::{Contract, ContractCall, ContractError};
use ethers::providers::Middleware;
use ethers::types::{Address, U256, U64};
use ethers::abi::Detokenize;

use crate::abi;
use crate::config::ContractAddresses;
use crate::error::{MarketError, Result};
use crate::record::TokenId;
use crate::units::Price;

/// Outcome of an included transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: String,
    /// Receipt status was 1.
    pub succeeded: bool,
}

impl TxReceipt {
    /// Turns a failed receipt into [`MarketError::TransactionFailed`].
    pub fn ensure_success(self, action: &'static str) -> Result<Self> {
        if self.succeeded {
            Ok(self)
        } else {
            Err(MarketError::TransactionFailed {
                action,
                reason: format!("receipt for {} reported failure", self.tx_hash),
            })
        }
    }
}

/// Calls against the NFT and marketplace contracts, bound to one signer.
#[async_trait]
pub trait MarketGateway: Send + Sync {
    /// `safeMint(uri)` on the NFT contract.
    async fn mint(&self, metadata_uri: &str) -> Result<TxReceipt>;

    /// `setApprovalForAll(marketplace, true)` on the NFT contract.
    async fn approve_marketplace(&self) -> Result<TxReceipt>;

    /// `listToken(id, priceWei)` on the marketplace.
    async fn list_token(&self, id: TokenId, price: Price) -> Result<TxReceipt>;

    /// `buyToken(id)` on the marketplace with `price` attached as value.
    async fn buy_token(&self, id: TokenId, price: Price) -> Result<TxReceipt>;

    /// Ids currently listed on the marketplace.
    async fn listed_token_ids(&self) -> Result<Vec<TokenId>>;

    /// Ids held by `owner`.
    async fn owned_token_ids(&self, owner: Address) -> Result<Vec<TokenId>>;

    /// Token URI pointer stored on-chain.
    async fn token_uri(&self, id: TokenId) -> Result<String>;

    /// Active listing price, `None` when the token is not listed.
    async fn listing_price(&self, id: TokenId) -> Result<Option<Price>>;
}

/// [`MarketGateway`] over an ethers middleware stack.
pub struct EthersGateway<M> {
    nft: Contract<M>,
    marketplace: Contract<M>,
    marketplace_address: Address,
}

impl<M: Middleware + 'static> EthersGateway<M> {
    pub fn new(client: Arc<M>, contracts: &ContractAddresses) -> Result<Self> {
        Ok(Self {
            nft: Contract::new(contracts.nft, abi::nft_abi()?, client.clone()),
            marketplace: Contract::new(contracts.marketplace, abi::marketplace_abi()?, client),
            marketplace_address: contracts.marketplace,
        })
    }

    /// Sends the call and waits for its receipt.
    async fn submit<D: Detokenize>(
        action: &'static str,
        call: ContractCall<M, D>,
    ) -> Result<TxReceipt> {
        let pending = call.send().await.map_err(|e| write_error(action, e))?;
        let tx_hash = format!("{:?}", pending.tx_hash());
        tracing::debug!(action, tx = %tx_hash, "transaction submitted");

        let receipt = pending
            .await
            .map_err(|e| MarketError::Provider(e.to_string()))?
            .ok_or_else(|| MarketError::TransactionFailed {
                action,
                reason: format!("{tx_hash} was dropped before inclusion"),
            })?;

        let succeeded = receipt.status == Some(U64::from(1));
        tracing::info!(action, tx = %tx_hash, succeeded, "transaction included");
        Ok(TxReceipt { tx_hash, succeeded })
    }
}

#[async_trait]
impl<M: Middleware + 'static> MarketGateway for EthersGateway<M> {
    async fn mint(&self, metadata_uri: &str) -> Result<TxReceipt> {
        let call = self
            .nft
            .method::<_, ()>("safeMint", metadata_uri.to_string())
            .map_err(|e| MarketError::Config(e.to_string()))?;
        Self::submit("Mint", call).await
    }

    async fn approve_marketplace(&self) -> Result<TxReceipt> {
        let call = self
            .nft
            .method::<_, ()>("setApprovalForAll", (self.marketplace_address, true))
            .map_err(|e| MarketError::Config(e.to_string()))?;
        Self::submit("Approval", call).await
    }

    async fn list_token(&self, id: TokenId, price: Price) -> Result<TxReceipt> {
        let call = self
            .marketplace
            .method::<_, ()>("listToken", (id.to_u256(), price.wei()))
            .map_err(|e| MarketError::Config(e.to_string()))?;
        Self::submit("Listing", call).await
    }

    async fn buy_token(&self, id: TokenId, price: Price) -> Result<TxReceipt> {
        let call = self
            .marketplace
            .method::<_, ()>("buyToken", id.to_u256())
            .map_err(|e| MarketError::Config(e.to_string()))?
            .value(price.wei());
        Self::submit("Purchase", call).await
    }

    async fn listed_token_ids(&self) -> Result<Vec<TokenId>> {
        let ids = self
            .marketplace
            .method::<_, Vec<U256>>("getListedTokenIds", ())
            .map_err(|e| MarketError::Config(e.to_string()))?
            .call()
            .await
            .map_err(|e| read_error("getListedTokenIds", e))?;
        to_token_ids("getListedTokenIds", ids)
    }

    async fn owned_token_ids(&self, owner: Address) -> Result<Vec<TokenId>> {
        let ids = self
            .nft
            .method::<_, Vec<U256>>("tokensOfOwner", owner)
            .map_err(|e| MarketError::Config(e.to_string()))?
            .call()
            .await
            .map_err(|e| read_error("tokensOfOwner", e))?;
        to_token_ids("tokensOfOwner", ids)
    }

    async fn token_uri(&self, id: TokenId) -> Result<String> {
        self.nft
            .method::<_, String>("tokenURI", id.to_u256())
            .map_err(|e| MarketError::Config(e.to_string()))?
            .call()
            .await
            .map_err(|e| read_error("tokenURI", e))
    }

    async fn listing_price(&self, id: TokenId) -> Result<Option<Price>> {
        let (_seller, price) = self
            .marketplace
            .method::<_, (Address, U256)>("listings", id.to_u256())
            .map_err(|e| MarketError::Config(e.to_string()))?
            .call()
            .await
            .map_err(|e| read_error("listings", e))?;
        Ok(listing_from_wei(price))
    }
}

/// A zero price is the marketplace's "no listing" value.
pub fn listing_from_wei(price: U256) -> Option<Price> {
    (!price.is_zero()).then(|| Price::from_wei(price))
}

fn to_token_ids(call: &'static str, ids: Vec<U256>) -> Result<Vec<TokenId>> {
    ids.into_iter()
        .map(|raw| {
            TokenId::from_u256(raw).ok_or_else(|| MarketError::ContractRead {
                call,
                reason: format!("token id {raw} does not fit in 64 bits"),
            })
        })
        .collect()
}

fn write_error<M: Middleware>(action: &'static str, err: ContractError<M>) -> MarketError {
    match err {
        ContractError::Revert(data) => MarketError::TransactionFailed {
            action,
            reason: format!("execution reverted ({data})"),
        },
        other => MarketError::Provider(other.to_string()),
    }
}

fn read_error<M: Middleware>(call: &'static str, err: ContractError<M>) -> MarketError {
    MarketError::ContractRead {
        call,
        reason: err.to_string(),
    }
}
