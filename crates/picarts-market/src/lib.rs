//! # PicArts Market
//!
//! Client-side building blocks for the PicArts NFT market: connect a wallet,
//! pin an image and its metadata, mint, list and buy tokens, and load the
//! marketplace and owned-asset galleries.
//!
//! ## Layout
//!
//! - **Wallet Session Manager** ([`wallet`]): provider abstraction, session
//!   derivation and account-change subscriptions
//! - **Asset Publisher** ([`publisher`]): uploads to the pinning service
//! - **Contract Gateway** ([`gateway`]): NFT and marketplace contract calls
//! - **Gallery Data Loader** ([`gallery`]): concurrent per-token metadata
//!   resolution
//! - **State container** ([`state`]) and pure view model ([`view`])
//! - **Handlers** ([`handlers`]): one async entry point per view event
//!
//! ## Example
//!
//! ```rust,ignore
//! use picarts_market::{handlers, MarketConfig, MarketServices, SharedState};
//!
//! #[tokio::main]
//! async fn main() -> picarts_market::Result<()> {
//!     let config = MarketConfig::builder()
//!         .rpc_url("http://127.0.0.1:8545")
//!         .nft_contract("0xdD91452C8D94aDd2c6ba238a0a7FD6F1b4910643")
//!         .marketplace_contract("0x4C808527a631E9817C522566173FD40Bbb087c27")
//!         .build()?;
//!     let services = MarketServices::from_config(&config)?;
//!     let state = SharedState::default();
//!
//!     handlers::connect_wallet(&services, state.clone()).await;
//!     Ok(())
//! }
//! ```

pub mod abi;
pub mod config;
pub mod error;
pub mod gallery;
pub mod gateway;
pub mod handlers;
pub mod ipfs;
pub mod metadata;
pub mod publisher;
pub mod record;
pub mod state;
pub mod units;
pub mod view;
pub mod wallet;

#[cfg(test)]
pub(crate) mod mock;

// Re-exports
pub use config::{
    ContractAddresses, MarketConfig, MarketConfigBuilder, MetadataDefaults, PinningCredentials,
    Secret,
};
pub use error::{MarketError, Result};
pub use gallery::{GalleryBatch, GalleryLoader, GallerySnapshot, LoadFailure};
pub use gateway::{EthersGateway, MarketGateway, TxReceipt};
pub use handlers::{MarketAction, MarketServices};
pub use ipfs::{ContentId, IpfsGateway};
pub use metadata::{HttpMetadataFetcher, MetadataFetcher, TokenMetadata};
pub use publisher::{AssetPublisher, MetadataDocument, PinataPublisher, SelectedFile};
pub use record::{ListedIdSet, PriceState, TokenId, TokenRecord};
pub use state::{MarketState, RefreshTicket, RefreshTrigger, SharedState, StateHandle, Tab};
pub use units::Price;
pub use view::{
    render, BodyView, CardAction, CardView, GalleryView, HeaderView, MintView, PageView, TabView,
};
pub use wallet::{AccountsSubscription, KeyWallet, NodeWallet, Session, SessionManager, WalletProvider};

// Address type used across the public API
pub use ethers::types::Address;
