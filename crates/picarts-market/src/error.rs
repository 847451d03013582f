//! Error types for the PicArts market client.
//!
//! Every variant renders as the sentence shown in the view's error line, so
//! handlers can write `error.to_string()` straight into state.

use crate::record::TokenId;

/// Result type alias for market operations.
pub type Result<T> = std::result::Result<T, MarketError>;

/// Unified error type for wallet, pinning, contract and gateway failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarketError {
    // ============================================================
    // Wallet session
    // ============================================================
    /// No wallet provider is configured for this process.
    #[error("No wallet provider available. Configure an RPC endpoint and restart")]
    ProviderUnavailable,

    /// The provider answered with an empty account list.
    #[error("The wallet did not expose any accounts")]
    NoAccounts,

    /// The user declined the request in the wallet.
    #[error("Request rejected in the wallet")]
    UserRejected,

    /// Any other provider or transport failure.
    #[error("Error connecting to the Ethereum provider: {0}")]
    Provider(String),

    // ============================================================
    // Contract gateway
    // ============================================================
    /// A contract call was attempted without a connected session.
    #[error("Contracts not initialized. Connect a wallet first")]
    ContractNotInitialized,

    /// The transaction reverted, was dropped, or its receipt reported failure.
    #[error("{action} transaction failed: {reason}")]
    TransactionFailed { action: &'static str, reason: String },

    /// The marketplace approval receipt did not report success.
    #[error("Error approving the marketplace for transfers (tx {tx_hash})")]
    ApprovalFailed { tx_hash: String },

    /// A read-only contract call failed.
    #[error("Error reading {call} from contract: {reason}")]
    ContractRead { call: &'static str, reason: String },

    // ============================================================
    // Pinning service and gateway
    // ============================================================
    /// Uploading the image file to the pinning service failed.
    #[error("Error uploading file to IPFS: {0}")]
    Upload(String),

    /// Uploading the metadata document to the pinning service failed.
    #[error("Error uploading metadata to IPFS: {0}")]
    MetadataUpload(String),

    /// A gateway fetch returned a non-2xx status or a non-JSON body.
    #[error("HTTP error fetching {url}: {reason}")]
    Http { url: String, reason: String },

    // ============================================================
    // Input validation
    // ============================================================
    /// The mint handler ran without a selected file.
    #[error("Please select a file to upload")]
    NoFileSelected,

    /// A price field did not hold a positive ether amount.
    #[error("Invalid price \"{input}\": {reason}")]
    InvalidPrice { input: String, reason: &'static str },

    /// A purchase was attempted for a token without an active listing.
    #[error("Token ID {0} is not listed for sale")]
    NotListed(TokenId),

    /// A purchase was attempted while the token's listing price was being re-read.
    #[error("The price of token ID {0} is still loading, try again")]
    PriceLoading(TokenId),

    // ============================================================
    // Process setup
    // ============================================================
    /// Configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading a local file failed.
    #[error("Error reading file: {0}")]
    Io(String),
}

impl MarketError {
    /// Builds an [`MarketError::InvalidPrice`] for the given raw input.
    pub fn invalid_price(input: &str, reason: &'static str) -> Self {
        Self::InvalidPrice {
            input: input.to_string(),
            reason,
        }
    }

    /// Whether this error came from validating user input before any remote call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NoFileSelected
                | Self::InvalidPrice { .. }
                | Self::NotListed(_)
                | Self::PriceLoading(_)
        )
    }
}
