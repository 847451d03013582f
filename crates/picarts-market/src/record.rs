//! Display records assembled by the gallery loader.

use std::collections::BTreeSet;
use std::fmt;

use ethers::types::U256;

use crate::units::Price;

/// On-chain token identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId(pub u64);

impl TokenId {
    /// Converts an on-chain id, returning `None` when it does not fit in 64 bits.
    pub fn from_u256(value: U256) -> Option<Self> {
        (value.bits() <= 64).then(|| Self(value.low_u64()))
    }

    pub fn to_u256(self) -> U256 {
        U256::from(self.0)
    }
}

impl From<u64> for TokenId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Listing state of a token as shown on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceState {
    /// The marketplace reports no active listing.
    #[default]
    Unlisted,
    /// A refresh for this record is in flight.
    Loading,
    /// Active listing at this price.
    Listed(Price),
}

impl PriceState {
    /// Maps the marketplace's listing read onto a price state.
    pub fn from_listing(price: Option<Price>) -> Self {
        match price {
            Some(price) => Self::Listed(price),
            None => Self::Unlisted,
        }
    }

    pub fn listed_price(&self) -> Option<Price> {
        match self {
            Self::Listed(price) => Some(*price),
            _ => None,
        }
    }

    pub fn is_listed(&self) -> bool {
        matches!(self, Self::Listed(_))
    }

    /// Card label: `"1.5 ETH"`, `"Loading..."` or `"Not listed"`.
    pub fn label(&self) -> String {
        match self {
            Self::Listed(price) => format!("{price} ETH"),
            Self::Loading => "Loading...".to_string(),
            Self::Unlisted => "Not listed".to_string(),
        }
    }
}

/// A resolved token ready for display.
///
/// Used for both marketplace listings and owned assets; only the source id
/// set differs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub id: TokenId,
    /// Gateway HTTP URL of the token image.
    pub image_uri: String,
    /// Name from the metadata document, when present.
    pub name: Option<String>,
    pub price: PriceState,
}

impl TokenRecord {
    /// Card title, falling back to the token id.
    pub fn title(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => format!("{name} #{}", self.id),
            _ => format!("Token ID: {}", self.id),
        }
    }
}

/// Token ids currently listed on the marketplace contract.
pub type ListedIdSet = BTreeSet<TokenId>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_id_rejects_oversized_values() {
        assert_eq!(TokenId::from_u256(U256::from(42u64)), Some(TokenId(42)));
        assert_eq!(TokenId::from_u256(U256::from(u64::MAX)), Some(TokenId(u64::MAX)));
        assert_eq!(TokenId::from_u256(U256::from(u64::MAX) + 1), None);
    }

    #[test]
    fn price_labels() {
        let price = Price::parse("1.5").unwrap();
        assert_eq!(PriceState::Listed(price).label(), "1.5 ETH");
        assert_eq!(PriceState::Loading.label(), "Loading...");
        assert_eq!(PriceState::Unlisted.label(), "Not listed");
        assert_eq!(PriceState::from_listing(None), PriceState::Unlisted);
        assert_eq!(PriceState::from_listing(Some(price)).listed_price(), Some(price));
    }

    #[test]
    fn title_falls_back_to_id() {
        let mut record = TokenRecord {
            id: TokenId(3),
            image_uri: String::new(),
            name: None,
            price: PriceState::Unlisted,
        };
        assert_eq!(record.title(), "Token ID: 3");
        record.name = Some("Sunset".into());
        assert_eq!(record.title(), "Sunset #3");
    }
}
