//! Human-readable ABI fragments for the two contracts.

use ethers::abi::{parse_abi, Abi};

use crate::error::{MarketError, Result};

/// ERC-721 collection with URI-carrying mint and owner enumeration.
pub const NFT_ABI: &[&str] = &[
    "function safeMint(string uri) external",
    "function tokenURI(uint256 tokenId) external view returns (string)",
    "function tokensOfOwner(address owner) external view returns (uint256[])",
    "function setApprovalForAll(address operator, bool approved) external",
];

/// Fixed-price marketplace holding one listing per token id.
pub const MARKETPLACE_ABI: &[&str] = &[
    "function listToken(uint256 tokenId, uint256 price) external",
    "function buyToken(uint256 tokenId) external payable",
    "function getListedTokenIds() external view returns (uint256[])",
    "function listings(uint256 tokenId) external view returns (address seller, uint256 price)",
];

pub fn nft_abi() -> Result<Abi> {
    parse_abi(NFT_ABI).map_err(|e| MarketError::Config(format!("NFT ABI: {e}")))
}

pub fn marketplace_abi() -> Result<Abi> {
    parse_abi(MARKETPLACE_ABI).map_err(|e| MarketError::Config(format!("marketplace ABI: {e}")))
}
