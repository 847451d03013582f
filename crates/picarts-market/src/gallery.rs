//! Gallery Data Loader.
//!
//! Resolves token ids into display records. Each id runs its own pipeline
//! (token URI, metadata document, listing price) and all pipelines are joined
//! as one batch; a failing id is logged and collected without touching its
//! siblings.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::join_all;

use crate::config::MarketConfig;
use crate::error::{MarketError, Result};
use crate::gateway::MarketGateway;
use crate::ipfs::IpfsGateway;
use crate::metadata::{HttpMetadataFetcher, MetadataFetcher};
use crate::record::{ListedIdSet, PriceState, TokenId, TokenRecord};
use crate::wallet::Session;

/// A failure recorded during a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    /// The token whose pipeline failed, or `None` when the id set itself
    /// could not be read.
    pub id: Option<TokenId>,
    pub error: MarketError,
}

impl LoadFailure {
    /// Line shown in the error slot.
    pub fn message(&self) -> String {
        match self.id {
            Some(id) => format!("Error fetching metadata for token ID {id}: {}", self.error),
            None => format!("Error fetching token ids: {}", self.error),
        }
    }
}

/// Records resolved from one id set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryBatch {
    /// Sorted by id, at most one per id.
    pub records: Vec<TokenRecord>,
    pub failures: Vec<LoadFailure>,
}

/// Result of a full refresh cycle. Replaces the previous snapshot wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GallerySnapshot {
    pub listed: Vec<TokenRecord>,
    pub owned: Vec<TokenRecord>,
    pub listed_ids: ListedIdSet,
    pub failures: Vec<LoadFailure>,
}

impl GallerySnapshot {
    /// Summary for the error slot, `None` for a clean refresh.
    pub fn error_summary(&self) -> Option<String> {
        let first = self.failures.first()?;
        let rest = self.failures.len() - 1;
        if rest == 0 {
            Some(first.message())
        } else {
            Some(format!("{} (and {rest} more)", first.message()))
        }
    }
}

/// Builds [`TokenRecord`]s from on-chain pointers and gateway metadata.
#[derive(Clone)]
pub struct GalleryLoader {
    fetcher: Arc<dyn MetadataFetcher>,
    ipfs: IpfsGateway,
}

impl GalleryLoader {
    pub fn new(fetcher: Arc<dyn MetadataFetcher>, ipfs: IpfsGateway) -> Self {
        Self { fetcher, ipfs }
    }

    /// Loader fetching over HTTP from the configured gateway.
    pub fn from_config(client: reqwest::Client, config: &MarketConfig) -> Self {
        Self::new(
            Arc::new(HttpMetadataFetcher::new(client)),
            IpfsGateway::new(&config.gateway_url),
        )
    }

    pub fn ipfs(&self) -> &IpfsGateway {
        &self.ipfs
    }

    /// Resolves one token.
    pub async fn resolve(&self, gateway: &dyn MarketGateway, id: TokenId) -> Result<TokenRecord> {
        let token_uri = gateway.token_uri(id).await?;
        let metadata = self
            .fetcher
            .fetch_metadata(&self.ipfs.resolve(&token_uri))
            .await?;
        let price = gateway.listing_price(id).await?;

        Ok(TokenRecord {
            id,
            image_uri: self.ipfs.resolve(&metadata.image),
            name: metadata.name,
            price: PriceState::from_listing(price),
        })
    }

    /// Resolves every id concurrently.
    ///
    /// Duplicate ids are resolved once. Records come back sorted by id; ids
    /// whose pipeline failed are missing from `records` and present in
    /// `failures`.
    pub async fn load(&self, gateway: &dyn MarketGateway, ids: &[TokenId]) -> GalleryBatch {
        let unique: BTreeSet<TokenId> = ids.iter().copied().collect();
        let results = join_all(unique.into_iter().map(|id| async move {
            (id, self.resolve(gateway, id).await)
        }))
        .await;

        let mut batch = GalleryBatch::default();
        for (id, result) in results {
            match result {
                Ok(record) => batch.records.push(record),
                Err(error) => {
                    tracing::warn!(token_id = %id, error = %error, "dropping token from gallery");
                    batch.failures.push(LoadFailure {
                        id: Some(id),
                        error,
                    });
                }
            }
        }
        batch.records.sort_by_key(|r| r.id);
        batch
    }

    /// Loads the marketplace listings and the session's owned tokens.
    ///
    /// Both sets are loaded at the same time. A failure reading either id
    /// set yields an empty side and a failure without an id.
    pub async fn refresh(&self, session: &Session) -> GallerySnapshot {
        let gateway = session.gateway();
        let owner = session.address();

        let listed = async {
            match gateway.listed_token_ids().await {
                Ok(ids) => {
                    let batch = self.load(gateway, &ids).await;
                    (ids.into_iter().collect::<ListedIdSet>(), batch)
                }
                Err(error) => (ListedIdSet::new(), set_failure(error)),
            }
        };
        let owned = async {
            match gateway.owned_token_ids(owner).await {
                Ok(ids) => self.load(gateway, &ids).await,
                Err(error) => set_failure(error),
            }
        };
        let ((listed_ids, listed), owned) = futures::join!(listed, owned);

        let mut failures = listed.failures;
        failures.extend(owned.failures);
        tracing::info!(
            listed = listed.records.len(),
            owned = owned.records.len(),
            failed = failures.len(),
            "gallery refreshed"
        );

        GallerySnapshot {
            listed: listed.records,
            owned: owned.records,
            listed_ids,
            failures,
        }
    }
}

fn set_failure(error: MarketError) -> GalleryBatch {
    tracing::warn!(error = %error, "could not read token id set");
    GalleryBatch {
        records: Vec::new(),
        failures: vec![LoadFailure { id: None, error }],
    }
}
