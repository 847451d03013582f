//! Event handlers.
//!
//! One async function per view event. Handlers read their inputs from the
//! state, validate them before any remote call, run the flow, and write the
//! outcome back through the state's entry points. No error escapes a
//! handler: every failure lands in the error slot.
//!
//! A view forwards events as [`MarketAction`]s to a single [`run_actions`]
//! loop, so a flow keeps running after the widget that started it is gone.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ethers::types::Address;
use futures::stream::{FuturesUnordered, Stream, StreamExt};

use crate::config::MarketConfig;
use crate::error::{MarketError, Result};
use crate::gallery::GalleryLoader;
use crate::gateway::TxReceipt;
use crate::publisher::{AssetPublisher, PinataPublisher, SelectedFile};
use crate::record::{PriceState, TokenId};
use crate::state::{MarketState, RefreshTicket, StateHandle};
use crate::units::Price;
use crate::wallet::{Session, SessionManager};

pub const MINT_SUCCESS: &str = "Token minted successfully!";
pub const LIST_SUCCESS: &str = "NFT listed successfully!";
pub const BUY_SUCCESS: &str = "Purchase successful!";

/// Long-lived services shared by every handler.
#[derive(Clone)]
pub struct MarketServices {
    pub sessions: Arc<SessionManager>,
    pub publisher: Arc<dyn AssetPublisher>,
    pub loader: Arc<GalleryLoader>,
}

impl MarketServices {
    pub fn new(
        sessions: Arc<SessionManager>,
        publisher: Arc<dyn AssetPublisher>,
        loader: Arc<GalleryLoader>,
    ) -> Self {
        Self {
            sessions,
            publisher,
            loader,
        }
    }

    /// Wires the production services described by `config`.
    pub fn from_config(config: &MarketConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| MarketError::Config(format!("HTTP client: {e}")))?;
        let sessions = SessionManager::from_config(config)?;
        if !sessions.has_provider() {
            tracing::warn!("no RPC endpoint configured; wallet connection is unavailable");
        }
        if config.pinning_credentials.is_none() {
            tracing::warn!("no pinning credentials configured; minting will fail");
        }

        Ok(Self::new(
            Arc::new(sessions),
            Arc::new(PinataPublisher::from_config(client.clone(), config)),
            Arc::new(GalleryLoader::from_config(client, config)),
        ))
    }
}

// ============================================================
// Action loop
// ============================================================

/// A user event forwarded from the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketAction {
    Connect,
    LoadFile(PathBuf),
    Mint,
    List(TokenId),
    Buy(TokenId),
}

/// Runs the handler for one action to completion.
pub async fn dispatch<S: StateHandle>(services: &MarketServices, state: S, action: MarketAction) {
    match action {
        MarketAction::Connect => connect_wallet(services, state).await,
        MarketAction::LoadFile(path) => load_file(state, &path).await,
        MarketAction::Mint => mint(services, state).await,
        MarketAction::List(id) => list(services, state, id).await,
        MarketAction::Buy(id) => buy(services, state, id).await,
    }
}

/// Runs every action received from `actions` concurrently.
///
/// Returns once the stream has ended and every started action has finished.
/// Senders may go away at any time without cutting a flow short.
pub async fn run_actions<S, A>(services: &MarketServices, state: S, mut actions: A)
where
    S: StateHandle,
    A: Stream<Item = MarketAction> + Unpin,
{
    let mut running = FuturesUnordered::new();
    loop {
        tokio::select! {
            action = actions.next() => match action {
                Some(action) => {
                    tracing::debug!(?action, "action received");
                    running.push(dispatch(services, state.clone(), action));
                }
                None => break,
            },
            Some(()) = running.next(), if !running.is_empty() => {}
        }
    }
    while running.next().await.is_some() {}
    tracing::debug!("action stream closed");
}

// ============================================================
// Handlers
// ============================================================

/// Connect button.
pub async fn connect_wallet<S: StateHandle>(services: &MarketServices, mut state: S) {
    match services.sessions.connect().await {
        Ok(session) => {
            let ticket = state.update(|s| s.session_established(session));
            refresh(services, state, ticket).await;
        }
        Err(error) => fail(&mut state, "connect", error),
    }
}

/// The wallet reported a new account list.
pub async fn accounts_changed<S: StateHandle>(
    services: &MarketServices,
    state: S,
    accounts: Vec<Address>,
) {
    if let Some(ticket) = switch_account(services, state.clone(), &accounts).await {
        refresh(services, state, ticket).await;
    }
}

/// Forwards account changes until the subscription closes.
///
/// Each change is applied to the session as soon as it arrives; the refresh
/// it triggers runs alongside later events instead of ahead of them. The
/// subscription is released when the returned future is dropped.
pub async fn watch_accounts<S: StateHandle>(services: &MarketServices, state: S) {
    let Some(mut subscription) = services.sessions.subscribe() else {
        return;
    };
    let mut refreshes = FuturesUnordered::new();
    loop {
        tokio::select! {
            accounts = subscription.next() => match accounts {
                Some(accounts) => {
                    if let Some(ticket) = switch_account(services, state.clone(), &accounts).await {
                        refreshes.push(refresh(services, state.clone(), ticket));
                    }
                }
                None => break,
            },
            Some(()) = refreshes.next(), if !refreshes.is_empty() => {}
        }
    }
    tracing::debug!("account subscription closed");
}

async fn switch_account<S: StateHandle>(
    services: &MarketServices,
    mut state: S,
    accounts: &[Address],
) -> Option<RefreshTicket> {
    match services.sessions.on_accounts_changed(accounts).await {
        Ok(session) => state.update(|s| s.account_switched(session)),
        Err(error) => {
            fail(&mut state, "account switch", error);
            None
        }
    }
}

/// Runs the loader for `ticket` and installs the snapshot unless it is stale.
pub async fn refresh<S: StateHandle>(services: &MarketServices, mut state: S, ticket: RefreshTicket) {
    let snapshot = services.loader.refresh(&ticket.session).await;
    state.update(|s| s.apply_refresh(&ticket, snapshot));
}

/// File picker produced a path.
pub async fn load_file<S: StateHandle>(mut state: S, path: &Path) {
    match SelectedFile::from_path(path).await {
        Ok(file) => {
            tracing::debug!(file = %file.name, bytes = file.len(), "file selected");
            state.update(|s| s.select_file(file));
        }
        Err(error) => fail(&mut state, "file selection", error),
    }
}

/// Mint button.
pub async fn mint<S: StateHandle>(services: &MarketServices, state: S) {
    let (session, file, price) = state.with(|s| {
        (
            s.session.clone(),
            s.selected_file.clone(),
            s.mint_price.clone(),
        )
    });

    let outcome = mint_token(
        services.publisher.as_ref(),
        session.as_ref(),
        file.as_ref(),
        &price,
    )
    .await;
    finish(services, state, "mint", outcome, MINT_SUCCESS, MarketState::mint_completed).await;
}

/// LIST button on an owned card.
pub async fn list<S: StateHandle>(services: &MarketServices, state: S, id: TokenId) {
    let (session, price) = state.with(|s| (s.session.clone(), s.list_price(id).to_string()));
    let outcome = list_for_sale(session.as_ref(), id, &price).await;
    finish(services, state, "list", outcome, LIST_SUCCESS, |s| {
        s.list_prices.remove(&id);
    })
    .await;
}

/// BUY button on a marketplace card.
pub async fn buy<S: StateHandle>(services: &MarketServices, state: S, id: TokenId) {
    let (session, price) = state.with(|s| {
        (
            s.session.clone(),
            s.listed_record(id).map(|r| r.price).unwrap_or_default(),
        )
    });
    let outcome = purchase(session.as_ref(), id, price).await;
    finish(services, state, "buy", outcome, BUY_SUCCESS, |_| {}).await;
}

async fn finish<S: StateHandle>(
    services: &MarketServices,
    mut state: S,
    action: &'static str,
    outcome: Result<TxReceipt>,
    message: &'static str,
    on_success: impl FnOnce(&mut MarketState),
) {
    match outcome {
        Ok(receipt) => {
            tracing::info!(action, tx = %receipt.tx_hash, "{message}");
            let ticket = state.update(|s| {
                on_success(s);
                s.report_success(message);
                s.listing_changed()
            });
            if let Some(ticket) = ticket {
                refresh(services, state, ticket).await;
            }
        }
        Err(error) => fail(&mut state, action, error),
    }
}

fn fail<S: StateHandle>(state: &mut S, action: &'static str, error: MarketError) {
    if error.is_validation() {
        tracing::debug!(action, error = %error, "input rejected");
    } else {
        tracing::error!(action, error = %error, "handler failed");
    }
    state.update(|s| s.report_error(&error));
}

// ============================================================
// Flows
// ============================================================

/// Uploads the image, publishes its metadata and mints the token.
///
/// The file and price are checked before anything leaves the process.
pub async fn mint_token(
    publisher: &dyn AssetPublisher,
    session: Option<&Session>,
    file: Option<&SelectedFile>,
    price_input: &str,
) -> Result<TxReceipt> {
    let file = file.ok_or(MarketError::NoFileSelected)?;
    let price = Price::parse(price_input)?;
    let session = session.ok_or(MarketError::ContractNotInitialized)?;

    let image = publisher.upload_file(file).await?;
    let metadata_uri = publisher.publish_metadata(&image, &price).await?;
    session
        .gateway()
        .mint(&metadata_uri)
        .await?
        .ensure_success("Mint")
}

/// Approves the marketplace, then lists `id`.
///
/// `listToken` is only sent after the approval receipt reports success.
pub async fn list_for_sale(
    session: Option<&Session>,
    id: TokenId,
    price_input: &str,
) -> Result<TxReceipt> {
    let price = Price::parse(price_input)?;
    let session = session.ok_or(MarketError::ContractNotInitialized)?;
    let gateway = session.gateway();

    let approval = gateway.approve_marketplace().await?;
    if !approval.succeeded {
        return Err(MarketError::ApprovalFailed {
            tx_hash: approval.tx_hash,
        });
    }
    gateway.list_token(id, price).await?.ensure_success("Listing")
}

/// Buys `id` at its listed price.
///
/// A record whose price is being re-read is rejected with a retry hint
/// rather than as unlisted.
pub async fn purchase(
    session: Option<&Session>,
    id: TokenId,
    price: PriceState,
) -> Result<TxReceipt> {
    let price = match price {
        PriceState::Listed(price) => price,
        PriceState::Loading => return Err(MarketError::PriceLoading(id)),
        PriceState::Unlisted => return Err(MarketError::NotListed(id)),
    };
    let session = session.ok_or(MarketError::ContractNotInitialized)?;
    session
        .gateway()
        .buy_token(id, price)
        .await?
        .ensure_success("Purchase")
}
