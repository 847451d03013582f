//! State container for the market UI.
//!
//! Every event the UI reacts to has one entry point on [`MarketState`].
//! Entry points that should reload the galleries hand back a
//! [`RefreshTicket`]; the snapshot produced for a ticket is only applied if no
//! newer ticket was issued in the meantime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::MarketError;
use crate::gallery::GallerySnapshot;
use crate::publisher::SelectedFile;
use crate::record::{ListedIdSet, PriceState, TokenId, TokenRecord};
use crate::wallet::Session;

/// The three views of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    #[default]
    Mint,
    Marketplace,
    MyAssets,
}

impl Tab {
    /// Tabs in display order.
    pub const ALL: [Tab; 3] = [Tab::Mint, Tab::Marketplace, Tab::MyAssets];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Mint => "Mint",
            Tab::Marketplace => "NFT MARKETPLACE",
            Tab::MyAssets => "My NFTs",
        }
    }
}

/// Why a gallery refresh was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    SessionEstablished,
    AccountSwitched,
    ListingChanged,
}

/// Permission to run one refresh against a session.
#[derive(Debug, Clone)]
pub struct RefreshTicket {
    pub generation: u64,
    pub trigger: RefreshTrigger,
    pub session: Session,
}

/// Everything the view renders from.
#[derive(Debug, Clone, Default)]
pub struct MarketState {
    /// Present while a wallet is connected.
    pub session: Option<Session>,
    pub tab: Tab,
    pub selected_file: Option<SelectedFile>,
    pub mint_price: String,
    /// Price inputs on owned, unlisted cards.
    pub list_prices: HashMap<TokenId, String>,
    pub listed: Vec<TokenRecord>,
    pub owned: Vec<TokenRecord>,
    pub listed_ids: ListedIdSet,
    /// Single error slot; the latest failure wins.
    pub error_message: Option<String>,
    /// Single confirmation slot.
    pub status_message: Option<String>,
    generation: u64,
}

impl MarketState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Generation of the most recently issued refresh ticket.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    pub fn select_file(&mut self, file: SelectedFile) {
        self.selected_file = Some(file);
    }

    pub fn set_mint_price(&mut self, input: impl Into<String>) {
        self.mint_price = input.into();
    }

    pub fn set_list_price(&mut self, id: TokenId, input: impl Into<String>) {
        self.list_prices.insert(id, input.into());
    }

    /// Price input currently typed for `id`.
    pub fn list_price(&self, id: TokenId) -> &str {
        self.list_prices.get(&id).map(String::as_str).unwrap_or("")
    }

    /// Looks up a marketplace record.
    pub fn listed_record(&self, id: TokenId) -> Option<&TokenRecord> {
        self.listed.iter().find(|r| r.id == id)
    }

    /// A wallet connection succeeded.
    pub fn session_established(&mut self, session: Session) -> RefreshTicket {
        tracing::info!(address = ?session.address(), "wallet connected");
        self.session = Some(session.clone());
        self.error_message = None;
        self.start(RefreshTrigger::SessionEstablished, session)
    }

    /// The wallet reported a new account list.
    ///
    /// `None` means the wallet logged out: the session and galleries are
    /// cleared and any in-flight refresh is invalidated.
    pub fn account_switched(&mut self, session: Option<Session>) -> Option<RefreshTicket> {
        match session {
            Some(session) => {
                tracing::info!(address = ?session.address(), "wallet account switched");
                self.session = Some(session);
                self.owned.clear();
                self.list_prices.clear();
                self.issue(RefreshTrigger::AccountSwitched)
            }
            None => {
                tracing::info!("wallet logged out");
                self.session = None;
                self.listed.clear();
                self.owned.clear();
                self.listed_ids.clear();
                self.list_prices.clear();
                self.generation += 1;
                None
            }
        }
    }

    /// A mint, listing or purchase completed.
    pub fn listing_changed(&mut self) -> Option<RefreshTicket> {
        self.issue(RefreshTrigger::ListingChanged)
    }

    fn issue(&mut self, trigger: RefreshTrigger) -> Option<RefreshTicket> {
        let session = self.session.clone()?;
        Some(self.start(trigger, session))
    }

    fn start(&mut self, trigger: RefreshTrigger, session: Session) -> RefreshTicket {
        self.generation += 1;
        for record in self.listed.iter_mut().chain(self.owned.iter_mut()) {
            record.price = PriceState::Loading;
        }
        tracing::debug!(generation = self.generation, ?trigger, "refresh issued");
        RefreshTicket {
            generation: self.generation,
            trigger,
            session,
        }
    }

    /// Installs a refresh result.
    ///
    /// Returns `false` and leaves the state untouched when a newer ticket
    /// has been issued since `ticket`.
    pub fn apply_refresh(&mut self, ticket: &RefreshTicket, snapshot: GallerySnapshot) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                stale = ticket.generation,
                current = self.generation,
                "discarding stale gallery snapshot"
            );
            return false;
        }

        if let Some(summary) = snapshot.error_summary() {
            self.error_message = Some(summary);
        }
        self.listed = snapshot.listed;
        self.owned = snapshot.owned;
        self.listed_ids = snapshot.listed_ids;
        let owned = &self.owned;
        self.list_prices
            .retain(|id, _| owned.iter().any(|record| record.id == *id));
        true
    }

    /// Writes a failure into the error slot.
    pub fn report_error(&mut self, error: &MarketError) {
        self.error_message = Some(error.to_string());
        self.status_message = None;
    }

    /// Clears the error slot and shows a confirmation.
    pub fn report_success(&mut self, message: impl Into<String>) {
        self.error_message = None;
        self.status_message = Some(message.into());
    }

    /// Resets the mint form after a successful mint.
    pub fn mint_completed(&mut self) {
        self.selected_file = None;
        self.mint_price.clear();
    }
}

/// Access to a [`MarketState`] that survives across await points.
///
/// Handlers never hold a borrow while awaiting; they read or update through
/// short closures.
pub trait StateHandle: Clone {
    fn with<R>(&self, f: impl FnOnce(&MarketState) -> R) -> R;

    fn update<R>(&mut self, f: impl FnOnce(&mut MarketState) -> R) -> R;
}

/// Thread-safe [`StateHandle`] for headless use.
#[derive(Debug, Clone, Default)]
pub struct SharedState(Arc<Mutex<MarketState>>);

impl SharedState {
    pub fn new(state: MarketState) -> Self {
        Self(Arc::new(Mutex::new(state)))
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> MarketState {
        self.with(MarketState::clone)
    }
}

impl StateHandle for SharedState {
    fn with<R>(&self, f: impl FnOnce(&MarketState) -> R) -> R {
        f(&self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn update<R>(&mut self, f: impl FnOnce(&mut MarketState) -> R) -> R {
        f(&mut self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
