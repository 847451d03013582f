//! View model: a pure function from [`MarketState`] to what the page shows.

use ethers::utils::to_checksum;

use crate::record::{TokenId, TokenRecord};
use crate::state::{MarketState, Tab};

/// Shown on the marketplace tab when nothing is listed.
pub const EMPTY_MARKETPLACE: &str = "No NFTs listed.";

/// Shown on the owned-assets tab when the account holds nothing.
pub const EMPTY_OWNED: &str = "You don't own any NFTs yet.";

/// The whole page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub header: HeaderView,
    pub tabs: Vec<TabView>,
    pub body: BodyView,
    pub error: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderView {
    /// Shows the connect button.
    Disconnected,
    /// Shows `Connected as <address>`.
    Connected { address: String },
}

impl HeaderView {
    pub fn label(&self) -> String {
        match self {
            HeaderView::Disconnected => "Connect Wallet".to_string(),
            HeaderView::Connected { address } => format!("Connected as {address}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabView {
    pub tab: Tab,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyView {
    Mint(MintView),
    Marketplace(GalleryView),
    MyAssets(GalleryView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintView {
    pub file_name: Option<String>,
    pub price_input: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryView {
    pub cards: Vec<CardView>,
    pub empty_text: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub id: TokenId,
    pub image_uri: String,
    pub title: String,
    pub price_label: String,
    pub action: CardAction,
}

/// Button under a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardAction {
    None,
    Buy,
    /// Price input plus LIST button, for owned tokens that are not listed.
    List { price_input: String },
}

/// Renders the page for `state`.
pub fn render(state: &MarketState) -> PageView {
    let header = match &state.session {
        Some(session) => HeaderView::Connected {
            address: to_checksum(&session.address(), None),
        },
        None => HeaderView::Disconnected,
    };

    let tabs = Tab::ALL
        .iter()
        .map(|&tab| TabView {
            tab,
            label: tab.label(),
            active: tab == state.tab,
        })
        .collect();

    let body = match state.tab {
        Tab::Mint => BodyView::Mint(MintView {
            file_name: state.selected_file.as_ref().map(|f| f.name.clone()),
            price_input: state.mint_price.clone(),
        }),
        Tab::Marketplace => BodyView::Marketplace(GalleryView {
            cards: state
                .listed
                .iter()
                .map(|record| card(record, CardAction::Buy))
                .collect(),
            empty_text: EMPTY_MARKETPLACE,
        }),
        Tab::MyAssets => BodyView::MyAssets(GalleryView {
            cards: state
                .owned
                .iter()
                .map(|record| {
                    let action = if state.listed_ids.contains(&record.id) {
                        CardAction::None
                    } else {
                        CardAction::List {
                            price_input: state.list_price(record.id).to_string(),
                        }
                    };
                    card(record, action)
                })
                .collect(),
            empty_text: EMPTY_OWNED,
        }),
    };

    PageView {
        header,
        tabs,
        body,
        error: state.error_message.clone(),
        status: state.status_message.clone(),
    }
}

fn card(record: &TokenRecord, action: CardAction) -> CardView {
    CardView {
        id: record.id,
        image_uri: record.image_uri.clone(),
        title: record.title(),
        price_label: record.price.label(),
        action,
    }
}
