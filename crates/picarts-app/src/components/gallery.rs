use dioxus::prelude::*;
use picarts_market::{CardAction, CardView, GalleryView, MarketAction, MarketState};

/// Card grid for the marketplace and owned-asset tabs.
#[component]
pub fn Gallery(view: GalleryView, state: Signal<MarketState>) -> Element {
    if view.cards.is_empty() {
        return rsx! {
            p { class: "empty-gallery", "{view.empty_text}" }
        };
    }

    rsx! {
        div {
            class: "nft-grid",
            for card in view.cards {
                NftCard { key: "{card.id}", card, state }
            }
        }
    }
}

#[component]
pub fn NftCard(card: CardView, state: Signal<MarketState>) -> Element {
    let actions = use_coroutine_handle::<MarketAction>();
    let id = card.id;
    let action = card.action.clone();

    rsx! {
        div {
            class: "nft-card",
            img { class: "nft-image", src: "{card.image_uri}", alt: "{card.title}" }

            div {
                class: "nft-body",
                div { class: "nft-title", "{card.title}" }
                div { class: "nft-price", "{card.price_label}" }

                match action {
                    CardAction::None => rsx! {},
                    CardAction::Buy => rsx! {
                        button {
                            class: "button-primary",
                            onclick: move |_| actions.send(MarketAction::Buy(id)),
                            "BUY"
                        }
                    },
                    CardAction::List { price_input } => rsx! {
                        div {
                            class: "list-form",
                            input {
                                r#type: "text",
                                placeholder: "Price in ETH",
                                value: "{price_input}",
                                oninput: move |evt| state.write().set_list_price(id, evt.value()),
                            }
                            button {
                                class: "button-secondary",
                                onclick: move |_| actions.send(MarketAction::List(id)),
                                "LIST"
                            }
                        }
                    },
                }
            }
        }
    }
}
