use dioxus::prelude::*;
use picarts_market::{HeaderView, MarketAction};

use crate::theme::CURRENT_THEME;

#[component]
pub fn Header(header: HeaderView) -> Element {
    let actions = use_coroutine_handle::<MarketAction>();
    let theme = *CURRENT_THEME.read();
    let label = header.label();

    rsx! {
        header {
            class: "market-header",
            div { class: "market-title", "PicArts" }

            div {
                class: "header-actions",
                button {
                    class: "button-ghost",
                    onclick: move |_| {
                        *CURRENT_THEME.write() = theme.toggled();
                    },
                    "{theme.toggle_label()}"
                }

                match header {
                    HeaderView::Disconnected => rsx! {
                        button {
                            class: "button-primary",
                            onclick: move |_| actions.send(MarketAction::Connect),
                            "{label}"
                        }
                    },
                    HeaderView::Connected { .. } => rsx! {
                        span { class: "connected-as", "{label}" }
                    },
                }
            }
        }
    }
}
