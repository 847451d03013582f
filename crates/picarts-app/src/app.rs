use dioxus::prelude::*;
use picarts_market::{handlers, render, BodyView, MarketAction, MarketServices, MarketState};

use crate::components::*;
use crate::theme::ThemedRoot;
use crate::ui_state::UiState;

/// Root application component.
///
/// Expects [`MarketServices`] in the root context. Owns the action loop
/// that every child component sends [`MarketAction`]s to.
#[component]
pub fn App() -> Element {
    let services = use_context::<MarketServices>();
    let state = use_signal(MarketState::new);

    // Action loop on the root scope; flows outlive the tab that started them.
    let action_services = services.clone();
    use_coroutine(move |actions: UnboundedReceiver<MarketAction>| {
        let services = action_services.clone();
        async move {
            handlers::run_actions(&services, UiState::new(state), actions).await;
        }
    });

    // Account listener, cancelled with the component.
    use_hook(move || {
        spawn(async move {
            handlers::watch_accounts(&services, UiState::new(state)).await;
        });
    });

    use_drop(|| tracing::info!("Closing PicArts"));

    let page = render(&state.read());

    rsx! {
        ThemedRoot {
            div {
                class: "market-app",
                Header { header: page.header }
                TabBar { tabs: page.tabs, state }

                main {
                    class: "tab-body",
                    match page.body {
                        BodyView::Mint(view) => rsx! {
                            MintPanel { view, state }
                        },
                        BodyView::Marketplace(view) => rsx! {
                            Gallery { view, state }
                        },
                        BodyView::MyAssets(view) => rsx! {
                            Gallery { view, state }
                        },
                    }
                }

                StatusLine { error: page.error, status: page.status }
            }
        }
    }
}
