use dioxus::prelude::*;
use picarts_market::{MarketState, TabView};

#[component]
pub fn TabBar(tabs: Vec<TabView>, state: Signal<MarketState>) -> Element {
    rsx! {
        nav {
            class: "tab-bar",
            for view in tabs {
                button {
                    key: "{view.label}",
                    class: if view.active { "tab active" } else { "tab" },
                    onclick: move |_| state.write().select_tab(view.tab),
                    "{view.label}"
                }
            }
        }
    }
}
