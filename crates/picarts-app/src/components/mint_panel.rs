use dioxus::prelude::*;
use dioxus::dioxus_core::spawn_forever;
use picarts_market::{MarketAction, MarketState, MintView};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg"];

#[component]
pub fn MintPanel(view: MintView, state: Signal<MarketState>) -> Element {
    let actions = use_coroutine_handle::<MarketAction>();
    let file_label = view
        .file_name
        .clone()
        .unwrap_or_else(|| "No file selected".to_string());

    rsx! {
        section {
            class: "mint-panel",
            div { class: "section-title", "Mint a new NFT" }

            div {
                class: "field",
                button {
                    class: "button-secondary",
                    onclick: move |_| {
                        // The dialog may still be open when the panel unmounts.
                        spawn_forever(async move {
                            let file = rfd::AsyncFileDialog::new()
                                .set_title("Choose an image")
                                .add_filter("Images", IMAGE_EXTENSIONS)
                                .pick_file()
                                .await;
                            let Some(file) = file else { return; };
                            actions.send(MarketAction::LoadFile(file.path().to_path_buf()));
                        });
                    },
                    "Choose File"
                }
                span { class: "file-name", "{file_label}" }
            }

            div {
                class: "field",
                label { r#for: "mint-price", "Price (ETH)" }
                input {
                    id: "mint-price",
                    r#type: "text",
                    placeholder: "0.05",
                    value: "{view.price_input}",
                    oninput: move |evt| state.write().set_mint_price(evt.value()),
                }
            }

            button {
                class: "button-primary",
                onclick: move |_| actions.send(MarketAction::Mint),
                "Mint NFT"
            }
        }
    }
}
