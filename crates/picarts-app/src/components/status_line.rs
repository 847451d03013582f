use dioxus::prelude::*;

/// Error and confirmation slots under the tab body.
#[component]
pub fn StatusLine(error: Option<String>, status: Option<String>) -> Element {
    rsx! {
        div {
            class: "status-line",
            if let Some(error) = error {
                p { class: "error-message", "{error}" }
            }
            if let Some(status) = status {
                p { class: "status-message", "{status}" }
            }
        }
    }
}
