//! Light and dark gallery themes.

use dioxus::prelude::*;

/// Available themes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
    /// White walls, dark frames.
    #[default]
    Gallery,
    /// Dimmed room for viewing artwork.
    Night,
}

impl Theme {
    /// Returns the `data-theme` attribute value for this theme.
    pub fn css_value(&self) -> &'static str {
        match self {
            Theme::Gallery => "gallery",
            Theme::Night => "night",
        }
    }

    /// Label of the toggle button, naming the theme it switches to.
    pub fn toggle_label(&self) -> &'static str {
        match self {
            Theme::Gallery => "Night",
            Theme::Night => "Gallery",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Gallery => Theme::Night,
            Theme::Night => Theme::Gallery,
        }
    }
}

/// Global signal for the current theme.
pub static CURRENT_THEME: GlobalSignal<Theme> = GlobalSignal::new(Theme::default);

/// Root component that applies the current theme.
#[component]
pub fn ThemedRoot(children: Element) -> Element {
    let theme = *CURRENT_THEME.read();
    rsx! {
        div {
            class: "themed-root",
            "data-theme": "{theme.css_value()}",
            {children}
        }
    }
}
