//! Bridges the market handlers to a Dioxus signal.

use dioxus::prelude::*;
use picarts_market::{MarketState, StateHandle};

/// [`StateHandle`] over the app's state signal.
///
/// Handlers run on the root action loop and update the signal between
/// awaits, so every write re-renders the page.
#[derive(Clone, Copy, PartialEq)]
pub struct UiState(Signal<MarketState>);

impl UiState {
    pub fn new(signal: Signal<MarketState>) -> Self {
        Self(signal)
    }
}

impl StateHandle for UiState {
    fn with<R>(&self, f: impl FnOnce(&MarketState) -> R) -> R {
        f(&self.0.read())
    }

    fn update<R>(&mut self, f: impl FnOnce(&mut MarketState) -> R) -> R {
        f(&mut self.0.write())
    }
}
