//! PicArts desktop client.
//!
//! A Dioxus desktop shell over `picarts-market`: components render the
//! market view model and forward clicks to the market handlers.

pub mod app;
pub mod components;
pub mod theme;
pub mod ui_state;
