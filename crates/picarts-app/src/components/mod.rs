mod gallery;
mod header;
mod mint_panel;
mod status_line;
mod tabs;

pub use gallery::{Gallery, NftCard};
pub use header::Header;
pub use mint_panel::MintPanel;
pub use status_line::StatusLine;
pub use tabs::TabBar;
