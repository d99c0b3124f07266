//! TUI widgets for query-console.

pub mod banner;
pub mod confirm;
pub mod editor;
pub mod header;
pub mod prompt;
pub mod results;
pub mod spinner;
pub mod toast;
