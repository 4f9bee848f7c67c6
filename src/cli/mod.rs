//! CLI module for piesplit

pub mod app;
pub mod commands;
pub mod intent;

pub use app::{export_stored, history_lines, PieSplitApp, DEFAULT_EXPORT_FILE};
pub use commands::{Cli, Commands};
pub use intent::Intent;
