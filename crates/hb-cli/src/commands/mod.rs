//! CLI subcommand implementations.

pub mod diaper;
pub mod export;
pub mod feed;
pub mod types;
pub mod util;
