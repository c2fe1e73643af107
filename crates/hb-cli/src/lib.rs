//! Baby-care log analyzer CLI library.
//!
//! This crate provides the CLI interface over `hb-core`.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, DomainArg};
pub use config::Config;
