//! Subcommand implementations.

pub mod config;
pub mod download;
pub mod generate;
pub mod list;
