//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Schwab: market data API client (quotes, option chains)
//! - Store: in-memory and JSON-file key-value stores
//! - CLI: Command-line interface handlers

pub mod schwab;
pub mod store;
pub mod cli;

pub use schwab::{SchwabClient, SchwabConfig};
pub use store::{FileStore, MemoryStore};
pub use cli::CliApp;
