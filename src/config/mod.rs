//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    Config, ConfigError, EngineSection, HistorySection, ProviderSection, StoreSection,
    load_config, MAX_HISTORY_CAP,
};
