//! GEX Engine - Options Gamma Exposure Analytics Library
//!
//! Turns a raw option chain and a spot price into a per-strike dealer gamma
//! exposure profile, derives summary features from it, and keeps a bounded
//! intraday IV history per symbol.
//!
//! # Modules
//!
//! - `domain`: Core types (normalized chain, GexProfile, IV history log, errors)
//! - `analytics`: Pure pipeline (normalizer, curve builder, feature extractor)
//! - `ports`: Trait abstractions (MarketDataPort, KeyValueStore)
//! - `adapters`: External implementations (Schwab client, stores, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: GexService and the IV history recorder

pub mod domain;
pub mod analytics;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;

pub use analytics::{analyze, EngineParams};
pub use application::{GexService, HistoryRecorder, HistorySettings};
pub use domain::{GexError, GexProfile, GexResult, IvHistory, PutGammaPolicy};
