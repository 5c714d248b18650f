//! Ports Layer - Trait definitions for external collaborators
//!
//! The engine talks to the outside world through two narrow interfaces:
//! - Market data provider (underlying quote, option chain)
//! - Key-value store (get / put with TTL) for the IV history log
//!
//! `mocks` provides recording test doubles for both.

pub mod market_data;
pub mod kv_store;
pub mod mocks;

pub use market_data::{
    ContractEntry, ContractSlot, ExpDateMap, MarketDataError, MarketDataPort, Quote, RawContract,
    RawOptionChain, StrikeMap,
};
pub use kv_store::{KeyValueStore, StoreError};
