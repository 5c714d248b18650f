//! Schwab Adapter
//!
//! Implementation of the MarketDataPort against the Schwab market data API.
//! Chains arrive in the `callExpDateMap` / `putExpDateMap` shape consumed by
//! `analytics::normalizer`.

mod client;
mod quote;

pub use client::{SchwabClient, SchwabConfig};
pub use quote::parse_quote;
