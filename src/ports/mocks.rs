use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use async_trait::async_trait;

use super::kv_store::{KeyValueStore, StoreError};
use super::market_data::{MarketDataError, MarketDataPort, Quote, RawOptionChain};

fn locked<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock market data port that records calls and allows controlled responses
#[derive(Debug, Default, Clone)]
pub struct MockMarketData {
    calls: Arc<Mutex<Vec<String>>>,
    quotes: Arc<Mutex<HashMap<String, Quote>>>,
    chains: Arc<Mutex<HashMap<String, RawOptionChain>>>,
    failing: bool,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set a quote for a given symbol
    pub fn with_quote(self, symbol: &str, last_price: f64) -> Self {
        locked(&self.quotes).insert(
            symbol.to_string(),
            Quote {
                symbol: symbol.to_string(),
                last_price: Some(last_price),
                mark: None,
                close_price: None,
            },
        );
        self
    }

    /// Builder method to set a full quote
    pub fn with_full_quote(self, quote: Quote) -> Self {
        locked(&self.quotes).insert(quote.symbol.clone(), quote);
        self
    }

    /// Builder method to set a chain for a given symbol
    pub fn with_chain(self, symbol: &str, chain: RawOptionChain) -> Self {
        locked(&self.chains).insert(symbol.to_string(), chain);
        self
    }

    /// Every lookup fails with a provider error
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Get all recorded calls as "quote:SYM" / "chain:SYM"
    pub fn get_calls(&self) -> Vec<String> {
        locked(&self.calls).clone()
    }
}

#[async_trait]
impl MarketDataPort for MockMarketData {
    async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        locked(&self.calls).push(format!("quote:{}", symbol));
        if self.failing {
            return Err(MarketDataError::Status { status: 503, body: "unavailable".into() });
        }
        locked(&self.quotes)
            .get(symbol)
            .cloned()
            .ok_or_else(|| MarketDataError::NotFound(symbol.to_string()))
    }

    async fn get_option_chain(&self, symbol: &str) -> Result<RawOptionChain, MarketDataError> {
        locked(&self.calls).push(format!("chain:{}", symbol));
        if self.failing {
            return Err(MarketDataError::Status { status: 503, body: "unavailable".into() });
        }
        locked(&self.chains)
            .get(symbol)
            .cloned()
            .ok_or_else(|| MarketDataError::NotFound(symbol.to_string()))
    }
}

/// Mock key-value store that records writes and ignores TTLs
#[derive(Debug, Default, Clone)]
pub struct MockStore {
    values: Arc<Mutex<HashMap<String, String>>>,
    puts: Arc<Mutex<Vec<(String, u64)>>>,
    failing: bool,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to seed a value
    pub fn with_value(self, key: &str, value: &str) -> Self {
        locked(&self.values).insert(key.to_string(), value.to_string());
        self
    }

    /// Every read and write fails
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Recorded (key, ttl) pairs
    pub fn get_puts(&self) -> Vec<(String, u64)> {
        locked(&self.puts).clone()
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        locked(&self.values).get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for MockStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.failing {
            return Err(StoreError::ReadError("store offline".into()));
        }
        Ok(locked(&self.values).get(key).cloned())
    }

    async fn put(&self, key: &str, value: String, ttl_seconds: u64) -> Result<(), StoreError> {
        if self.failing {
            return Err(StoreError::WriteError("store offline".into()));
        }
        locked(&self.puts).push((key.to_string(), ttl_seconds));
        locked(&self.values).insert(key.to_string(), value);
        Ok(())
    }
}
