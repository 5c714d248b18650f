//! Market Data Provider Port
//!
//! Quote and option-chain lookup. The chain is returned in the provider's
//! own shape; `analytics::normalizer` is the only consumer that reads it.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::GexError;

/// Market data error type
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Rate limited after {0} attempts")]
    RateLimited(u32),

    #[error("Data parsing error: {0}")]
    ParseError(String),

    #[error("No data for symbol: {0}")]
    NotFound(String),
}

impl From<MarketDataError> for GexError {
    fn from(err: MarketDataError) -> Self {
        GexError::UpstreamFailure(err.to_string())
    }
}

/// Underlying quote snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub last_price: Option<f64>,
    pub mark: Option<f64>,
    pub close_price: Option<f64>,
}

impl Quote {
    /// First positive of last, mark, close
    pub fn spot(&self) -> Option<f64> {
        [self.last_price, self.mark, self.close_price]
            .into_iter()
            .flatten()
            .find(|p| p.is_finite() && *p > 0.0)
    }
}

/// Strike-price string → contract(s)
pub type StrikeMap = HashMap<String, ContractEntry>;

/// Composite expiration key (`YYYY-MM-DD:<dte>`) → strikes
pub type ExpDateMap = HashMap<String, StrikeMap>;

/// Option chain as delivered by the provider
///
/// Header fields the engine only reports are parsed leniently: a wrong
/// type reads as absent instead of rejecting the chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOptionChain {
    #[serde(default, deserialize_with = "lenient")]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub underlying_price: Option<f64>,
    #[serde(default)]
    pub call_exp_date_map: Option<ExpDateMap>,
    #[serde(default)]
    pub put_exp_date_map: Option<ExpDateMap>,
}

/// A strike holds either one contract or a list of them; anything else
/// (null, scalars) is kept as `Malformed` and contributes nothing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContractEntry {
    Many(Vec<ContractSlot>),
    One(RawContract),
    Malformed(Value),
}

/// One element of a contract list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContractSlot {
    Contract(RawContract),
    Malformed(Value),
}

impl ContractEntry {
    /// First listed contract at the strike; extra contracts are ignored.
    /// `None` when the entry is empty or its first element is not a contract.
    pub fn primary(&self) -> Option<&RawContract> {
        match self {
            ContractEntry::One(contract) => Some(contract),
            ContractEntry::Many(slots) => match slots.first()? {
                ContractSlot::Contract(contract) => Some(contract),
                ContractSlot::Malformed(_) => None,
            },
            ContractEntry::Malformed(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ContractEntry::One(_) => 1,
            ContractEntry::Many(slots) => slots.len(),
            ContractEntry::Malformed(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Provider contract; numeric fields are kept as raw JSON so that
/// strings, nulls and "NaN" can be defaulted instead of failing the parse
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContract {
    #[serde(default, deserialize_with = "lenient")]
    pub symbol: Option<String>,
    #[serde(default)]
    pub gamma: Option<Value>,
    #[serde(default)]
    pub open_interest: Option<Value>,
    #[serde(default)]
    pub total_volume: Option<Value>,
    #[serde(default)]
    pub volatility: Option<Value>,
}

/// Typed optional field that reads as `None` when the JSON has the wrong shape
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Market data provider
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Quote for the underlying
    async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError>;

    /// Full option chain for the underlying
    async fn get_option_chain(&self, symbol: &str) -> Result<RawOptionChain, MarketDataError>;
}
