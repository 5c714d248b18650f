//! Key-Value Store Port
//!
//! Narrow get/put-with-TTL interface. Expiry is the store's job; callers
//! never delete keys.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::GexError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read store: {0}")]
    ReadError(String),

    #[error("Failed to write store: {0}")]
    WriteError(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<StoreError> for GexError {
    fn from(err: StoreError) -> Self {
        GexError::Store(err.to_string())
    }
}

/// Key-value store with per-key expiry
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Value for a key, `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value that expires after `ttl_seconds`
    async fn put(&self, key: &str, value: String, ttl_seconds: u64) -> Result<(), StoreError>;
}
