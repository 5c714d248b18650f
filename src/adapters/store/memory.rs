//! In-Memory Store
//!
//! Process-local TTL key-value store. Expired entries are invisible to
//! reads and swept when the store reaches capacity; if it is still full
//! after the sweep, the oldest entry is evicted.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::ports::{KeyValueStore, StoreError};

/// Stored value with TTL tracking
#[derive(Debug, Clone)]
pub struct StoreEntry {
    pub value: String,
    pub inserted_at: Instant,
    pub ttl: Duration,
}

impl StoreEntry {
    pub fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
            ttl,
        }
    }

    /// Check if entry is still valid
    pub fn is_valid(&self) -> bool {
        self.inserted_at.elapsed() < self.ttl
    }
}

#[derive(Debug)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoreEntry>>,
    max_entries: usize,
}

impl MemoryStore {
    /// Default max entries before cleanup
    pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Remove expired entries
    pub async fn cleanup(&self) {
        self.entries.write().await.retain(|_, entry| entry.is_valid());
    }

    /// Number of entries (including expired)
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .filter(|entry| entry.is_valid())
            .map(|entry| entry.value.clone()))
    }

    async fn put(&self, key: &str, value: String, ttl_seconds: u64) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;

        if !entries.contains_key(key) && entries.len() >= self.max_entries {
            entries.retain(|_, entry| entry.is_valid());

            if entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.inserted_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    tracing::debug!("Memory store full; evicting {}", oldest);
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key.to_string(),
            StoreEntry::new(value, Duration::from_secs(ttl_seconds)),
        );
        Ok(())
    }
}
