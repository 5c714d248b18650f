//! IV History Recorder
//!
//! Appends each profile's summary IVs to a bounded log per (symbol,
//! exchange day) held in the key-value store. Read-modify-write without
//! locking: concurrent writers for the same key are last-writer-wins, and a
//! lost sample is acceptable for this telemetry.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::domain::{
    exchange_day, history_key, GexProfile, IvHistoryLog, IvHistoryRecord, DEFAULT_HISTORY_CAP,
    DEFAULT_HISTORY_TTL_SECS,
};
use crate::ports::{KeyValueStore, StoreError};

/// Recorder settings
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySettings {
    /// Records kept per (symbol, day)
    pub cap: usize,
    /// Store expiry for a day's log
    pub ttl_seconds: u64,
    /// Time zone that defines the exchange calendar day
    pub timezone: Tz,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            cap: DEFAULT_HISTORY_CAP,
            ttl_seconds: DEFAULT_HISTORY_TTL_SECS,
            timezone: chrono_tz::America::New_York,
        }
    }
}

/// Day-scoped IV history on top of a key-value store
#[derive(Debug, Clone)]
pub struct HistoryRecorder<S> {
    store: S,
    settings: HistorySettings,
}

impl<S: KeyValueStore> HistoryRecorder<S> {
    pub fn new(store: S, settings: HistorySettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &HistorySettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Store key for `symbol` on the exchange day containing `now`
    pub fn key_for(&self, symbol: &str, now: DateTime<Utc>) -> String {
        history_key(symbol, exchange_day(now, self.settings.timezone))
    }

    /// Append the profile's ATM / wall IVs and return the trimmed log
    pub async fn record(
        &self,
        symbol: &str,
        profile: &GexProfile,
        now: DateTime<Utc>,
    ) -> Result<IvHistoryLog, StoreError> {
        let key = self.key_for(symbol, now);
        let mut log = self.load(&key).await?;
        log.push(IvHistoryRecord::from_profile(profile, now, self.settings.timezone));

        let value = serde_json::to_string(log.records())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store.put(&key, value, self.settings.ttl_seconds).await?;

        tracing::debug!("IV history {}: {} records", key, log.len());
        Ok(log)
    }

    /// Records for `symbol` on the exchange day containing `now`, oldest first
    pub async fn read(
        &self,
        symbol: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<IvHistoryRecord>, StoreError> {
        let key = self.key_for(symbol, now);
        Ok(self.load(&key).await?.into_records())
    }

    async fn load(&self, key: &str) -> Result<IvHistoryLog, StoreError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(IvHistoryLog::new(self.settings.cap));
        };

        match serde_json::from_str::<Vec<IvHistoryRecord>>(&raw) {
            Ok(records) => Ok(IvHistoryLog::from_records(records, self.settings.cap)),
            Err(e) => {
                tracing::warn!("Discarding unreadable IV history at {}: {}", key, e);
                Ok(IvHistoryLog::new(self.settings.cap))
            }
        }
    }
}
