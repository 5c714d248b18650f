//! JSON File Store
//!
//! Durable TTL key-value store backed by a single JSON document, so the
//! CLI keeps intraday history across invocations. Expired entries are
//! pruned on every write.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::ports::{KeyValueStore, StoreError};

/// Default store file name
pub const DEFAULT_STORE_FILE: &str = "gex_store.json";

/// Longest TTL honoured (ten years)
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl FileEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write of the document within this process
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store file inside a data directory
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(DEFAULT_STORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, FileEntry>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(StoreError::ReadError(e.to_string())),
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).or_else(|e| {
            tracing::warn!("Store file {} is corrupted, starting empty: {}", self.path.display(), e);
            Ok(BTreeMap::new())
        })
    }

    async fn save(&self, entries: &BTreeMap<String, FileEntry>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::WriteError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        // Write then rename so a crash never leaves a truncated document
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| StoreError::WriteError(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::WriteError(e.to_string()))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Utc::now();
        Ok(self
            .load()
            .await?
            .remove(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value))
    }

    async fn put(&self, key: &str, value: String, ttl_seconds: u64) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let now = Utc::now();

        let mut entries = self.load().await?;
        entries.retain(|_, entry| entry.is_live(now));

        let ttl = Duration::seconds(ttl_seconds.min(MAX_TTL_SECS) as i64);
        entries.insert(
            key.to_string(),
            FileEntry {
                value,
                expires_at: now + ttl,
            },
        );

        self.save(&entries).await?;
        tracing::debug!("Store write {} -> {}", key, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::in_dir(dir.path());
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_persists_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        FileStore::new(&path).put("k", "v".to_string(), 3600).await.unwrap();
        assert!(path.exists());

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_expired_entries_are_hidden_and_pruned() {
        let dir = tempdir().unwrap();
        let store = FileStore::in_dir(dir.path());

        store.put("old", "x".to_string(), 0).await.unwrap();
        assert_eq!(store.get("old").await.unwrap(), None);

        store.put("new", "y".to_string(), 60).await.unwrap();
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(!raw.contains("\"old\""));
        assert!(raw.contains("\"new\""));
    }

    #[tokio::test]
    async fn test_corrupted_file_starts_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::in_dir(dir.path());
        std::fs::write(store.path(), "{{{ not json").unwrap();

        assert_eq!(store.get("k").await.unwrap(), None);
        store.put("k", "v".to_string(), 60).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
    }
}
