// Key-value storage for the expiring cache.
// Defines the external store collaborator and the TTL envelope records it holds.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::Result;

/// Asynchronous string key-value store supplied by the host environment.
///
/// Semantics are last-write-wins with no transactions. Entries are
/// independently keyed per owner/repo/endpoint, so a lost race costs at
/// most one extra upstream fetch. Failures must surface as errors, never
/// be swallowed.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Serialized cache record: the payload plus its absolute expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEntry {
    pub value: serde_json::Value,
    pub expires_at: DateTime<Utc>,
}

impl StoredEntry {
    /// Wrap a value with its expiry timestamp.
    pub fn new<T: Serialize>(value: &T, expires_at: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            value: serde_json::to_value(value)?,
            expires_at,
        })
    }

    /// A read is a hit iff `now` is strictly before the expiry.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Deserialize the payload.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.value.clone())?)
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_freshness() {
        let now = Utc::now();
        let entry = StoredEntry::new(&42u32, now + chrono::Duration::seconds(60)).unwrap();
        assert!(entry.is_fresh(now));
        assert!(!entry.is_fresh(now + chrono::Duration::seconds(61)));

        let expired = StoredEntry::new(&42u32, now - chrono::Duration::seconds(1)).unwrap();
        assert!(!expired.is_fresh(now));
    }

    #[test]
    fn test_entry_roundtrip() {
        let entry = StoredEntry::new(&vec!["a", "b"], Utc::now()).unwrap();
        let json = serde_json::to_string(&entry).unwrap();
        let back: StoredEntry = serde_json::from_str(&json).unwrap();
        let value: Vec<String> = back.decode().unwrap();
        assert_eq!(value, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing").await.unwrap(), None);

        store.set("k", "v1").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v1".to_string()));

        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v2".to_string()));
    }
}
