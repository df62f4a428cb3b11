// TTL cache over the external key-value store.
// A miss runs the producer once per key at a time and overwrites the stored entry.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::store::{KeyValueStore, StoredEntry};
use crate::error::Result;

/// TTL cache in front of the key-value collaborator.
///
/// Concurrent misses for one key coalesce into a single producer call: the
/// first caller holds the key's gate while it fetches and stores, and the
/// others then re-read the freshly stored entry instead of fetching again.
pub struct ExpiringCache {
    store: Arc<dyn KeyValueStore>,
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ExpiringCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key` if fresh, otherwise run `producer`,
    /// store its result with expiry `now + ttl`, and return it.
    ///
    /// Expired entries are overwritten in place, never deleted. Store
    /// failures propagate; an unreadable stored entry counts as a miss.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let gate = self.entry_gate(key).await;
        let _guard = gate.lock().await;

        if let Some(value) = self.read_fresh(key).await? {
            return Ok(value);
        }

        let value = producer().await?;
        let entry = StoredEntry::new(&value, Utc::now() + ttl)?;
        self.store.set(key, &serde_json::to_string(&entry)?).await?;
        debug!(key, ttl_secs = ttl.as_secs(), "cache entry refreshed");
        Ok(value)
    }

    async fn entry_gate(&self, key: &str) -> Arc<Mutex<()>> {
        let mut inflight = self.inflight.lock().await;
        Arc::clone(
            inflight
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    async fn read_fresh<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        let Ok(entry) = serde_json::from_str::<StoredEntry>(&raw) else {
            debug!(key, "discarding unreadable cache entry");
            return Ok(None);
        };
        if !entry.is_fresh(Utc::now()) {
            debug!(key, "cache entry expired");
            return Ok(None);
        }
        match entry.decode() {
            Ok(value) => {
                debug!(key, "cache hit");
                Ok(Some(value))
            }
            Err(_) => Ok(None),
        }
    }
}
