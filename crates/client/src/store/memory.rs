//! In-memory store backed by a map.

use std::collections::HashMap;
use std::sync::Arc;

use docrepo_core::CachedResponse;
use tokio::sync::RwLock;

use super::{CacheOptions, CacheStore, Producer};
use crate::result::GatewayError;

#[derive(Debug, Default)]
struct Entries {
    responses: HashMap<String, CachedResponse>,
    options: HashMap<String, CacheOptions>,
}

/// Map-backed store for tests and short-lived processes.
///
/// Clones share the same entries. The options most recently passed for each
/// key are kept so callers can check what the engine forwarded.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<Entries>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The response stored under `key`, if any.
    pub async fn get(&self, key: &str) -> Option<CachedResponse> {
        self.entries.read().await.responses.get(key).cloned()
    }

    /// The options last passed alongside `key`.
    pub async fn options_for(&self, key: &str) -> Option<CacheOptions> {
        self.entries.read().await.options.get(key).cloned()
    }

    /// Stored keys in sorted order.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().await.responses.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.responses.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.responses.clear();
        entries.options.clear();
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryCache {
    async fn fetch<'a>(
        &self, key: &str, options: &CacheOptions, producer: Producer<'a>,
    ) -> Result<CachedResponse, GatewayError> {
        {
            let mut entries = self.entries.write().await;
            entries.options.insert(key.to_string(), options.clone());
            if let Some(hit) = entries.responses.get(key) {
                return Ok(hit.clone());
            }
        }

        // the lock is not held across the producer; racing misses both run
        let response = producer.await?;
        self.entries
            .write()
            .await
            .responses
            .insert(key.to_string(), response.clone());
        Ok(response)
    }

    async fn write(&self, key: &str, response: &CachedResponse, options: &CacheOptions) {
        let mut entries = self.entries.write().await;
        entries.options.insert(key.to_string(), options.clone());
        entries.responses.insert(key.to_string(), response.clone());
    }
}
