//! Pluggable cache stores.
//!
//! A store exposes two operations: a read-through `fetch` that runs a
//! producer only on a miss, and an unconditional `write`. `NullCache` is the
//! default and stores nothing, which keeps caching strictly opt-in.
//!
//! Stores are total: a backing-store failure is logged and degrades to
//! pass-through behavior, it never surfaces to the retrieval engine.
//! Stores make no promise of atomicity across a fetch followed by a write,
//! so concurrent retrievals of one key each run their own cycle and the last
//! write wins.

pub mod memory;
pub mod null;
pub mod sqlite;

pub use memory::MemoryCache;
pub use null::NullCache;
pub use sqlite::SqliteCache;

use std::collections::BTreeMap;

use docrepo_core::CachedResponse;
use futures_util::future::BoxFuture;

use crate::result::GatewayError;

/// Lazily evaluated source of a fresh response.
///
/// Nothing runs until a store awaits it, so a store awaits it at most once
/// and only on a miss. A failed producer is handed back to the caller and
/// never stored.
pub type Producer<'a> = BoxFuture<'a, Result<CachedResponse, GatewayError>>;

/// Opaque options passed unchanged to the store on every call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheOptions(BTreeMap<String, String>);

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, String>> for CacheOptions {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

/// Key/value store for response snapshots.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Return the response stored under `key`, or await `producer`, store its
    /// response under `key` and return it.
    async fn fetch<'a>(
        &self, key: &str, options: &CacheOptions, producer: Producer<'a>,
    ) -> Result<CachedResponse, GatewayError>;

    /// Replace whatever is stored under `key`.
    async fn write(&self, key: &str, response: &CachedResponse, options: &CacheOptions);
}
