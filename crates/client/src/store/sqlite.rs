//! Persistent store on top of the SQLite response table.

use std::path::Path;

use docrepo_core::{CacheDb, CachedResponse, Error};

use super::{CacheOptions, CacheStore, Producer};
use crate::result::GatewayError;

/// Store that persists snapshots in SQLite.
///
/// Database failures are logged and treated as a miss (on read) or a skipped
/// write, so retrieval keeps working with a broken cache file.
#[derive(Debug, Clone)]
pub struct SqliteCache {
    db: CacheDb,
}

impl SqliteCache {
    /// Open (or create) the cache database at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(Self { db: CacheDb::open(path).await? })
    }

    /// Wrap an already opened database.
    pub fn with_db(db: CacheDb) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    async fn store(&self, key: &str, response: &CachedResponse) {
        if let Err(e) = self.db.put_response(key, response).await {
            tracing::warn!(key, error = %e, "failed to persist cached response");
        }
    }
}

#[async_trait::async_trait]
impl CacheStore for SqliteCache {
    async fn fetch<'a>(
        &self, key: &str, _options: &CacheOptions, producer: Producer<'a>,
    ) -> Result<CachedResponse, GatewayError> {
        match self.db.get_response(key).await {
            Ok(Some(hit)) => return Ok(hit),
            Ok(None) => {}
            Err(e) => tracing::warn!(key, error = %e, "failed to read cached response; treating as miss"),
        }

        let response = producer.await?;
        self.store(key, &response).await;
        Ok(response)
    }

    async fn write(&self, key: &str, response: &CachedResponse, _options: &CacheOptions) {
        self.store(key, response).await;
    }
}
