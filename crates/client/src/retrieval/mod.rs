//! Conditional-cache retrieval engine.
//!
//! ### Retrieval
//! 1. Look the response up under `host:uri`, fetching it on a miss.
//! 2. If it has expired, revalidate with a conditional GET and write the
//!    outcome back: a `304` keeps the cached body and takes the new headers,
//!    anything else replaces the entry.
//! 3. Classify the final response.
//!
//! Paths are taken relative to the host root; a missing leading `/` is
//! supplied before the key is built.
//!
//! `retrieve` is total. Transport failures come back as
//! `RetrievalResult::Gateway` and a failed revalidation leaves the cache as it
//! was.

pub mod freshness;

use std::sync::Arc;

use chrono::Utc;
use docrepo_core::{CachedResponse, cache_key};
use reqwest::header::HeaderMap;

pub use freshness::{is_expired, revalidation_headers};

use crate::result::{GatewayError, RetrievalResult};
use crate::store::{CacheOptions, CacheStore, NullCache, Producer};
use crate::transport::Transport;
use crate::uri::absolute_path;

const NOT_MODIFIED: u16 = 304;

/// Retrieves paths from one host through a cache store.
#[derive(Clone)]
pub struct Retriever {
    host: String,
    transport: Arc<dyn Transport>,
    cache: Arc<dyn CacheStore>,
    cache_options: CacheOptions,
}

impl Retriever {
    /// Engine over `transport` with the null store.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            host: transport.host().to_string(),
            transport,
            cache: Arc::new(NullCache),
            cache_options: CacheOptions::new(),
        }
    }

    /// Use `cache` for every retrieval, passing `options` on each call.
    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>, options: CacheOptions) -> Self {
        self.cache = cache;
        self.cache_options = options;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn cache_options(&self) -> &CacheOptions {
        &self.cache_options
    }

    /// Key the response for `uri` is stored under.
    pub fn cache_key(&self, uri: &str) -> String {
        cache_key(&self.host, &absolute_path(uri))
    }

    /// Retrieve `uri` and classify the outcome.
    pub async fn retrieve(&self, uri: &str) -> RetrievalResult {
        let uri = absolute_path(uri);
        let uri = uri.as_ref();
        match self.resolve(uri).await {
            Ok(response) => RetrievalResult::from_response(uri, response),
            Err(err) => {
                tracing::debug!(uri, code = err.code(), cause = %err.details(), "retrieval failed");
                RetrievalResult::Gateway(err)
            }
        }
    }

    async fn resolve(&self, uri: &str) -> Result<CachedResponse, GatewayError> {
        let key = self.cache_key(uri);

        let producer: Producer<'_> = Box::pin(async move {
            tracing::debug!(host = %self.host, uri, "cache miss");
            self.transport.perform(uri, HeaderMap::new()).await
        });
        let response = self.cache.fetch(&key, &self.cache_options, producer).await?;

        if !is_expired(&response, Utc::now()) {
            return Ok(response);
        }

        let refreshed = self.refresh(uri, response).await?;
        self.cache.write(&key, &refreshed, &self.cache_options).await;
        Ok(refreshed)
    }

    /// Conditional GET for an expired entry.
    async fn refresh(&self, uri: &str, cached: CachedResponse) -> Result<CachedResponse, GatewayError> {
        let headers = revalidation_headers(&cached);
        let fresh = self.transport.perform(uri, headers).await?;

        if fresh.status == NOT_MODIFIED {
            tracing::debug!(uri, "not modified, keeping cached body");
            Ok(cached.merged_with(&fresh))
        } else {
            tracing::debug!(uri, status = fresh.status, "entry replaced on revalidation");
            Ok(fresh)
        }
    }
}
