//! The default store: no storage at all.

use docrepo_core::CachedResponse;

use super::{CacheOptions, CacheStore, Producer};
use crate::result::GatewayError;

/// A store that never holds anything.
///
/// `fetch` always runs the producer and `write` discards its input.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

#[async_trait::async_trait]
impl CacheStore for NullCache {
    async fn fetch<'a>(
        &self, _key: &str, _options: &CacheOptions, producer: Producer<'a>,
    ) -> Result<CachedResponse, GatewayError> {
        producer.await
    }

    async fn write(&self, _key: &str, _response: &CachedResponse, _options: &CacheOptions) {}
}
