//! Documentation repository on GitHub.
//!
//! Slugs resolve to `/{org}/{repo}/{branch}/{doc_root}/{slug}` on
//! `raw.githubusercontent.com`. Paths whose extension is not a document
//! format are answered with a redirect to the raw file, without a request.

use std::sync::Arc;

use docrepo_core::{Error, RepoConfig};

use crate::handler::{DispatchError, HandlerTable};
use crate::result::{Redirect, RetrievalResult};
use crate::retrieval::Retriever;
use crate::store::{CacheStore, NullCache, SqliteCache};
use crate::transport::{HttpTransport, TransportConfig};
use crate::uri;

/// Host serving raw repository files.
pub const GITHUB_HOST: &str = "raw.githubusercontent.com";

/// Documents of one repository, retrieved through a cache.
#[derive(Clone)]
pub struct Repository {
    config: RepoConfig,
    retriever: Retriever,
}

impl Repository {
    pub fn new(config: RepoConfig, retriever: Retriever) -> Self {
        Self { config, retriever }
    }

    /// Build the HTTPS transport and cache store described by `config`.
    ///
    /// The SQLite store is used when `cache_db_path` is set, the null store
    /// otherwise.
    pub async fn from_config(config: RepoConfig) -> Result<Self, Error> {
        let transport = HttpTransport::new(GITHUB_HOST, TransportConfig::from(&config))?;

        let cache: Arc<dyn CacheStore> = match &config.cache_db_path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "using sqlite response cache");
                Arc::new(SqliteCache::open(path).await?)
            }
            None => Arc::new(NullCache),
        };

        let retriever = Retriever::new(Arc::new(transport)).with_cache(cache, config.cache_options.clone().into());
        Ok(Self::new(config, retriever))
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Request path for `slug`, with the fallback extension when it has none.
    pub fn uri_for(&self, slug: &str) -> String {
        uri::document_path(
            self.config.org.as_deref().unwrap_or_default(),
            self.config.repo.as_deref().unwrap_or_default(),
            &self.config.branch,
            &self.config.doc_root,
            &uri::ensure_ext(slug, &self.config.fallback_ext),
        )
    }

    /// Retrieve `uri`, or redirect to the raw file when it is not a document.
    pub async fn detect(&self, uri: &str) -> RetrievalResult {
        let ext = uri::extname(uri);
        if self.config.is_doc_format(ext) {
            self.retriever.retrieve(uri).await
        } else {
            tracing::debug!(uri, ext, "not a document format, redirecting to raw file");
            RetrievalResult::Redirect(Redirect::to(uri, format!("https://{GITHUB_HOST}{uri}")))
        }
    }

    /// Resolve `slug`, retrieve it and dispatch the result to `handlers`.
    pub async fn request<T>(&self, slug: &str, handlers: HandlerTable<'_, T>) -> Result<T, DispatchError> {
        let uri = self.uri_for(slug);
        let result = self.detect(&uri).await;
        tracing::debug!(slug, uri = %uri, code = result.code(), "document request");
        handlers.dispatch(result)
    }
}
