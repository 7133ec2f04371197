//! Client code for docrepo.
//!
//! This crate provides the conditional-cache retrieval engine, the HTTPS
//! transport, pluggable cache stores, result dispatch and the repository
//! facade used by the CLI.

pub mod handler;
pub mod render;
pub mod repository;
pub mod result;
pub mod retrieval;
pub mod store;
pub mod transport;
pub mod uri;

#[cfg(test)]
mod test_support;

pub use handler::{Action, DispatchError, HandlerTable};
pub use render::markdown_to_html;
pub use repository::{GITHUB_HOST, Repository};
pub use result::{BAD_GATEWAY, Document, GATEWAY_TIMEOUT, GatewayError, HttpError, Redirect, RetrievalResult, UNKNOWN_ERROR};
pub use retrieval::Retriever;
pub use store::{CacheOptions, CacheStore, MemoryCache, NullCache, Producer, SqliteCache};
pub use transport::{BodyTooLarge, GITHUB_RAW_MEDIA_TYPE, HttpTransport, Transport, TransportConfig};
