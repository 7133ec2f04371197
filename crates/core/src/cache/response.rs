//! Transport response snapshots as held by cache stores.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Header names are stored lower-cased; lookups are case-insensitive.
pub type HeaderFields = BTreeMap<String, String>;

/// An immutable snapshot of an HTTP response.
///
/// This is what cache stores hold. Retrieval results are rebuilt from a
/// snapshot on every call rather than being cached themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// HTTP status code.
    pub status: u16,
    /// Reason phrase, when one is known for the status.
    pub reason: Option<String>,
    /// Response headers keyed by lower-cased name.
    headers: HeaderFields,
    /// Response body.
    pub body: Vec<u8>,
}

impl CachedResponse {
    /// Create a snapshot with no headers.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, reason: None, headers: HeaderFields::new(), body: body.into() }
    }

    /// Rebuild a snapshot from stored parts. Header names are lower-cased.
    pub fn from_parts(status: u16, reason: Option<String>, headers: HeaderFields, body: Vec<u8>) -> Self {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        Self { status, reason, headers, body }
    }

    /// Set the reason phrase.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Add or replace a header.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Look up a header value by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// All headers, keyed by lower-cased name.
    pub fn headers(&self) -> &HeaderFields {
        &self.headers
    }

    /// Merge the headers of a revalidation response into this snapshot.
    ///
    /// Every header of `fresh` overwrites the same-named header here; all
    /// other headers, the status, reason and body are kept.
    pub fn merged_with(&self, fresh: &CachedResponse) -> CachedResponse {
        let mut merged = self.clone();
        for (name, value) in &fresh.headers {
            merged.headers.insert(name.clone(), value.clone());
        }
        merged
    }
}
