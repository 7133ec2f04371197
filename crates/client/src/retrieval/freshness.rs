//! Expiry check and conditional request headers for cached responses.

use chrono::{DateTime, Utc};
use docrepo_core::CachedResponse;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};

use crate::result::parse_http_date;

/// Whether `response` must be revalidated at `now`.
///
/// Only `Expires` is consulted. A missing header never expires, an
/// unparsable one is already expired.
pub fn is_expired(response: &CachedResponse, now: DateTime<Utc>) -> bool {
    match response.header("expires") {
        None => false,
        Some(value) => match parse_http_date(value) {
            Some(expires) => expires < now,
            None => true,
        },
    }
}

/// Validators for a conditional GET of `cached`.
///
/// `If-None-Match` carries the ETag, `If-Modified-Since` carries
/// `Last-Modified` or else `Date`. Headers without a source are left out.
pub fn revalidation_headers(cached: &CachedResponse) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(&mut headers, header::IF_NONE_MATCH, cached.header("etag"));
    insert(
        &mut headers,
        header::IF_MODIFIED_SINCE,
        cached.header("last-modified").or_else(|| cached.header("date")),
    );
    headers
}

fn insert(headers: &mut HeaderMap, name: HeaderName, value: Option<&str>) {
    let Some(value) = value else { return };
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::debug!(header = %name, value, "skipping unsendable validator"),
    }
}
