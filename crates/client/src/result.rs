//! Retrieval outcomes.
//!
//! Every retrieval attempt produces exactly one `RetrievalResult`:
//!
//! | variant    | source                        | predicate     |
//! |------------|-------------------------------|---------------|
//! | `Document` | 2xx response                  | `is_success`  |
//! | `Redirect` | 3xx response, or non-document | `is_redirect` |
//! | `Http`     | any other upstream status     | `is_error`    |
//! | `Gateway`  | transport failure (502/504/520) | `is_error`  |
//!
//! `is_not_found` refines `is_error` and holds only for an upstream 404.
//! Results are rebuilt from a response snapshot on every call and never
//! cached themselves.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use docrepo_core::cache::{CachedResponse, HeaderFields};
use reqwest::StatusCode;

/// Synthesized status for protocol, malformed response, and TLS failures.
pub const BAD_GATEWAY: u16 = 502;

/// Synthesized status for connect, read, and handshake timeouts.
pub const GATEWAY_TIMEOUT: u16 = 504;

/// Synthesized status for any other transport failure.
pub const UNKNOWN_ERROR: u16 = 520;

/// Outcome of a single retrieval attempt.
#[derive(Debug, Clone)]
pub enum RetrievalResult {
    Document(Document),
    Redirect(Redirect),
    Http(HttpError),
    Gateway(GatewayError),
}

impl RetrievalResult {
    /// Classify a live or cached response for the request path `uri`.
    ///
    /// Redirection statuses are checked before success, everything else is
    /// an upstream error.
    pub fn from_response(uri: &str, response: CachedResponse) -> Self {
        let status = response.status;
        if (300..400).contains(&status) {
            RetrievalResult::Redirect(Redirect::from_response(uri, response))
        } else if (200..300).contains(&status) {
            RetrievalResult::Document(Document::from_response(uri, response))
        } else {
            RetrievalResult::Http(HttpError::from_response(uri, response))
        }
    }

    /// The request path this result was produced for.
    pub fn uri(&self) -> &str {
        match self {
            RetrievalResult::Document(doc) => &doc.uri,
            RetrievalResult::Redirect(redirect) => &redirect.uri,
            RetrievalResult::Http(err) => &err.uri,
            RetrievalResult::Gateway(err) => &err.uri,
        }
    }

    /// HTTP status code, real or synthesized.
    pub fn code(&self) -> u16 {
        match self {
            RetrievalResult::Document(doc) => doc.code,
            RetrievalResult::Redirect(redirect) => redirect.code,
            RetrievalResult::Http(err) => err.code,
            RetrievalResult::Gateway(err) => err.code,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RetrievalResult::Document(_))
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, RetrievalResult::Redirect(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RetrievalResult::Http(_) | RetrievalResult::Gateway(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RetrievalResult::Http(err) if err.is_not_found())
    }

    /// Human readable detail: the body of an upstream error or the cause of a
    /// gateway failure.
    pub fn details(&self) -> Option<String> {
        match self {
            RetrievalResult::Http(err) => Some(err.details()),
            RetrievalResult::Gateway(err) => Some(err.details()),
            _ => None,
        }
    }
}

impl fmt::Display for RetrievalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalResult::Document(doc) => write!(f, "{} {}", doc.code, doc.uri),
            RetrievalResult::Redirect(redirect) => write!(f, "{} -> {}", redirect.code, redirect.location),
            RetrievalResult::Http(err) => err.fmt(f),
            RetrievalResult::Gateway(err) => err.fmt(f),
        }
    }
}

/// A successfully retrieved document.
#[derive(Debug, Clone)]
pub struct Document {
    uri: String,
    code: u16,
    headers: HeaderFields,
    body: Vec<u8>,
    etag: Option<String>,
    last_modified: Option<DateTime<Utc>>,
}

impl Document {
    fn from_response(uri: &str, response: CachedResponse) -> Self {
        let etag = response.header("etag").map(str::to_string);
        let last_modified = response.header("last-modified").and_then(parse_http_date);
        Self {
            uri: uri.to_string(),
            code: response.status,
            headers: response.headers().clone(),
            body: response.body,
            etag,
            last_modified,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn headers(&self) -> &HeaderFields {
        &self.headers
    }

    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// `Last-Modified` as a timestamp; None when absent or unparsable.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    /// The response body as text.
    pub fn content(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Render the document's Markdown as HTML.
    pub fn to_html(&self) -> String {
        crate::render::markdown_to_html(&self.content())
    }
}

/// A redirect to another location.
#[derive(Debug, Clone)]
pub struct Redirect {
    uri: String,
    code: u16,
    location: String,
    headers: HeaderFields,
}

impl Redirect {
    /// A redirect synthesized without contacting the origin (code 302).
    pub fn to(uri: &str, location: impl Into<String>) -> Self {
        Self { uri: uri.to_string(), code: 302, location: location.into(), headers: HeaderFields::new() }
    }

    fn from_response(uri: &str, response: CachedResponse) -> Self {
        Self {
            uri: uri.to_string(),
            code: response.status,
            location: response.header("location").unwrap_or_default().to_string(),
            headers: response.headers().clone(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    /// Target location of the redirect.
    pub fn url(&self) -> &str {
        &self.location
    }

    pub fn headers(&self) -> &HeaderFields {
        &self.headers
    }
}

/// A non-success, non-redirect upstream response.
#[derive(Debug, Clone)]
pub struct HttpError {
    uri: String,
    code: u16,
    status_message: Option<String>,
    body: Vec<u8>,
}

impl HttpError {
    fn from_response(uri: &str, response: CachedResponse) -> Self {
        Self { uri: uri.to_string(), code: response.status, status_message: response.reason, body: response.body }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn is_not_found(&self) -> bool {
        self.code == 404
    }

    /// The upstream response body.
    pub fn details(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status_message {
            Some(message) => write!(f, "{} {message:?}", self.code),
            None => write!(f, "{}", self.code),
        }
    }
}

impl std::error::Error for HttpError {}

/// A transport failure reported as a synthesized gateway status.
#[derive(Debug, Clone)]
pub struct GatewayError {
    uri: String,
    code: u16,
    cause: Arc<dyn std::error::Error + Send + Sync>,
}

impl GatewayError {
    pub fn new(uri: &str, code: u16, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self { uri: uri.to_string(), code, cause: Arc::from(cause.into()) }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    /// The wrapped transport failure.
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.cause.as_ref()
    }

    /// Description of the underlying cause.
    pub fn details(&self) -> String {
        self.cause.to_string()
    }

    /// Reason phrase for the synthesized code.
    pub fn status_message(&self) -> &'static str {
        match self.code {
            BAD_GATEWAY => "Bad Gateway",
            GATEWAY_TIMEOUT => "Gateway Timeout",
            code => StatusCode::from_u16(code)
                .ok()
                .and_then(|status| status.canonical_reason())
                .unwrap_or("Unknown Error"),
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.code, self.status_message())
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.cause.as_ref())
    }
}

/// Parse an HTTP date header value.
///
/// Accepts the three formats HTTP/1.1 allows (IMF-fixdate, RFC 850 and
/// asctime), plus RFC 2822 dates with a numeric offset.
pub(crate) fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    match httpdate::parse_http_date(value) {
        Ok(time) => Some(DateTime::<Utc>::from(time)),
        Err(_) => DateTime::parse_from_rfc2822(value).ok().map(|date| date.with_timezone(&Utc)),
    }
}
