//! Network I/O boundary.
//!
//! ### Transport Adapter
//! - Always HTTPS; the host is fixed when the adapter is built.
//! - Connect, read, and TLS handshake timeouts (default 10s each).
//! - Redirects are never followed, 3xx responses are returned as-is.
//! - Bodies larger than `max_bytes` are rejected (default 5 MiB).
//! - Failures become `GatewayError` values (504 timeout, 502 protocol/TLS,
//!   520 anything else); nothing is raised to the caller.
//!
//! The adapter holds no cache state.

pub mod classify;

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use docrepo_core::{CachedResponse, Error, RepoConfig};
use reqwest::Client;
use reqwest::header::{self, HeaderMap, HeaderValue};

pub use classify::gateway_code;

use crate::result::GatewayError;

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// User agent string (default: "docrepo/0.1")
    pub user_agent: String,

    /// Token sent as `Authorization: token <value>` (default: none)
    pub auth_token: Option<String>,

    /// TCP connect timeout (default: 10s)
    pub open_timeout: Duration,

    /// Response read timeout (default: 10s)
    pub read_timeout: Duration,

    /// TLS handshake timeout (default: 10s)
    pub ssl_timeout: Duration,

    /// Maximum response body size in bytes (default: 5 MiB)
    pub max_bytes: usize,

    /// `Accept` header sent with every request
    pub accept: String,
}

/// Media type asking GitHub for the raw file contents.
pub const GITHUB_RAW_MEDIA_TYPE: &str = "application/vnd.github.v3.raw";

/// A response body went over the configured size cap.
#[derive(Debug, thiserror::Error)]
#[error("response body exceeds {limit} bytes")]
pub struct BodyTooLarge {
    pub limit: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: "docrepo/0.1".to_string(),
            auth_token: None,
            open_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(10),
            ssl_timeout: Duration::from_secs(10),
            max_bytes: 5 * 1024 * 1024,
            accept: GITHUB_RAW_MEDIA_TYPE.to_string(),
        }
    }
}

impl From<&RepoConfig> for TransportConfig {
    fn from(config: &RepoConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            auth_token: config.auth_token.clone(),
            open_timeout: config.open_timeout(),
            read_timeout: config.read_timeout(),
            ssl_timeout: config.ssl_timeout(),
            max_bytes: config.max_bytes,
            ..Default::default()
        }
    }
}

/// Performs a single GET for a path on a fixed host.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Host every request is sent to.
    fn host(&self) -> &str;

    /// GET `uri` with `headers` added to the transport's own.
    async fn perform(&self, uri: &str, headers: HeaderMap) -> Result<CachedResponse, GatewayError>;
}

/// reqwest-backed HTTPS transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    host: String,
    config: TransportConfig,
}

impl HttpTransport {
    /// Create a transport for `host` with the given configuration.
    pub fn new(host: &str, config: TransportConfig) -> Result<Self, Error> {
        let parsed = url::Url::parse(&format!("https://{host}/"))
            .map_err(|e| Error::InvalidInput(format!("invalid host {host:?}: {e}")))?;
        if parsed.path() != "/" || parsed.query().is_some() {
            return Err(Error::InvalidInput(format!("invalid host {host:?}: must not contain a path")));
        }

        let mut default_headers = HeaderMap::new();
        let accept = HeaderValue::from_str(&config.accept)
            .map_err(|e| Error::InvalidInput(format!("invalid accept header: {e}")))?;
        default_headers.insert(header::ACCEPT, accept);
        if let Some(token) = &config.auth_token {
            let mut value = HeaderValue::from_str(&format!("token {token}"))
                .map_err(|e| Error::InvalidInput(format!("invalid auth token: {e}")))?;
            value.set_sensitive(true);
            default_headers.insert(header::AUTHORIZATION, value);
        }

        // the TLS handshake runs inside reqwest's connect phase
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(default_headers)
            .connect_timeout(config.open_timeout + config.ssl_timeout)
            .read_timeout(config.read_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .https_only(true)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, host: host.to_string(), config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Absolute URL for `uri`; a missing leading `/` is supplied.
    pub fn url_for(&self, uri: &str) -> String {
        format!("https://{}{}", self.host, crate::uri::absolute_path(uri))
    }

    async fn get(&self, url: &str, headers: HeaderMap) -> Result<CachedResponse, Box<dyn StdError + Send + Sync>> {
        let mut response = self.http.get(url).headers(headers).send().await?;

        let limit = self.config.max_bytes;
        if let Some(len) = response.content_length()
            && len > limit as u64
        {
            return Err(BodyTooLarge { limit }.into());
        }

        let status = response.status();
        let mut fields = BTreeMap::new();
        for (name, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            fields
                .entry(name.as_str().to_string())
                .and_modify(|existing: &mut String| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert_with(|| value.clone());
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            append_capped(&mut body, &chunk, limit)?;
        }

        Ok(CachedResponse::from_parts(
            status.as_u16(),
            status.canonical_reason().map(str::to_string),
            fields,
            body.to_vec(),
        ))
    }
}

/// Append `chunk` unless the body would grow past `limit` bytes.
fn append_capped(body: &mut BytesMut, chunk: &[u8], limit: usize) -> Result<(), BodyTooLarge> {
    if body.len() + chunk.len() > limit {
        return Err(BodyTooLarge { limit });
    }
    body.extend_from_slice(chunk);
    Ok(())
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    fn host(&self) -> &str {
        &self.host
    }

    async fn perform(&self, uri: &str, headers: HeaderMap) -> Result<CachedResponse, GatewayError> {
        let start = Instant::now();
        let url = self.url_for(uri);

        match self.get(&url, headers).await {
            Ok(response) => {
                tracing::debug!(
                    "fetched {} -> {} in {}ms ({} bytes)",
                    url,
                    response.status,
                    start.elapsed().as_millis(),
                    response.body.len()
                );
                Ok(response)
            }
            Err(e) => {
                let code = gateway_code(e.as_ref());
                tracing::debug!(url = %url, code, error = %e, "transport failure");
                Err(GatewayError::new(uri, code, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{BAD_GATEWAY, GATEWAY_TIMEOUT, UNKNOWN_ERROR};
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    fn fast_config() -> TransportConfig {
        TransportConfig {
            open_timeout: Duration::from_millis(200),
            read_timeout: Duration::from_millis(200),
            ssl_timeout: Duration::from_millis(200),
            ..Default::default()
        }
    }

    #[test]
    fn test_transport_config_default() {
        let config = TransportConfig::default();
        assert_eq!(config.user_agent, "docrepo/0.1");
        assert!(config.auth_token.is_none());
        assert_eq!(config.open_timeout, Duration::from_secs(10));
        assert_eq!(config.read_timeout, Duration::from_secs(10));
        assert_eq!(config.ssl_timeout, Duration::from_secs(10));
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.accept, "application/vnd.github.v3.raw");
    }

    #[test]
    fn test_transport_config_from_repo_config() {
        let repo = RepoConfig {
            user_agent: "handbook-bot/2".into(),
            auth_token: Some("secret".into()),
            read_timeout_ms: 1_500,
            max_bytes: 1_024,
            ..Default::default()
        };
        let config = TransportConfig::from(&repo);
        assert_eq!(config.max_bytes, 1_024);
        assert_eq!(config.accept, GITHUB_RAW_MEDIA_TYPE);
        assert_eq!(config.user_agent, "handbook-bot/2");
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.read_timeout, Duration::from_millis(1_500));
        assert_eq!(config.open_timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_transport_new() {
        let transport = HttpTransport::new("raw.githubusercontent.com", TransportConfig::default()).unwrap();
        assert_eq!(transport.host(), "raw.githubusercontent.com");
        assert_eq!(transport.config().user_agent, "docrepo/0.1");
    }

    #[tokio::test]
    async fn test_url_for_supplies_leading_slash() {
        let transport = HttpTransport::new("x.test", TransportConfig::default()).unwrap();
        assert_eq!(transport.url_for("/a.doc"), "https://x.test/a.doc");
        assert_eq!(transport.url_for("a.doc"), "https://x.test/a.doc");
        assert_eq!(transport.url_for(""), "https://x.test/");
    }

    #[test]
    fn test_append_capped() {
        let mut body = BytesMut::new();
        append_capped(&mut body, b"hello", 8).unwrap();
        append_capped(&mut body, b"!!!", 8).unwrap();
        assert_eq!(&body[..], b"hello!!!");

        let err = append_capped(&mut body, b"?", 8).unwrap_err();
        assert_eq!(err.limit, 8);
        assert_eq!(err.to_string(), "response body exceeds 8 bytes");
        assert_eq!(body.len(), 8);
    }

    #[tokio::test]
    async fn test_transport_rejects_bad_accept() {
        let config = TransportConfig { accept: "bad\naccept".into(), ..Default::default() };
        assert!(matches!(HttpTransport::new("any.host", config), Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_transport_rejects_bad_hosts() {
        assert!(matches!(HttpTransport::new("", TransportConfig::default()), Err(Error::InvalidInput(_))));
        assert!(matches!(
            HttpTransport::new("any.host/with/path", TransportConfig::default()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_transport_rejects_bad_token() {
        let config = TransportConfig { auth_token: Some("bad\ntoken".into()), ..Default::default() };
        assert!(matches!(HttpTransport::new("any.host", config), Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_silent_peer_is_gateway_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let transport = HttpTransport::new(&addr.to_string(), fast_config()).unwrap();
        let err = transport.perform("/any-document.ext", HeaderMap::new()).await.unwrap_err();

        assert_eq!(err.code(), GATEWAY_TIMEOUT);
        assert_eq!(err.uri(), "/any-document.ext");
        assert_eq!(err.to_string(), "504 \"Gateway Timeout\"");
    }

    #[tokio::test]
    async fn test_closed_port_is_unknown_error() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let transport = HttpTransport::new(&addr.to_string(), fast_config()).unwrap();
        let err = transport.perform("/any-document.ext", HeaderMap::new()).await.unwrap_err();

        assert_eq!(err.code(), UNKNOWN_ERROR);
        assert_eq!(err.to_string(), "520 \"Unknown Error\"");
        assert!(!err.details().is_empty());
    }

    #[tokio::test]
    async fn test_plaintext_peer_is_bad_gateway() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let _ = stream
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello")
                    .await;
                let _ = stream.flush().await;
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        });

        let transport = HttpTransport::new(&addr.to_string(), fast_config()).unwrap();
        let err = transport.perform("/any-document.ext", HeaderMap::new()).await.unwrap_err();

        assert_eq!(err.code(), BAD_GATEWAY);
        assert_eq!(err.to_string(), "502 \"Bad Gateway\"");
    }
}
