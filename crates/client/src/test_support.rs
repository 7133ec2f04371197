//! Scripted transport shared by engine and repository tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use docrepo_core::CachedResponse;
use reqwest::header::HeaderMap;

use crate::result::{GatewayError, UNKNOWN_ERROR};
use crate::transport::Transport;

/// One request as seen by the stub.
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub uri: String,
    pub headers: HeaderMap,
}

/// Transport that replays queued replies and records every request.
pub(crate) struct StubTransport {
    host: String,
    replies: Mutex<VecDeque<Result<CachedResponse, u16>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl StubTransport {
    pub fn new(host: &str) -> Self {
        Self { host: host.to_string(), replies: Mutex::new(VecDeque::new()), requests: Mutex::new(Vec::new()) }
    }

    /// Queue a response for the next request.
    pub fn reply(&self, response: CachedResponse) -> &Self {
        self.replies.lock().unwrap().push_back(Ok(response));
        self
    }

    /// Queue a transport failure with the given gateway code.
    pub fn fail(&self, code: u16) -> &Self {
        self.replies.lock().unwrap().push_back(Err(code));
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Transport for StubTransport {
    fn host(&self) -> &str {
        &self.host
    }

    async fn perform(&self, uri: &str, headers: HeaderMap) -> Result<CachedResponse, GatewayError> {
        self.requests.lock().unwrap().push(RecordedRequest { uri: uri.to_string(), headers });
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(code)) => Err(GatewayError::new(uri, code, "scripted transport failure")),
            None => Err(GatewayError::new(uri, UNKNOWN_ERROR, "no scripted reply left")),
        }
    }
}

/// Format a timestamp the way origins send `Date`/`Expires`.
pub(crate) fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
