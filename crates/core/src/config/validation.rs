//! Configuration validation rules.
//!
//! This module provides validation logic for `RepoConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::RepoConfig;
use thiserror::Error;

/// Shortest accepted timeout.
const MIN_TIMEOUT_MS: u64 = 100;

/// Longest accepted timeout (5 minutes).
const MAX_TIMEOUT_MS: u64 = 300_000;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl RepoConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - any timeout is below 100ms or exceeds 5 minutes
    /// - `max_bytes` is zero
    /// - `user_agent` or `branch` is empty
    /// - `fallback_ext` is neither empty nor dot-prefixed
    /// - a `doc_formats` entry is not dot-prefixed
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("open_timeout_ms", self.open_timeout_ms),
            ("read_timeout_ms", self.read_timeout_ms),
            ("ssl_timeout_ms", self.ssl_timeout_ms),
        ] {
            if value < MIN_TIMEOUT_MS {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must be at least 100ms".into() });
            }
            if value > MAX_TIMEOUT_MS {
                return Err(ConfigError::Invalid {
                    field: field.into(),
                    reason: "must not exceed 5 minutes (300000ms)".into(),
                });
            }
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than zero".into() });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.branch.is_empty() {
            return Err(ConfigError::Invalid { field: "branch".into(), reason: "must not be empty".into() });
        }

        if !self.fallback_ext.is_empty() && !is_extension(&self.fallback_ext) {
            return Err(ConfigError::Invalid {
                field: "fallback_ext".into(),
                reason: format!("expected a dot-prefixed extension, got {:?}", self.fallback_ext),
            });
        }

        if let Some(bad) = self.doc_formats.iter().find(|f| !is_extension(f)) {
            return Err(ConfigError::Invalid {
                field: "doc_formats".into(),
                reason: format!("expected dot-prefixed extensions, got {bad:?}"),
            });
        }

        if self.org.is_none() || self.repo.is_none() {
            tracing::warn!(
                org = self.org.as_deref().unwrap_or_default(),
                repo = self.repo.as_deref().unwrap_or_default(),
                "org or repo is not configured; document URIs will be incomplete"
            );
        }

        Ok(())
    }
}

fn is_extension(value: &str) -> bool {
    value.len() > 1 && value.starts_with('.') && !value.contains('/')
}
