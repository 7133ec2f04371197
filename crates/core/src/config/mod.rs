//! Repository configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (DOC_REPO_*)
//! 2. TOML config file (if DOC_REPO_CONFIG_FILE set)
//! 3. Built-in defaults

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Configuration for a documentation repository.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (DOC_REPO_*)
/// 2. TOML config file (if DOC_REPO_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoConfig {
    /// GitHub organization (or user) owning the repository.
    ///
    /// Set via DOC_REPO_ORG environment variable.
    #[serde(default)]
    pub org: Option<String>,

    /// Repository name.
    ///
    /// Set via DOC_REPO_REPO environment variable.
    #[serde(default)]
    pub repo: Option<String>,

    /// Branch documents are read from.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Path of the documentation directory inside the repository.
    #[serde(default = "default_doc_root")]
    pub doc_root: String,

    /// Extension appended to slugs that have none.
    #[serde(default = "default_fallback_ext")]
    pub fallback_ext: String,

    /// Extensions treated as renderable documents. Anything else is
    /// answered with a redirect to the raw file.
    #[serde(default = "default_doc_formats")]
    pub doc_formats: Vec<String>,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Optional token sent as `Authorization: token <value>`.
    ///
    /// Set via DOC_REPO_AUTH_TOKEN environment variable.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// TCP connect timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub open_timeout_ms: u64,

    /// Response read timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub read_timeout_ms: u64,

    /// TLS handshake timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub ssl_timeout_ms: u64,

    /// Largest response body accepted, in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Path of the SQLite response cache. Caching is disabled when unset.
    ///
    /// Set via DOC_REPO_CACHE_DB_PATH environment variable.
    #[serde(default)]
    pub cache_db_path: Option<PathBuf>,

    /// Options handed unchanged to the cache store on every call.
    #[serde(default)]
    pub cache_options: BTreeMap<String, String>,
}

fn default_branch() -> String {
    "master".into()
}

fn default_doc_root() -> String {
    "docs".into()
}

fn default_fallback_ext() -> String {
    ".md".into()
}

fn default_doc_formats() -> Vec<String> {
    [".md", ".markdown", ".htm", ".html"].into_iter().map(String::from).collect()
}

fn default_user_agent() -> String {
    "docrepo/0.1".into()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_bytes() -> usize {
    5 * 1024 * 1024
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            org: None,
            repo: None,
            branch: default_branch(),
            doc_root: default_doc_root(),
            fallback_ext: default_fallback_ext(),
            doc_formats: default_doc_formats(),
            user_agent: default_user_agent(),
            auth_token: None,
            open_timeout_ms: default_timeout_ms(),
            read_timeout_ms: default_timeout_ms(),
            ssl_timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            cache_db_path: None,
            cache_options: BTreeMap::new(),
        }
    }
}

impl RepoConfig {
    /// Connect timeout as Duration.
    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }

    /// Read timeout as Duration.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// TLS handshake timeout as Duration.
    pub fn ssl_timeout(&self) -> Duration {
        Duration::from_millis(self.ssl_timeout_ms)
    }

    /// Whether `ext` (including the leading dot) names a renderable document.
    pub fn is_doc_format(&self, ext: &str) -> bool {
        self.doc_formats.iter().any(|f| f == ext)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `DOC_REPO_`
    /// 2. TOML file from `DOC_REPO_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("DOC_REPO_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        Self::extract(figment.merge(
            Env::prefixed("DOC_REPO_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        ))
    }

    /// Load configuration from an explicit TOML file layered over defaults.
    ///
    /// Environment variables are not consulted.
    pub fn from_toml_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Self::extract(Figment::from(Serialized::defaults(Self::default())).merge(Toml::file(path.into())))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Organization name, required before any document can be requested.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the organization is not set.
    pub fn require_org(&self) -> Result<&str, ConfigError> {
        self.org.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "org".into(),
            hint: "Set DOC_REPO_ORG environment variable".into(),
        })
    }

    /// Repository name, required before any document can be requested.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the repository is not set.
    pub fn require_repo(&self) -> Result<&str, ConfigError> {
        self.repo.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "repo".into(),
            hint: "Set DOC_REPO_REPO environment variable".into(),
        })
    }
}
