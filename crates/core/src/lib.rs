//! Core types and shared functionality for docrepo.
//!
//! This crate provides:
//! - Response snapshots, cache keys and the SQLite response table
//! - Unified error types
//! - Repository configuration

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CachedResponse, cache_key};
pub use config::{ConfigError, RepoConfig};
pub use error::Error;
