//! Response cache building blocks.
//!
//! - `CachedResponse`: the snapshot type every cache store holds
//! - `cache_key` / `key_digest`: key derivation
//! - `CacheDb`: SQLite persistence for snapshots (WAL mode, versioned
//!   migrations) backing the persistent store in the client crate

pub mod connection;
pub mod key;
pub mod migrations;
pub mod response;
pub mod responses;

pub use crate::Error;

pub use connection::CacheDb;
pub use key::{cache_key, key_digest};
pub use response::{CachedResponse, HeaderFields};
