//! Stored response CRUD operations.

use super::connection::CacheDb;
use super::key::key_digest;
use super::response::{CachedResponse, HeaderFields};
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

/// Raw row as read from the `responses` table.
struct ResponseRow {
    status: u16,
    reason: Option<String>,
    headers_json: String,
    body: Vec<u8>,
}

impl ResponseRow {
    fn into_response(self) -> Result<CachedResponse, Error> {
        let headers: HeaderFields = serde_json::from_str(&self.headers_json)?;
        Ok(CachedResponse::from_parts(self.status, self.reason, headers, self.body))
    }
}

impl CacheDb {
    /// Insert or replace the response stored under `key`.
    pub async fn put_response(&self, key: &str, response: &CachedResponse) -> Result<(), Error> {
        let key_hash = key_digest(key);
        let key = key.to_string();
        let headers_json = serde_json::to_string(response.headers())?;
        let status = response.status;
        let reason = response.reason.clone();
        let body = response.body.clone();
        let stored_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO responses (key_hash, cache_key, status, reason, headers_json, body, stored_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(key_hash) DO UPDATE SET
                        cache_key = excluded.cache_key,
                        status = excluded.status,
                        reason = excluded.reason,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![key_hash, key, status, reason, headers_json, body, stored_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get the response stored under `key`.
    ///
    /// Returns None if nothing is stored for the key.
    pub async fn get_response(&self, key: &str) -> Result<Option<CachedResponse>, Error> {
        let key_hash = key_digest(key);
        let row = self
            .conn
            .call(move |conn| -> Result<Option<ResponseRow>, Error> {
                conn.query_row(
                    "SELECT status, reason, headers_json, body FROM responses WHERE key_hash = ?1",
                    params![key_hash],
                    |row| {
                        Ok(ResponseRow {
                            status: row.get(0)?,
                            reason: row.get(1)?,
                            headers_json: row.get(2)?,
                            body: row.get(3)?,
                        })
                    },
                )
                .optional()
                .map_err(Error::from)
            })
            .await
            .map_err(Error::from)?;

        row.map(ResponseRow::into_response).transpose()
    }

    /// Delete the response stored under `key`.
    ///
    /// Returns true if an entry was removed.
    pub async fn delete_response(&self, key: &str) -> Result<bool, Error> {
        let key_hash = key_digest(key);
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM responses WHERE key_hash = ?1", params![key_hash])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Cache keys currently stored, oldest first.
    pub async fn response_keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT cache_key FROM responses ORDER BY stored_at ASC")?;
                let keys = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, rusqlite::Error>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}
