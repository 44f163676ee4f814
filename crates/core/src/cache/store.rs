//! `CacheStorage` implementation for the SQLite store.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

use super::connection::CacheDb;
use super::hash::compute_request_key;
use super::CacheStorage;
use crate::{Error, Request, Response};

/// A request/response pair flattened into column values.
struct EncodedEntry {
    request_key: String,
    method: String,
    url: String,
    status_code: i64,
    headers_json: String,
    body: Bytes,
}

impl EncodedEntry {
    fn encode(request: &Request, response: &Response) -> Result<Self, Error> {
        // values are hex so non-UTF-8 bytes survive the JSON column
        let headers: Vec<(&str, String)> = response
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), hex::encode(value.as_bytes())))
            .collect();
        let headers_json = serde_json::to_string(&headers).map_err(|e| Error::CorruptEntry(e.to_string()))?;

        Ok(Self {
            request_key: compute_request_key(request.method().as_str(), request.url()),
            method: request.method().as_str().to_string(),
            url: request.url().to_string(),
            status_code: i64::from(response.status.as_u16()),
            headers_json,
            body: response.body.clone(),
        })
    }
}

fn decode_response(status_code: i64, headers_json: &str, body: Vec<u8>) -> Result<Response, Error> {
    let status = u16::try_from(status_code)
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .ok_or_else(|| Error::CorruptEntry(format!("status code {status_code}")))?;

    let pairs: Vec<(String, String)> =
        serde_json::from_str(headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
    let mut headers = HeaderMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        let value = hex::decode(&value).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        let value = HeaderValue::from_bytes(&value).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        headers.append(name, value);
    }

    Ok(Response { status, headers, body: Bytes::from(body) })
}

/// Return the id of the named store, creating it if absent.
fn ensure_store(conn: &rusqlite::Connection, name: &str) -> Result<i64, Error> {
    conn.execute(
        "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
        params![name, chrono::Utc::now().to_rfc3339()],
    )?;
    let id = conn.query_row("SELECT id FROM cache_stores WHERE name = ?1", params![name], |row| row.get(0))?;
    Ok(id)
}

fn insert_entry(conn: &rusqlite::Connection, store_id: i64, entry: &EncodedEntry) -> Result<(), Error> {
    conn.execute(
        "INSERT INTO cache_entries (
            store_id, request_key, method, url, status_code, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(store_id, request_key) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status_code = excluded.status_code,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            store_id,
            &entry.request_key,
            &entry.method,
            &entry.url,
            entry.status_code,
            &entry.headers_json,
            &entry.body[..],
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

type RawRow = (i64, String, Vec<u8>);

fn read_raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

impl CacheDb {
    /// Number of entries held by a store. Zero when the store does not exist.
    pub async fn count_entries(&self, name: &str) -> Result<u64, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM cache_entries e
                     JOIN cache_stores s ON s.id = e.store_id
                     WHERE s.name = ?1",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_store(conn, &name)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM cache_stores WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let name = name.to_string();
        let entry = EncodedEntry::encode(request, response)?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let store_id = ensure_store(conn, &name)?;
                insert_entry(conn, store_id, &entry)
            })
            .await
            .map_err(Error::from)
    }

    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        let name = name.to_string();
        let encoded = entries
            .iter()
            .map(|(request, response)| EncodedEntry::encode(request, response))
            .collect::<Result<Vec<_>, _>>()?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                let store_id = ensure_store(&tx, &name)?;
                for entry in &encoded {
                    insert_entry(&tx, store_id, entry)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn match_in(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        let name = name.to_string();
        let key = compute_request_key(request.method().as_str(), request.url());
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let row = conn
                    .query_row(
                        "SELECT e.status_code, e.headers_json, e.body
                         FROM cache_entries e
                         JOIN cache_stores s ON s.id = e.store_id
                         WHERE s.name = ?1 AND e.request_key = ?2",
                        params![name, key],
                        read_raw_row,
                    )
                    .optional()?;
                row.map(|(status, headers, body)| decode_response(status, &headers, body))
                    .transpose()
            })
            .await
            .map_err(Error::from)
    }

    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        let key = compute_request_key(request.method().as_str(), request.url());
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let row = conn
                    .query_row(
                        "SELECT e.status_code, e.headers_json, e.body
                         FROM cache_entries e
                         JOIN cache_stores s ON s.id = e.store_id
                         WHERE e.request_key = ?1
                         ORDER BY s.id ASC
                         LIMIT 1",
                        params![key],
                        read_raw_row,
                    )
                    .optional()?;
                row.map(|(status, headers, body)| decode_response(status, &headers, body))
                    .transpose()
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_stores ORDER BY id ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM cache_stores WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}
