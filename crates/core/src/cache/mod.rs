//! Named cache stores for intercepted request/response pairs.
//!
//! The worker talks to storage through the [`CacheStorage`] trait so that any
//! host (a browser binding, a test double, the bundled SQLite store) can back it.
//! Stores are addressed by name; entries inside a store are keyed by request
//! identity (method + URL, fragment removed).
//!
//! - SQLite backend with WAL mode and schema migrations
//! - Versioned store naming (`{version}:{namespace}`)
//! - Atomic batch writes for install-time population

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod naming;
pub mod store;

use async_trait::async_trait;

pub use crate::Error;
use crate::{Request, Response};

pub use connection::CacheDb;
pub use naming::{StoreNamespace, is_current_store, store_name};

/// Host-provided cache storage.
///
/// Mirrors the operations a browser exposes to a worker. A miss is `Ok(None)`,
/// never an error.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a store, creating it if absent.
    async fn open(&self, name: &str) -> Result<(), Error>;

    /// Whether a store with this name exists.
    async fn has(&self, name: &str) -> Result<bool, Error>;

    /// Store a single entry, replacing any previous entry for the same request.
    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error>;

    /// Store every entry or none of them.
    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error>;

    /// Look up a request in one store.
    async fn match_in(&self, name: &str, request: &Request) -> Result<Option<Response>, Error>;

    /// Look up a request across all stores, oldest store first.
    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error>;

    /// Names of all stores in creation order.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a store and its entries. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool, Error>;
}
