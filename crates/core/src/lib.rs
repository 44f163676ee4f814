//! Core types and shared functionality for tether.
//!
//! This crate provides:
//! - Request/response model shared by the worker and its hosts
//! - Cache storage abstraction with a SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod message;

pub use cache::{CacheDb, CacheStorage, StoreNamespace};
pub use config::{ConfigError, WorkerConfig, WorkerSettings};
pub use error::Error;
pub use message::{Request, Response};
