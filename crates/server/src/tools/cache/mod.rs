//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting the worker's cache stores.

pub mod keys;

pub use keys::keys_impl;
