//! Versioned store names.
//!
//! Every store this crate creates is named `{version}:{namespace}`. Eviction
//! relies on that prefix to tell current stores from stale ones.

use std::fmt;

/// Separator between the version tag and the namespace.
pub const SEPARATOR: char = ':';

/// Logical store within a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreNamespace {
    /// Assets cached at install time for degraded operation.
    Offline,
    /// Copies of responses written while routing.
    Resources,
}

impl StoreNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreNamespace::Offline => "offline",
            StoreNamespace::Resources => "resources",
        }
    }
}

impl fmt::Display for StoreNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the store name for a namespace under a version.
pub fn store_name(version: &str, namespace: StoreNamespace) -> String {
    format!("{version}{SEPARATOR}{namespace}")
}

/// Whether `name` belongs to `version`.
///
/// Stricter than a plain `starts_with(version)`: the separator is part of the
/// prefix, so `v10:offline`, `v1-legacy` and a bare `v1` are not current under `v1`.
pub fn is_current_store(name: &str, version: &str) -> bool {
    name.strip_prefix(version)
        .is_some_and(|rest| rest.starts_with(SEPARATOR))
}
