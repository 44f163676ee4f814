//! Offline worker policy.
//!
//! Three lifecycle phases, each a reaction to a host-delivered event:
//!
//! - **install**: pre-populate `{version}:offline` with the offline manifest.
//! - **fetch**: classify an intercepted request and resolve it from network,
//!   cache, or the offline fallback assets.
//! - **activate**: claim open clients and delete stores from other versions.
//!
//! The host is reached only through [`CacheStorage`], [`Network`] and
//! [`WorkerHost`], so the policy runs the same against a browser binding, the
//! bundled SQLite/reqwest stack, or test doubles.

pub mod activate;
pub mod fallback;
pub mod install;
pub mod router;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tether_core::{CacheStorage, Error, Request, Response, WorkerSettings};

use crate::fetch::Network;

pub use activate::ActivateReport;
pub use fallback::OfflineAsset;
pub use install::InstallReport;
pub use router::Strategy;

/// Host lifecycle controls available to the worker.
#[async_trait]
pub trait WorkerHost: Send + Sync {
    /// Ask the host to activate this worker without waiting for old clients to close.
    async fn skip_waiting(&self) -> Result<(), Error>;

    /// Take control of already open client pages. Returns how many were claimed.
    async fn claim_clients(&self) -> Result<usize, Error>;
}

/// One method per lifecycle phase.
///
/// A host adapter translates its own events into these calls and keeps the
/// event alive until the returned future settles.
#[async_trait]
pub trait LifecycleHandler: Send + Sync {
    async fn install(&self) -> Result<InstallReport, Error>;

    async fn activate(&self) -> Result<ActivateReport, Error>;

    /// Resolve an intercepted request.
    ///
    /// `Err` means the fallback itself failed and the host should answer with an error.
    async fn fetch(&self, request: Request) -> Result<FetchOutcome, Error>;
}

/// Where a resolved response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
    Offline,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::Offline => "offline",
        }
    }
}

/// A response chosen by the router.
#[derive(Debug, Clone)]
pub struct ResolvedResponse {
    pub response: Response,
    pub source: ResponseSource,
    pub strategy: Strategy,
}

/// Result of handling a fetch event.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The worker does not intervene; the host performs the request natively.
    Passthrough,
    /// The worker answers the request.
    Respond(ResolvedResponse),
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&ResolvedResponse> {
        match self {
            FetchOutcome::Passthrough => None,
            FetchOutcome::Respond(resolved) => Some(resolved),
        }
    }
}

/// The offline-first worker.
///
/// Holds only shared handles and immutable settings, so it can be cloned
/// cheaply into every event handler.
#[derive(Clone)]
pub struct OfflineWorker {
    settings: Arc<WorkerSettings>,
    cache: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    host: Arc<dyn WorkerHost>,
}

impl OfflineWorker {
    pub fn new(
        settings: WorkerSettings, cache: Arc<dyn CacheStorage>, network: Arc<dyn Network>, host: Arc<dyn WorkerHost>,
    ) -> Self {
        Self { settings: Arc::new(settings), cache, network, host }
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }
}

#[async_trait]
impl LifecycleHandler for OfflineWorker {
    async fn install(&self) -> Result<InstallReport, Error> {
        self.run_install().await
    }

    async fn activate(&self) -> Result<ActivateReport, Error> {
        self.run_activate().await
    }

    async fn fetch(&self, request: Request) -> Result<FetchOutcome, Error> {
        self.route(&request).await
    }
}
