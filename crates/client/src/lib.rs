//! Client code for tether.
//!
//! This crate provides the network fetch pipeline and the offline worker
//! policy: install-time caching, per-request routing, and activation-time
//! eviction of stale stores.

pub mod fetch;
pub mod worker;

pub use fetch::{FetchClient, FetchConfig, Network, UrlError, canonicalize};
pub use worker::{
    ActivateReport, FetchOutcome, InstallReport, LifecycleHandler, OfflineAsset, OfflineWorker, ResolvedResponse,
    ResponseSource, Strategy, WorkerHost,
};
