//! Fetch routing: classify each intercepted request and resolve it.
//!
//! | strategy             | first      | on failure / miss              | cache write |
//! |----------------------|------------|--------------------------------|-------------|
//! | `AlwaysFetch`        | network    | offline asset                  | never       |
//! | `FetchAndCache`      | network    | any cached copy, then offline  | background  |
//! | `CachedOrNetworked`  | any cache  | network, then offline          | background  |

use std::sync::Arc;

use http::Method;
use serde::Serialize;
use tether_core::{Error, Request, Response, StoreNamespace, WorkerSettings};

use super::{FetchOutcome, OfflineWorker, ResolvedResponse, ResponseSource};

/// Resolution strategy for an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Deny-listed URL: network only, cache untouched.
    AlwaysFetch,
    /// HTML document: network first, cache as fallback.
    FetchAndCache,
    /// Everything else: cache first, network on miss.
    CachedOrNetworked,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::AlwaysFetch => "always_fetch",
            Strategy::FetchAndCache => "fetch_and_cache",
            Strategy::CachedOrNetworked => "cached_or_networked",
        }
    }

    /// Pick a strategy, or `None` when the worker must not intervene.
    ///
    /// A missing `Accept` header counts as "not HTML".
    pub fn classify(settings: &WorkerSettings, request: &Request) -> Option<Self> {
        if !request.is_interceptable() {
            return None;
        }
        if settings.should_always_fetch(request.url()) {
            return Some(Strategy::AlwaysFetch);
        }
        match request.accept() {
            Some(accept) if accept.contains("text/html") => Some(Strategy::FetchAndCache),
            Some(_) => Some(Strategy::CachedOrNetworked),
            None => {
                tracing::debug!(url = %request.url(), "no Accept header; treating as non-HTML");
                Some(Strategy::CachedOrNetworked)
            }
        }
    }
}

impl OfflineWorker {
    pub(crate) async fn route(&self, request: &Request) -> Result<FetchOutcome, Error> {
        let Some(strategy) = Strategy::classify(&self.settings, request) else {
            tracing::debug!(method = %request.method(), url = %request.url(), "passthrough");
            return Ok(FetchOutcome::Passthrough);
        };
        tracing::debug!(method = %request.method(), url = %request.url(), ?strategy, "routing");

        let (response, source) = match strategy {
            Strategy::AlwaysFetch => self.networked_or_offline(request).await?,
            Strategy::FetchAndCache => self.networked_or_cached(request).await?,
            Strategy::CachedOrNetworked => self.cached_or_networked(request).await?,
        };

        Ok(FetchOutcome::Respond(ResolvedResponse { response, source, strategy }))
    }

    async fn networked_or_offline(&self, request: &Request) -> Result<(Response, ResponseSource), Error> {
        match self.network.fetch(request).await {
            Ok(response) => Ok((response, ResponseSource::Network)),
            Err(e) if e.is_network() => {
                tracing::debug!(url = %request.url(), error = %e, "network failed");
                Ok((self.offline_response(request).await?, ResponseSource::Offline))
            }
            Err(e) => Err(e),
        }
    }

    async fn networked_or_cached(&self, request: &Request) -> Result<(Response, ResponseSource), Error> {
        match self.networked_and_cache(request).await {
            Ok(response) => Ok((response, ResponseSource::Network)),
            Err(e) if e.is_network() => {
                tracing::debug!(url = %request.url(), error = %e, "network failed; trying cache");
                self.cached_or_offline(request).await
            }
            Err(e) => Err(e),
        }
    }

    async fn cached_or_networked(&self, request: &Request) -> Result<(Response, ResponseSource), Error> {
        if let Some(response) = self.cached(request).await {
            tracing::debug!(url = %request.url(), "cache hit");
            return Ok((response, ResponseSource::Cache));
        }

        tracing::debug!(url = %request.url(), "cache miss");
        match self.networked_and_cache(request).await {
            Ok(response) => Ok((response, ResponseSource::Network)),
            Err(e) if e.is_network() => {
                tracing::debug!(url = %request.url(), error = %e, "network failed");
                Ok((self.offline_response(request).await?, ResponseSource::Offline))
            }
            Err(e) => Err(e),
        }
    }

    async fn cached_or_offline(&self, request: &Request) -> Result<(Response, ResponseSource), Error> {
        match self.cached(request).await {
            Some(response) => Ok((response, ResponseSource::Cache)),
            None => Ok((self.offline_response(request).await?, ResponseSource::Offline)),
        }
    }

    /// Look the request up in every store. A failed lookup degrades to a miss.
    async fn cached(&self, request: &Request) -> Option<Response> {
        self.cache
            .match_any(request)
            .await
            .inspect_err(|e| tracing::warn!(url = %request.url(), error = %e, "cache lookup failed"))
            .ok()
            .flatten()
    }

    /// Fetch from the network and stash a copy in the resources store.
    async fn networked_and_cache(&self, request: &Request) -> Result<Response, Error> {
        let response = self.network.fetch(request).await?;
        self.stash(request, &response);
        Ok(response)
    }

    /// Write a copy of the response in the background.
    ///
    /// The caller gets its response without waiting for the write. Concurrent
    /// writers for the same request race; the last one wins.
    fn stash(&self, request: &Request, response: &Response) {
        if request.method() != Method::GET {
            return;
        }

        let cache = Arc::clone(&self.cache);
        let store = self.settings.store_name(StoreNamespace::Resources);
        let request = request.clone();
        let response = response.clone();

        tokio::spawn(async move {
            match cache.put(&store, &request, &response).await {
                Ok(()) => tracing::debug!(method = %request.method(), url = %request.url(), "cache write"),
                Err(e) => tracing::warn!(url = %request.url(), error = %e, "cache write failed"),
            }
        });
    }
}
