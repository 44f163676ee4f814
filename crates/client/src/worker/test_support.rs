//! Test doubles for the worker's host seams.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use tether_core::{CacheDb, CacheStorage, Error, Request, Response, WorkerConfig};

use super::{LifecycleHandler, OfflineWorker, WorkerHost};
use crate::fetch::Network;

pub(crate) const ORIGIN: &str = "http://localhost:8080";

/// GET for a path under the test origin, or for an absolute URL.
pub(crate) fn get(path: &str) -> Request {
    let url = if path.contains("://") { path.to_string() } else { format!("{ORIGIN}{path}") };
    Request::parse("GET", &url).unwrap()
}

/// GET carrying a browser-style document `Accept` header.
pub(crate) fn html(path: &str) -> Request {
    get(path)
        .try_with_header("Accept", "text/html,application/xhtml+xml,*/*;q=0.8")
        .unwrap()
}

/// Network that answers from a fixed table and can be switched off.
#[derive(Default)]
pub(crate) struct MockNetwork {
    responses: Mutex<HashMap<String, Response>>,
    requests: Mutex<Vec<String>>,
    rejected: Mutex<HashSet<String>>,
    offline: AtomicBool,
}

impl MockNetwork {
    pub(crate) fn serve(&self, url: &str, response: Response) {
        self.responses.lock().unwrap().insert(url.to_string(), response);
    }

    pub(crate) fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    /// Fail requests for this path with a non-transport error.
    pub(crate) fn reject(&self, path: &str) {
        self.rejected.lock().unwrap().insert(format!("{ORIGIN}{path}"));
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.requests.lock().unwrap().push(request.url().to_string());
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }
        if self.rejected.lock().unwrap().contains(request.url().as_str()) {
            return Err(Error::InvalidInput(format!("{} rejected", request.url())));
        }
        let response = self.responses.lock().unwrap().get(request.url().as_str()).cloned();
        Ok(response.unwrap_or_else(|| Response::new(StatusCode::NOT_FOUND, "not found")))
    }
}

/// Cache wrapper that counts traffic and can fail chosen deletions.
pub(crate) struct SpyCache {
    inner: Arc<CacheDb>,
    reads: AtomicUsize,
    general_reads: AtomicUsize,
    writes: AtomicUsize,
    failing_deletes: Mutex<HashSet<String>>,
}

impl SpyCache {
    fn new(inner: Arc<CacheDb>) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
            general_reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            failing_deletes: Mutex::new(HashSet::new()),
        }
    }

    /// Lookups of any kind.
    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Lookups across all stores (as opposed to the offline-asset lookup).
    pub(crate) fn general_reads(&self) -> usize {
        self.general_reads.load(Ordering::SeqCst)
    }

    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_delete(&self, name: &str) {
        self.failing_deletes.lock().unwrap().insert(name.to_string());
    }

    fn reset(&self) {
        self.reads.store(0, Ordering::SeqCst);
        self.general_reads.store(0, Ordering::SeqCst);
        self.writes.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheStorage for SpyCache {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.inner.open(name).await
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        self.inner.has(name).await
    }

    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.put(name, request, response).await
    }

    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.put_all(name, entries).await
    }

    async fn match_in(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.match_in(name, request).await
    }

    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.general_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.match_any(request).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.inner.keys().await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        if self.failing_deletes.lock().unwrap().contains(name) {
            return Err(Error::InvalidInput(format!("{name} is locked")));
        }
        self.inner.delete(name).await
    }
}

/// Host that records lifecycle signals and reports one open client.
#[derive(Default)]
pub(crate) struct RecordingHost {
    skipped_waiting: AtomicBool,
    claims: AtomicUsize,
}

impl RecordingHost {
    pub(crate) fn skipped_waiting(&self) -> bool {
        self.skipped_waiting.load(Ordering::SeqCst)
    }

    pub(crate) fn claims(&self) -> usize {
        self.claims.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkerHost for RecordingHost {
    async fn skip_waiting(&self) -> Result<(), Error> {
        self.skipped_waiting.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn claim_clients(&self) -> Result<usize, Error> {
        self.claims.fetch_add(1, Ordering::SeqCst);
        Ok(1)
    }
}

/// A worker wired to in-memory doubles.
pub(crate) struct Harness {
    pub(crate) worker: OfflineWorker,
    pub(crate) db: Arc<CacheDb>,
    pub(crate) cache: Arc<SpyCache>,
    pub(crate) network: Arc<MockNetwork>,
    pub(crate) host: Arc<RecordingHost>,
}

impl Harness {
    pub(crate) async fn new(version: &str) -> Self {
        let config = WorkerConfig { version: version.into(), origin: ORIGIN.into(), ..Default::default() };
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let cache = Arc::new(SpyCache::new(Arc::clone(&db)));
        let network = Arc::new(MockNetwork::default());
        let host = Arc::new(RecordingHost::default());

        let worker = OfflineWorker::new(
            config.settings().unwrap(),
            Arc::clone(&cache) as Arc<dyn CacheStorage>,
            Arc::clone(&network) as Arc<dyn Network>,
            Arc::clone(&host) as Arc<dyn WorkerHost>,
        );

        Self { worker, db, cache, network, host }
    }

    /// A worker whose install already succeeded, with traffic counters reset.
    pub(crate) async fn installed(version: &str) -> Self {
        let harness = Self::new(version).await;
        harness.serve_offline_assets();
        harness.worker.install().await.unwrap();
        harness.cache.reset();
        harness
    }

    pub(crate) fn serve_offline_assets(&self) {
        self.network
            .serve(&format!("{ORIGIN}/"), Response::ok("text/html", "<h1>home</h1>"));
        self.network
            .serve(&format!("{ORIGIN}/offline.html"), Response::ok("text/html", "<h1>offline</h1>"));
        self.network
            .serve(&format!("{ORIGIN}/offline.svg"), Response::ok("image/svg+xml", "<svg/>"));
    }

    /// Poll until a background write lands.
    pub(crate) async fn wait_for_entry(&self, store: &str, request: &Request) -> Response {
        for _ in 0..200 {
            if let Some(response) = self.db.match_in(store, request).await.unwrap() {
                return response;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no entry for {} in {store}", request.url());
    }
}
