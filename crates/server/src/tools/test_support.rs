//! Shared fixtures for tool tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use http::StatusCode;
use rmcp::model::CallToolResult;
use serde::de::DeserializeOwned;
use tether_client::Network;
use tether_core::{CacheDb, Error, Request, Response, WorkerConfig};

use super::HostContext;

pub(crate) const ORIGIN: &str = "http://localhost:8080";

/// Network answering from a fixed table; unknown URLs get a 404.
#[derive(Default)]
pub(crate) struct StubNetwork {
    responses: Mutex<HashMap<String, Response>>,
    offline: AtomicBool,
}

impl StubNetwork {
    pub(crate) fn serve(&self, path: &str, response: Response) {
        self.responses
            .lock()
            .unwrap()
            .insert(format!("{ORIGIN}{path}"), response);
    }

    pub(crate) fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }
        let response = self.responses.lock().unwrap().get(request.url().as_str()).cloned();
        Ok(response.unwrap_or_else(|| Response::new(StatusCode::NOT_FOUND, "not found")))
    }
}

/// A context for `version` with the offline manifest already being served.
pub(crate) async fn context(version: &str) -> (HostContext, Arc<StubNetwork>) {
    let config = WorkerConfig { version: version.into(), origin: ORIGIN.into(), ..Default::default() };
    let cache = Arc::new(CacheDb::open_in_memory().await.unwrap());
    let network = Arc::new(StubNetwork::default());
    network.serve("/", Response::ok("text/html", "<h1>home</h1>"));
    network.serve("/offline.html", Response::ok("text/html", "<h1>offline</h1>"));
    network.serve("/offline.svg", Response::ok("image/svg+xml", "<svg/>"));

    let ctx = HostContext::new(config.settings().unwrap(), cache, Arc::clone(&network) as Arc<dyn Network>, 1);
    (ctx, network)
}

/// Parse the JSON text content of a tool result.
pub(crate) fn output<T: DeserializeOwned>(result: &CallToolResult) -> T {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
