//! Network fetch pipeline.
//!
//! The worker reaches the network only through the [`Network`] trait, so a
//! host can plug in its own fetch primitive. [`FetchClient`] is the bundled
//! reqwest implementation.
//!
//! ### Failure model
//! - Transport failures (DNS, connect, TLS, timeout) are `Error::Network`.
//! - Any HTTP status, including 4xx/5xx, is a response, not a failure.
//! - Redirects are followed up to a fixed limit.

pub mod url;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;

pub use self::url::{UrlError, canonicalize};

use tether_core::{Error, Request, Response};

/// Host-provided network access.
#[async_trait]
pub trait Network: Send + Sync {
    /// Send the request. `Err` only when no response was produced.
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "tether/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "tether/0.1".to_string(), timeout: Duration::from_millis(20000), max_redirects: 5 }
    }
}

impl From<&tether_core::WorkerConfig> for FetchConfig {
    fn from(config: &tether_core::WorkerConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.timeout(), ..Default::default() }
    }
}

/// reqwest-backed network client.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();

        let response = self
            .http
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone())
            .send()
            .await
            .map_err(|e| Error::Network(format!("{} {}: {}", request.method(), request.url(), e)))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {}", e)))?;

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            status = status.as_u16(),
            bytes = body.len(),
            fetch_ms,
            "network fetch"
        );

        Ok(Response { status, headers, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "tether/0.1");
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_worker_config() {
        let worker = tether_core::WorkerConfig { user_agent: "app/2".into(), timeout_ms: 1500, ..Default::default() };
        let config = FetchConfig::from(&worker);
        assert_eq!(config.user_agent, "app/2");
        assert_eq!(config.timeout, Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let client = FetchClient::new(FetchConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = FetchClient::new(FetchConfig { timeout: Duration::from_millis(500), ..Default::default() })
            .unwrap();
        let request = Request::parse("GET", "http://127.0.0.1:9/unreachable").unwrap();
        let result = client.fetch(&request).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }
}
