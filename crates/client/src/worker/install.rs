//! Install phase: pre-populate the offline store.

use futures_util::future::try_join_all;
use serde::Serialize;
use tether_core::{Error, Request, Response, StoreNamespace};
use url::Url;

use super::OfflineWorker;

/// Outcome of a successful install.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    /// Store that received the manifest.
    pub store: String,
    /// Manifest URLs now cached, in manifest order.
    pub cached: Vec<String>,
    pub completed_at: String,
}

impl OfflineWorker {
    /// Cache the offline manifest, then ask the host to skip waiting.
    ///
    /// Skip-waiting is signalled whether or not caching succeeded. A failed
    /// install writes nothing; the host retries on its next trigger.
    pub(crate) async fn run_install(&self) -> Result<InstallReport, Error> {
        let result = self.populate_offline_store().await;

        if let Err(e) = self.host.skip_waiting().await {
            tracing::warn!(error = %e, "skip_waiting rejected by host");
        }

        match &result {
            Ok(report) => tracing::info!(store = %report.store, entries = report.cached.len(), "installation complete"),
            Err(e) => tracing::warn!(error = %e, "installation failed"),
        }

        result
    }

    async fn populate_offline_store(&self) -> Result<InstallReport, Error> {
        let store = self.settings.store_name(StoreNamespace::Offline);
        self.cache.open(&store).await?;

        let manifest = self.settings.offline_manifest();
        let entries = try_join_all(manifest.iter().map(|url| self.fetch_manifest_entry(url)))
            .await
            .map_err(|e| Error::InstallFailed(e.to_string()))?;

        self.cache.put_all(&store, &entries).await?;

        Ok(InstallReport {
            store,
            cached: manifest.iter().map(Url::to_string).collect(),
            completed_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Fetch one manifest URL. A non-success status is an `HttpError`.
    async fn fetch_manifest_entry(&self, url: &Url) -> Result<(Request, Response), Error> {
        let request = Request::get(url.clone());
        let response = self.network.fetch(&request).await?;

        if !response.is_success() {
            return Err(Error::HttpError(format!("{url}: status {}", response.status.as_u16())));
        }

        Ok((request, response))
    }
}
