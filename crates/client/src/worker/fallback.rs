//! Offline fallback resolution.

use http::Method;
use tether_core::{Error, Request, Response, StoreNamespace, WorkerSettings};
use url::Url;

use super::OfflineWorker;

/// Which static asset stands in for an unanswerable request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfflineAsset {
    Page,
    Image,
}

impl OfflineAsset {
    /// Image-looking URLs get the offline image; everything else gets the page.
    pub fn for_url(settings: &WorkerSettings, url: &Url) -> Self {
        if settings.looks_like_image(url) { OfflineAsset::Image } else { OfflineAsset::Page }
    }

    pub fn url<'a>(&self, settings: &'a WorkerSettings) -> &'a Url {
        match self {
            OfflineAsset::Page => settings.offline_page(),
            OfflineAsset::Image => settings.offline_image(),
        }
    }
}

impl OfflineWorker {
    /// Serve the offline asset matching the request's shape.
    ///
    /// The asset must already be in the offline store; there is no further fallback.
    pub(crate) async fn offline_response(&self, request: &Request) -> Result<Response, Error> {
        let asset = OfflineAsset::for_url(&self.settings, request.url());
        let asset_url = asset.url(&self.settings);
        tracing::debug!(method = %request.method(), url = %request.url(), asset = ?asset, "serving offline asset");

        let store = self.settings.store_name(StoreNamespace::Offline);
        let mut response = self
            .cache
            .match_in(&store, &Request::get(asset_url.clone()))
            .await?
            .ok_or_else(|| Error::OfflineAssetMissing(format!("{asset_url} not in {store}")))?;

        if request.method() == Method::HEAD {
            response.body.clear();
        }
        Ok(response)
    }
}
