//! Compiled, immutable worker settings.

use std::sync::LazyLock;

use regex::{Regex, RegexSet};
use url::Url;

use super::{ConfigError, WorkerConfig};
use crate::cache::{StoreNamespace, store_name};

/// Image-like URLs: a known extension at the end, optionally followed by a query string.
static IMAGE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(jpg|png|gif|svg|jpeg)(\?.*)?$").expect("image pattern is valid"));

/// Everything the worker components need, resolved once at startup.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    version: String,
    origin: Url,
    offline_manifest: Vec<Url>,
    offline_page: Url,
    offline_image: Url,
    always_fetch: RegexSet,
}

impl WorkerSettings {
    /// Validate `config` and compile it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if validation fails, the origin is not an
    /// http(s) URL, a manifest entry cannot be resolved, or a pattern does not compile.
    pub fn from_config(config: &WorkerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let origin = Url::parse(&config.origin).map_err(|e| ConfigError::Invalid {
            field: "origin".into(),
            reason: e.to_string(),
        })?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                field: "origin".into(),
                reason: format!("unsupported scheme: {}", origin.scheme()),
            });
        }

        let resolve = |field: &str, path: &str| {
            origin.join(path).map_err(|e| ConfigError::Invalid {
                field: field.into(),
                reason: format!("{path}: {e}"),
            })
        };

        let offline_manifest = config
            .offline_resources
            .iter()
            .map(|path| resolve("offline_resources", path))
            .collect::<Result<Vec<_>, _>>()?;
        let offline_page = resolve("offline_page", &config.offline_page)?;
        let offline_image = resolve("offline_image", &config.offline_image)?;

        let always_fetch = RegexSet::new(&config.always_fetch).map_err(|e| ConfigError::Invalid {
            field: "always_fetch".into(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            version: config.version.clone(),
            origin,
            offline_manifest,
            offline_page,
            offline_image,
            always_fetch,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Name of a namespace's store under the current version.
    pub fn store_name(&self, namespace: StoreNamespace) -> String {
        store_name(&self.version, namespace)
    }

    /// Absolute URLs cached at install time, in manifest order.
    pub fn offline_manifest(&self) -> &[Url] {
        &self.offline_manifest
    }

    pub fn offline_page(&self) -> &Url {
        &self.offline_page
    }

    pub fn offline_image(&self) -> &Url {
        &self.offline_image
    }

    /// Whether the URL is on the always-fetch deny-list.
    pub fn should_always_fetch(&self, url: &Url) -> bool {
        self.always_fetch.is_match(url.as_str())
    }

    /// Whether the URL names an image by extension.
    pub fn looks_like_image(&self, url: &Url) -> bool {
        IMAGE_URL.is_match(url.as_str())
    }
}
