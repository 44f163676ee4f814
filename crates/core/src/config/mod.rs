//! Worker configuration with layered loading.
//!
//! Configuration is loaded with figment from, highest precedence first:
//!
//! 1. Environment variables (TETHER_*)
//! 2. TOML config file (if TETHER_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The loaded [`WorkerConfig`] is validated and compiled into an immutable
//! [`WorkerSettings`] that every worker component receives at construction.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod settings;
mod validation;

pub use settings::WorkerSettings;
pub use validation::ConfigError;

/// Worker configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Deployment version tag. Every store name is prefixed with it.
    ///
    /// Set via TETHER_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// Origin that relative manifest paths resolve against.
    ///
    /// Set via TETHER_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Offline manifest, cached at install time in order.
    #[serde(default = "default_offline_resources")]
    pub offline_resources: Vec<String>,

    /// Page served when a non-image request cannot be answered.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Image served when an image request cannot be answered.
    #[serde(default = "default_offline_image")]
    pub offline_image: String,

    /// Regex sources for URLs that always go to the network and never touch the cache.
    #[serde(default = "default_always_fetch")]
    pub always_fetch: Vec<String>,

    /// Path to the SQLite cache database.
    ///
    /// Set via TETHER_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Network request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_version() -> String {
    "v9000".into()
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_offline_resources() -> Vec<String> {
    vec!["/".into(), "/offline.html".into(), "/offline.svg".into()]
}

fn default_offline_page() -> String {
    "/offline.html".into()
}

fn default_offline_image() -> String {
    "/offline.svg".into()
}

fn default_always_fetch() -> Vec<String> {
    [
        r"https?://cdn\.bootcss\.com/",
        r"https?://static\.duoshuo\.com/",
        r"https?://www\.google-analytics\.com/",
        r"https?://dn-lbstatics\.qbox\.me/",
        r"https?://s\.maiyaole\.com/",
        r"https?://www\.macsen318\.com/",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./tether-cache.sqlite")
}

fn default_user_agent() -> String {
    "tether/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            origin: default_origin(),
            offline_resources: default_offline_resources(),
            offline_page: default_offline_page(),
            offline_image: default_offline_image(),
            always_fetch: default_always_fetch(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl WorkerConfig {
    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed, or
    /// if validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("TETHER_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(
            Env::prefixed("TETHER_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate and compile into the immutable form handed to the worker.
    pub fn settings(&self) -> Result<WorkerSettings, ConfigError> {
        WorkerSettings::from_config(self)
    }
}
