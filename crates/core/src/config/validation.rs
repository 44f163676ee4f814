//! Configuration validation rules.

use crate::cache::naming::SEPARATOR;
use crate::config::WorkerConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid { field: field.into(), reason: reason.into() }
    }
}

impl WorkerConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `version` is empty or contains the store-name separator
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `offline_page` or `offline_image` is not part of `offline_resources`
    ///
    /// Returns `ConfigError::Missing` if `offline_resources` is empty.
    /// Origin and pattern syntax are checked when compiling settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.is_empty() {
            return Err(ConfigError::invalid("version", "must not be empty"));
        }
        if self.version.contains(SEPARATOR) {
            return Err(ConfigError::invalid("version", format!("must not contain '{SEPARATOR}'")));
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::invalid("user_agent", "must not be empty"));
        }

        if self.offline_resources.is_empty() {
            return Err(ConfigError::Missing {
                field: "offline_resources".into(),
                hint: "list at least the offline page and image".into(),
            });
        }
        for (field, asset) in [("offline_page", &self.offline_page), ("offline_image", &self.offline_image)] {
            if !self.offline_resources.contains(asset) {
                return Err(ConfigError::invalid(field, format!("{asset} is not listed in offline_resources")));
            }
        }

        if self.always_fetch.is_empty() {
            tracing::debug!("always_fetch is empty; every request is eligible for caching");
        }

        Ok(())
    }
}
