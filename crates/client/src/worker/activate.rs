//! Activate phase: claim clients and evict stores from other versions.

use futures_util::future::join_all;
use serde::Serialize;
use tether_core::Error;
use tether_core::cache::is_current_store;

use super::OfflineWorker;

/// Outcome of an activation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivateReport {
    /// Client pages now controlled by this worker.
    pub claimed: usize,
    /// Stale stores removed.
    pub deleted: Vec<String>,
    /// Current-version stores left in place.
    pub retained: Vec<String>,
    /// Stale stores whose deletion failed, with the error message.
    pub failed: Vec<(String, String)>,
    pub completed_at: String,
}

impl OfflineWorker {
    /// Claim open clients, then delete every store not prefixed by the current version.
    ///
    /// Deletions run concurrently and independently; a failed deletion is
    /// reported but does not stop the others.
    pub(crate) async fn run_activate(&self) -> Result<ActivateReport, Error> {
        let claimed = self.host.claim_clients().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "claiming clients failed");
            0
        });

        let version = self.settings.version();
        let (retained, stale): (Vec<String>, Vec<String>) = self
            .cache
            .keys()
            .await?
            .into_iter()
            .partition(|name| is_current_store(name, version));

        let results = join_all(stale.iter().map(|name| self.cache.delete(name))).await;

        let mut report = ActivateReport { claimed, retained, ..Default::default() };
        for (name, result) in stale.into_iter().zip(results) {
            match result {
                Ok(_) => report.deleted.push(name),
                Err(e) => {
                    tracing::warn!(store = %name, error = %e, "failed to delete stale store");
                    report.failed.push((name, e.to_string()));
                }
            }
        }
        report.completed_at = chrono::Utc::now().to_rfc3339();

        tracing::info!(
            version,
            claimed = report.claimed,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "stale stores removed"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::LifecycleHandler;
    use crate::worker::test_support::{Harness, get};
    use tether_core::{CacheStorage, Response};

    #[tokio::test]
    async fn test_activate_keeps_only_current_version() {
        let harness = Harness::new("v2").await;
        let entry = (get("/"), Response::ok("text/html", "home"));
        for store in ["v1:offline", "v1:resources", "v2:offline"] {
            harness.db.put(store, &entry.0, &entry.1).await.unwrap();
        }

        let report = harness.worker.activate().await.unwrap();

        assert_eq!(report.deleted, vec!["v1:offline".to_string(), "v1:resources".to_string()]);
        assert_eq!(report.retained, vec!["v2:offline".to_string()]);
        assert!(report.failed.is_empty());
        assert_eq!(harness.db.keys().await.unwrap(), vec!["v2:offline".to_string()]);
    }

    #[tokio::test]
    async fn test_activate_claims_clients_first() {
        let harness = Harness::new("v2").await;
        let report = harness.worker.activate().await.unwrap();
        assert_eq!(report.claimed, 1);
        assert_eq!(harness.host.claims(), 1);
    }

    #[tokio::test]
    async fn test_activate_deletes_foreign_and_lookalike_stores() {
        let harness = Harness::new("v1").await;
        for store in ["v1:offline", "v10:offline", "legacy"] {
            harness.db.open(store).await.unwrap();
        }

        let report = harness.worker.activate().await.unwrap();
        assert_eq!(report.deleted, vec!["v10:offline".to_string(), "legacy".to_string()]);
        assert_eq!(harness.db.keys().await.unwrap(), vec!["v1:offline".to_string()]);
    }

    #[tokio::test]
    async fn test_one_failed_deletion_does_not_block_others() {
        let harness = Harness::new("v3").await;
        for store in ["v1:offline", "v2:offline", "v3:offline"] {
            harness.db.open(store).await.unwrap();
        }
        harness.cache.fail_delete("v1:offline");

        let report = harness.worker.activate().await.unwrap();
        assert_eq!(report.deleted, vec!["v2:offline".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "v1:offline");
        assert_eq!(harness.db.keys().await.unwrap(), vec!["v1:offline".to_string(), "v3:offline".to_string()]);
    }
}
