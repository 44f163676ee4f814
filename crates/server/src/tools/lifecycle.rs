//! worker_install and worker_activate tool implementations.
//!
//! Drives the registration through `installing → installed → activating →
//! activated`. A worker that asks to skip waiting during install is activated
//! in the same call.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tether_client::{ActivateReport, LifecycleHandler};

use super::{HostContext, json_result};
use crate::host::RegistrationState;

/// Output from the worker_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstallOutput {
    /// Registration state after the call.
    pub state: RegistrationState,
    /// Store populated with the offline manifest.
    pub store: String,
    /// Manifest URLs now cached.
    pub cached: Vec<String>,
    pub completed_at: String,
    /// Activation that followed a skip-waiting request, if any.
    pub activation: Option<ActivateOutput>,
}

/// Output from the worker_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ActivateOutput {
    pub state: RegistrationState,
    /// Client pages now controlled by the worker.
    pub claimed: usize,
    /// Stale stores removed.
    pub deleted: Vec<String>,
    /// Current-version stores kept.
    pub retained: Vec<String>,
    /// Stale stores that could not be removed.
    pub failed: Vec<FailedDeletion>,
    pub completed_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FailedDeletion {
    pub store: String,
    pub error: String,
}

impl ActivateOutput {
    fn new(state: RegistrationState, report: ActivateReport) -> Self {
        Self {
            state,
            claimed: report.claimed,
            deleted: report.deleted,
            retained: report.retained,
            failed: report
                .failed
                .into_iter()
                .map(|(store, error)| FailedDeletion { store, error })
                .collect(),
            completed_at: report.completed_at,
        }
    }
}

/// Implementation of the worker_install tool.
///
/// A failed install restores the previous state; the caller retries by
/// calling the tool again.
pub async fn install_impl(ctx: &HostContext) -> Result<CallToolResult, McpError> {
    let previous = ctx.host.begin(
        "install",
        &[RegistrationState::Parsed, RegistrationState::Installed, RegistrationState::Activated],
        RegistrationState::Installing,
    )?;

    let report = match ctx.worker.install().await {
        Ok(report) => report,
        Err(e) => {
            ctx.host.take_skip_waiting();
            ctx.host.set_state(previous);
            return Err(e.into());
        }
    };
    ctx.host.set_state(RegistrationState::Installed);

    let activation = if ctx.host.take_skip_waiting() { Some(activate(ctx).await?) } else { None };

    let output = InstallOutput {
        state: ctx.host.state(),
        store: report.store,
        cached: report.cached,
        completed_at: report.completed_at,
        activation,
    };
    json_result(&output)
}

/// Implementation of the worker_activate tool.
pub async fn activate_impl(ctx: &HostContext) -> Result<CallToolResult, McpError> {
    let output = activate(ctx).await?;
    json_result(&output)
}

async fn activate(ctx: &HostContext) -> Result<ActivateOutput, McpError> {
    let previous = ctx
        .host
        .begin("activate", &[RegistrationState::Installed], RegistrationState::Activating)?;

    match ctx.worker.activate().await {
        Ok(report) => {
            ctx.host.set_state(RegistrationState::Activated);
            Ok(ActivateOutput::new(RegistrationState::Activated, report))
        }
        Err(e) => {
            ctx.host.set_state(previous);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{context, output};
    use tether_core::{CacheStorage, Request};

    #[tokio::test]
    async fn test_install_activates_after_skip_waiting() {
        let (ctx, _network) = context("v2").await;
        let stale = Request::parse("GET", "http://localhost:8080/old.css").unwrap();
        ctx.cache
            .put("v1:resources", &stale, &tether_core::Response::ok("text/css", "body{}"))
            .await
            .unwrap();

        let result = install_impl(&ctx).await.unwrap();
        let out: InstallOutput = output(&result);

        assert_eq!(out.state, RegistrationState::Activated);
        assert_eq!(out.store, "v2:offline");
        assert_eq!(out.cached.len(), 3);

        let activation = out.activation.expect("skip waiting should activate");
        assert_eq!(activation.claimed, 1);
        assert_eq!(activation.deleted, vec!["v1:resources".to_string()]);
        assert_eq!(ctx.cache.keys().await.unwrap(), vec!["v2:offline".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_install_restores_state() {
        let (ctx, network) = context("v1").await;
        network.go_offline();

        let err = install_impl(&ctx).await.unwrap_err();
        assert_eq!(err.code.0, -32021);
        assert_eq!(ctx.host.state(), RegistrationState::Parsed);
        assert!(!ctx.host.take_skip_waiting());
    }

    #[tokio::test]
    async fn test_activate_requires_install() {
        let (ctx, _network) = context("v1").await;

        let err = activate_impl(&ctx).await.unwrap_err();
        assert_eq!(err.code.0, -32022);
        assert_eq!(ctx.host.state(), RegistrationState::Parsed);
    }

    #[tokio::test]
    async fn test_activate_after_plain_install() {
        let (ctx, _network) = context("v1").await;
        ctx.worker.install().await.unwrap();
        ctx.host.take_skip_waiting();
        ctx.host.set_state(RegistrationState::Installed);

        let out: ActivateOutput = output(&activate_impl(&ctx).await.unwrap());
        assert_eq!(out.state, RegistrationState::Activated);
        assert_eq!(out.retained, vec!["v1:offline".to_string()]);
        assert!(out.failed.is_empty());
    }

    #[tokio::test]
    async fn test_reinstall_from_activated() {
        let (ctx, _network) = context("v1").await;
        install_impl(&ctx).await.unwrap();

        let out: InstallOutput = output(&install_impl(&ctx).await.unwrap());
        assert_eq!(out.state, RegistrationState::Activated);
        assert_eq!(ctx.cache.count_entries("v1:offline").await.unwrap(), 3);
    }
}
