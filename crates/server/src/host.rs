//! Registration bookkeeping for the stdio host.
//!
//! The adapter plays the part of a browser: it tracks where the worker is in
//! its lifecycle, remembers a skip-waiting request, and reports the clients
//! the worker may claim.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tether_client::WorkerHost;
use tether_core::Error;

use crate::error::HostError;

/// Lifecycle position of the registered worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationState {
    /// Registered, never installed.
    Parsed,
    Installing,
    /// Installed and waiting to activate.
    Installed,
    Activating,
    /// Controlling clients; fetches are routed through the worker.
    Activated,
}

impl RegistrationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationState::Parsed => "parsed",
            RegistrationState::Installing => "installing",
            RegistrationState::Installed => "installed",
            RegistrationState::Activating => "activating",
            RegistrationState::Activated => "activated",
        }
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host side of a single worker registration.
pub struct StdioHost {
    state: Mutex<RegistrationState>,
    skip_waiting: AtomicBool,
    clients: usize,
}

impl StdioHost {
    /// A fresh registration with `clients` open pages to claim on activation.
    pub fn new(clients: usize) -> Self {
        Self { state: Mutex::new(RegistrationState::Parsed), skip_waiting: AtomicBool::new(false), clients }
    }

    pub fn state(&self) -> RegistrationState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_state(&self, next: RegistrationState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(from = %*state, to = %next, "registration state");
        *state = next;
    }

    /// Move to `next` if the current state is one of `allowed`.
    ///
    /// Returns the state that was left, so a failed phase can roll back to it.
    pub fn begin(
        &self, action: &'static str, allowed: &[RegistrationState], next: RegistrationState,
    ) -> Result<RegistrationState, HostError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = *state;
        if !allowed.contains(&previous) {
            return Err(HostError::InvalidState { action, state: previous });
        }
        tracing::debug!(from = %previous, to = %next, "registration state");
        *state = next;
        Ok(previous)
    }

    /// Whether fetches should be routed through the worker.
    pub fn is_controlling(&self) -> bool {
        self.state() == RegistrationState::Activated
    }

    /// Consume a pending skip-waiting request.
    pub fn take_skip_waiting(&self) -> bool {
        self.skip_waiting.swap(false, Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkerHost for StdioHost {
    async fn skip_waiting(&self) -> Result<(), Error> {
        self.skip_waiting.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn claim_clients(&self) -> Result<usize, Error> {
        Ok(self.clients)
    }
}
