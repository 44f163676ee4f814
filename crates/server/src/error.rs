//! Adapter errors for the tether-sw server.
//!
//! Worker failures arrive as `tether_core::Error` and convert on their own;
//! these cover what only the host adapter can get wrong.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tether_client::UrlError;

use crate::host::RegistrationState;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Bad tool arguments (unparseable URL, malformed header).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A lifecycle event arrived in a registration state that cannot accept it.
    #[error("INVALID_STATE: cannot {action} while {state}")]
    InvalidState { action: &'static str, state: RegistrationState },
}

impl From<UrlError> for HostError {
    fn from(err: UrlError) -> Self {
        HostError::InvalidInput(err.to_string())
    }
}

impl From<HostError> for McpError {
    fn from(err: HostError) -> Self {
        let code = match &err {
            HostError::InvalidInput(_) => -32602,
            HostError::InvalidState { .. } => -32022,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
