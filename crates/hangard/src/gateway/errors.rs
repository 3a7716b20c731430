//! Error types for the gateway adapter.

use serde_json::{Value, json};
use thiserror::Error;

use hangar_proxy::DispatchError;

/// Failures turned into gateway responses.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request line was not a valid gateway request.
    #[error("malformed request: {reason}")]
    MalformedRequest {
        /// Parser or reader message.
        reason: String,
    },

    /// No route matches the path.
    #[error("no resource at {path}")]
    UnknownResource {
        /// Requested path.
        path: String,
    },

    /// The route exists but does not accept the method.
    #[error("method {method} is not allowed for {path}")]
    MethodNotAllowed {
        /// Requested method, as sent.
        method: String,
        /// Requested path.
        path: String,
    },

    /// A response body could not be serialised.
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),

    /// The dispatcher rejected the operation.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl GatewayError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedRequest {
            reason: reason.into(),
        }
    }

    /// Status code sent for this failure.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::MalformedRequest { .. } => 400,
            Self::UnknownResource { .. } => 404,
            Self::MethodNotAllowed { .. } => 405,
            Self::Encode(_) => 500,
            Self::Dispatch(error) => error.status(),
        }
    }

    /// Body sent for this failure.
    #[must_use]
    pub fn body(&self) -> Value {
        match self {
            Self::Dispatch(error) => error.client_body(),
            Self::Encode(_) => json!({"error": "Internal error"}),
            Self::MalformedRequest { .. }
            | Self::UnknownResource { .. }
            | Self::MethodNotAllowed { .. } => json!({"error": self.to_string()}),
        }
    }
}
