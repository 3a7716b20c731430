//! Error types for request dispatch.
//!
//! Each variant maps onto a gateway status. Backend and decoding failures
//! share one generic payload so no backend detail reaches clients.

use serde_json::{Value, json};
use thiserror::Error;

use crate::cache::CacheError;
use crate::client::ClientError;
use crate::codec::{DecodeError, EncodeError};
use crate::entity::{EntityError, EntityKind};

/// Payload returned to clients for any failed backend retrieval.
pub const RETRIEVAL_FAILED_MESSAGE: &str = "Failed to retrieve data!";

/// Failures surfaced by [`super::Dispatcher`].
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No entity of the kind has the given ID.
    #[error("{} with ID = {id} not found", .kind.route())]
    NotFound {
        /// Kind that was searched.
        kind: EntityKind,
        /// Requested ID.
        id: i64,
    },

    /// The backend answered but its response did not decode.
    #[error("failed to retrieve {kind} entities: {source}")]
    RetrievalFailed {
        /// Kind that was fetched.
        kind: EntityKind,
        /// Decoding failure, including backend-reported errors.
        #[source]
        source: DecodeError,
    },

    /// The backend exchange failed.
    #[error("backend request failed: {0}")]
    Backend(#[from] ClientError),

    /// The request document could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// A create body named a kind that is not registered.
    #[error(transparent)]
    UnknownKind(EntityError),

    /// A create body did not form a valid entity.
    #[error(transparent)]
    InvalidEntity(EntityError),

    /// The cache failed.
    #[error("cache failure: {0}")]
    Cache(CacheError),
}

impl DispatchError {
    /// Gateway status code for this failure.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::UnknownKind(_) | Self::InvalidEntity(_) => 400,
            Self::RetrievalFailed { .. } | Self::Backend(_) => 502,
            Self::Encode(_) | Self::Cache(_) => 500,
        }
    }

    /// Body sent to clients for this failure.
    ///
    /// Not-found is a plain message. Retrieval and backend failures all
    /// render as `{"error": "Failed to retrieve data!"}`.
    #[must_use]
    pub fn client_body(&self) -> Value {
        match self {
            Self::NotFound { .. } => Value::String(self.to_string()),
            Self::UnknownKind(_) | Self::InvalidEntity(_) => json!({"error": self.to_string()}),
            Self::RetrievalFailed { .. } | Self::Backend(_) => {
                json!({"error": RETRIEVAL_FAILED_MESSAGE})
            }
            Self::Encode(_) | Self::Cache(_) => json!({"error": "Internal error"}),
        }
    }
}

impl From<CacheError> for DispatchError {
    fn from(error: CacheError) -> Self {
        match error {
            CacheError::Entity(entity) => Self::InvalidEntity(entity),
            other => Self::Cache(other),
        }
    }
}
