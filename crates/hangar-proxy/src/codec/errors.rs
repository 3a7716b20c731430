//! Error types for the wire codec.

use thiserror::Error;

use crate::entity::EntityError;

/// Failures while serialising a request document.
#[derive(Debug, Error)]
#[error("failed to encode {verb} request for {entity_name}: {source}")]
pub struct EncodeError {
    /// Verb of the request.
    pub verb: String,
    /// Kind named by the request.
    pub entity_name: String,
    /// Serialiser failure.
    #[source]
    pub source: serde_json::Error,
}

/// Failures while decoding a backend response document.
///
/// A backend-reported error is a failure, never an empty success.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The document's `error` field was non-empty.
    #[error("backend reported an error: {message}")]
    BackendReported {
        /// Text of the backend's `error` field.
        message: String,
    },

    /// The document was not shaped like a backend response.
    #[error("malformed backend document: {reason}")]
    MalformedDocument {
        /// What was wrong with the document.
        reason: String,
    },

    /// An entity document could not be reconstructed.
    #[error(transparent)]
    Entity(#[from] EntityError),
}

impl DecodeError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            reason: reason.into(),
        }
    }
}
