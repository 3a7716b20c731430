//! Errors raised while resolving kinds and reconstructing entities.

use thiserror::Error;

/// Failures surfaced by the entity registry and record construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// No kind is registered under the given name or route.
    #[error("unknown entity kind '{name}'")]
    UnknownEntityKind {
        /// Name that failed to resolve.
        name: String,
    },

    /// A document did not match the field schema of its kind.
    #[error("malformed {kind} entity: {reason}")]
    MalformedEntity {
        /// Kind the document was meant to describe.
        kind: String,
        /// What was wrong with the document.
        reason: String,
    },
}

impl EntityError {
    pub(crate) fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownEntityKind { name: name.into() }
    }

    pub(crate) fn malformed(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedEntity {
            kind: kind.into(),
            reason: reason.into(),
        }
    }
}
