//! Error types for the entity cache and its snapshots.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::entity::EntityError;

/// Failures raised by [`super::EntityCache`].
#[derive(Debug, Error)]
pub enum CacheError {
    /// A snapshot held something other than the expected kind sequences.
    #[error("cache snapshot '{path}' is corrupt: {reason}")]
    CacheCorruption {
        /// Snapshot file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// A thread panicked while holding the cache lock.
    #[error("cache lock poisoned")]
    Poisoned,

    /// Reading or writing the snapshot file failed.
    #[error("cache snapshot IO failed for '{path}': {source}")]
    SnapshotIo {
        /// Snapshot file.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },

    /// The cached entities could not be serialised.
    #[error("failed to encode cache snapshot: {0}")]
    SnapshotEncode(#[from] serde_json::Error),

    /// The persistence worker thread could not be started.
    #[error("failed to start snapshot worker: {0}")]
    Worker(#[source] io::Error),

    /// Field values did not form a valid entity.
    #[error(transparent)]
    Entity(#[from] EntityError),
}
