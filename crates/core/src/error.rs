//! Error types for the collection index
//!
//! We use `thiserror` for automatic `Display` and `Error` implementations.
//!
//! Absence is not an error here: read-path operations return `Option` or
//! explicit result values when an id is unindexed, and the verifier
//! reports inconsistency as data. The variants below cover the loud
//! failures: an unreachable store, an unreachable source, and a
//! maintenance run that had to stop partway.

use crate::reports::RebuildStatistics;
use thiserror::Error;

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the collection index.
#[derive(Debug, Error)]
pub enum Error {
    /// The ordered-set/keyed store is unreachable. Retryable; callers on
    /// the write path should retry or surface it rather than drop the
    /// mutation, since a dropped write is exactly the drift this
    /// subsystem exists to prevent.
    #[error("index store unavailable: {0}")]
    StoreUnavailable(String),

    /// The source collection store is unreachable. Distinct from
    /// [`Error::StoreUnavailable`] so maintenance can tell "no data"
    /// apart from "could not look".
    #[error("collection source unavailable: {0}")]
    SourceUnavailable(String),

    /// The thumbnail source failed for a collection. Rebuild treats this
    /// as per-entity and continues; the entity is indexed without a
    /// cached payload.
    #[error("thumbnail source failed for {collection_id}: {detail}")]
    ThumbnailUnavailable {
        /// Collection whose thumbnail could not be fetched.
        collection_id: String,
        /// Underlying failure description.
        detail: String,
    },

    /// Configuration file was present but invalid.
    #[error("invalid index configuration: {0}")]
    InvalidConfig(String),

    /// A maintenance run stopped before completion. Carries the partial
    /// statistics so the operator sees how far it got; resuming with a
    /// ChangedOnly rebuild picks up exactly the unfinished entries.
    #[error("rebuild aborted after {} examined: {}", partial.examined, source)]
    RebuildAborted {
        /// Progress made before the abort.
        partial: Box<RebuildStatistics>,
        /// Failure that stopped the run.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Whether this error is a retryable connectivity failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::StoreUnavailable(_) | Error::SourceUnavailable(_)
        )
    }
}
