//! Snapshot tree error types.

use thiserror::Error;

use crate::{EngineId, InspectError};

/// Errors returned by [`SnapshotTree`](crate::SnapshotTree) operations.
///
/// Every variant leaves the tree exactly as it was before the call.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The host is already attached under this id.
    #[error("engine already attached: {0}")]
    DuplicateEngine(EngineId),

    /// No engine with this id is attached.
    #[error("unknown engine: {0}")]
    UnknownEngine(EngineId),

    /// A host call failed while capturing an engine.
    #[error("inspection of {engine} failed: {source}")]
    Inspection {
        engine: EngineId,
        #[source]
        source: InspectError,
    },

    /// The host was dropped while still attached.
    #[error("engine dropped while attached: {0}")]
    EngineDropped(EngineId),
}

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;
