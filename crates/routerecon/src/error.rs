//! Error types for routerecon.

use routerecon_core::{CoreError, DecodeError, FilterError};
use routerecon_sync::SyncError;
use thiserror::Error;

/// Errors that can occur while reconciling route sets.
#[derive(Debug, Error)]
pub enum ReconError {
    /// Encoding or parsing error.
    #[error("encoding error: {0}")]
    Core(#[from] CoreError),

    /// Filters cannot be combined.
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    /// The difference did not decode.
    ///
    /// On leftover the partial lists are still available through
    /// [`DecodeError::partial`].
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Sync error.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),
}

impl ReconError {
    /// Whether a full-table exchange is the only way forward.
    ///
    /// True when the filter was well-formed but the difference was too
    /// large to decode; pushing the same filter again cannot help.
    pub fn needs_full_exchange(&self) -> bool {
        matches!(self, ReconError::Decode(DecodeError::Leftover { .. }))
    }
}

/// Result type for routerecon operations.
pub type Result<T> = std::result::Result<T, ReconError>;
