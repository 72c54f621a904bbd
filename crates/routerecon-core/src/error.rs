//! Error types for the routerecon core.

use thiserror::Error;

use crate::decode::Decoded;

/// Errors raised while encoding or parsing canonical bytes.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("malformed entry: {0}")]
    MalformedEntry(String),

    #[error("malformed filter: {0}")]
    MalformedFilter(String),

    #[error("invalid name: {0}")]
    InvalidName(String),
}

/// Structural precondition failures when combining two filters.
///
/// Non-retryable: the caller must not reconcile against a malformed
/// peer payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("empty filter: sender has {sender_cells} cells, local has {local_cells} cells")]
    EmptyFilter {
        sender_cells: usize,
        local_cells: usize,
    },

    #[error("cell count mismatch: sender has {sender_cells} cells, local has {local_cells} cells")]
    CellCountMismatch {
        sender_cells: usize,
        local_cells: usize,
    },
}

/// Failures of the peeling decoder.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A cell that passed the purity checks held bytes that are not an entry.
    ///
    /// Aborts the whole decode; no partial lists are returned.
    #[error("failed to parse entry from pure cell {cell}: {source}")]
    Parse {
        cell: usize,
        #[source]
        source: CoreError,
    },

    /// Cells remain non-zero after peeling reached a fixed point.
    ///
    /// `partial` holds everything classified before peeling stalled.
    #[error("cannot fully decode filter: {} leftover cells", cells.len())]
    Leftover { partial: Box<Decoded>, cells: Vec<usize> },
}

impl DecodeError {
    /// Entries classified before the failure, if any survive it.
    pub fn partial(&self) -> Option<&Decoded> {
        match self {
            DecodeError::Leftover { partial, .. } => Some(partial),
            DecodeError::Parse { .. } => None,
        }
    }

    /// Consume the error, keeping the partial lists.
    pub fn into_partial(self) -> Option<Decoded> {
        match self {
            DecodeError::Leftover { partial, .. } => Some(*partial),
            DecodeError::Parse { .. } => None,
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
