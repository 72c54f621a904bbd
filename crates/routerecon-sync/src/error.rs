//! Error types for the sync module.

use thiserror::Error;

use routerecon_core::{CoreError, FilterError};

use crate::messages::{AdvertErrorCode, NodeId};

/// Errors that can occur while pushing or handling filters.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Protocol version mismatch with peer.
    #[error("protocol version mismatch: local={local}, peer={peer}")]
    VersionMismatch { local: u8, peer: u8 },

    /// Message validation failed.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Filter payload exceeds the configured limit or the protocol cap.
    #[error("payload too large: {size} bytes, limit {limit}")]
    PayloadTooLarge { size: usize, limit: usize },

    /// Transport-level error.
    #[error("transport error: {0}")]
    TransportError(String),

    /// The route source failed.
    #[error("route source error: {0}")]
    SourceError(String),

    /// Filter payload could not be parsed.
    #[error("malformed payload: {0}")]
    Payload(#[from] CoreError),

    /// Sender and local filters cannot be combined.
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    /// Peer sent an error message.
    #[error("peer error ({code:?}): {message}")]
    PeerError { code: AdvertErrorCode, message: String },

    /// Message from a node that is not a configured neighbor.
    #[error("unknown neighbor: {0}")]
    UnknownNeighbor(NodeId),

    /// Advertisement older than one already handled from the same neighbor.
    #[error("stale advertisement from {from}: seq {seq}, already at {latest}")]
    StaleAdvert { from: NodeId, seq: u64, latest: u64 },

    /// Timeout waiting for peer.
    #[error("timeout: {0}")]
    Timeout(String),
}

impl SyncError {
    /// The code reported back to a peer whose push caused this error.
    ///
    /// `None` when the peer can do nothing about it: local transport
    /// trouble, an old sequence number, a timeout, or an error the peer
    /// reported itself.
    pub fn advert_code(&self) -> Option<AdvertErrorCode> {
        match self {
            SyncError::VersionMismatch { .. } => Some(AdvertErrorCode::VersionMismatch),
            SyncError::InvalidMessage(_) => Some(AdvertErrorCode::InvalidMessage),
            SyncError::PayloadTooLarge { .. } => Some(AdvertErrorCode::PayloadTooLarge),
            SyncError::Payload(_) | SyncError::Filter(_) => Some(AdvertErrorCode::MalformedFilter),
            SyncError::UnknownNeighbor(_) => Some(AdvertErrorCode::UnknownNeighbor),
            SyncError::SourceError(_) => Some(AdvertErrorCode::InternalError),
            SyncError::TransportError(_)
            | SyncError::PeerError { .. }
            | SyncError::StaleAdvert { .. }
            | SyncError::Timeout(_) => None,
        }
    }
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
