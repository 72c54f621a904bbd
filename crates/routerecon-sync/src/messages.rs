//! Push protocol message types.
//!
//! Each router periodically pushes one filter per neighbor. The payload is
//! the canonical filter encoding from `routerecon_core::filter_bytes`.

use std::fmt;

use serde::{Deserialize, Serialize};

use routerecon_core::Name;

use crate::error::{Result, SyncError};

/// Unique identifier for a node in the push network.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub [u8; 32]);

impl NodeId {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive the identifier of a router from its name.
    pub fn from_name(name: &Name) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"routerecon-node-v0:");
        hasher.update(name.to_string().as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Generate a random node ID.
    pub fn random() -> Self {
        use rand::Rng;
        Self(rand::thread_rng().gen())
    }

    /// Hex of the full identifier.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self)
    }
}

/// Current protocol version.
pub const PROTOCOL_VERSION: u8 = 0;

/// Message size limits.
pub mod limits {
    /// Hard cap on a filter payload. A larger configured limit is clamped
    /// to this.
    pub const MAX_PAYLOAD_BYTES: usize = 1 << 20;
    /// Max length of an error message text.
    pub const MAX_ERROR_MESSAGE: usize = 1024;
}

/// Push protocol messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AdvertMessage {
    /// A filter of the sender's advertisement to the receiver.
    PushedFilter {
        /// The sender's identity.
        node_id: NodeId,
        /// Protocol version for compatibility checking.
        protocol_version: u8,
        /// The sender's advertisement sequence number.
        seq: u64,
        /// Canonical filter bytes.
        payload: Vec<u8>,
    },

    /// Why the receiver refused a push.
    Error {
        /// Error code for programmatic handling.
        code: AdvertErrorCode,
        /// Human-readable description.
        message: String,
    },
}

impl AdvertMessage {
    /// Check the message against the protocol's hard limits.
    pub fn validate_limits(&self) -> Result<()> {
        match self {
            AdvertMessage::PushedFilter { payload, .. } => {
                if payload.is_empty() {
                    return Err(SyncError::InvalidMessage("empty filter payload".into()));
                }
                if payload.len() > limits::MAX_PAYLOAD_BYTES {
                    return Err(SyncError::PayloadTooLarge {
                        size: payload.len(),
                        limit: limits::MAX_PAYLOAD_BYTES,
                    });
                }
            }
            AdvertMessage::Error { message, .. } => {
                if message.len() > limits::MAX_ERROR_MESSAGE {
                    return Err(SyncError::InvalidMessage("error message too long".into()));
                }
            }
        }
        Ok(())
    }

    /// A refusal carrying `message`, cut to fit [`limits::MAX_ERROR_MESSAGE`].
    pub fn rejection(code: AdvertErrorCode, message: impl Into<String>) -> Self {
        let mut message = message.into();
        while message.len() > limits::MAX_ERROR_MESSAGE {
            message.pop();
        }
        AdvertMessage::Error { code, message }
    }
}

/// Error codes for the push protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum AdvertErrorCode {
    /// The message was well-formed CBOR but broke a protocol rule.
    InvalidMessage = 0,
    /// Protocol version mismatch.
    VersionMismatch = 1,
    /// Payload too large.
    PayloadTooLarge = 2,
    /// Filter payload could not be parsed.
    MalformedFilter = 3,
    /// Sender is not a configured neighbor.
    UnknownNeighbor = 4,
    /// The receiver failed to read its own routing table.
    InternalError = 5,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pushed(payload: Vec<u8>) -> AdvertMessage {
        AdvertMessage::PushedFilter {
            node_id: NodeId([0u8; 32]),
            protocol_version: PROTOCOL_VERSION,
            seq: 1,
            payload,
        }
    }

    #[test]
    fn test_node_id_from_name_is_stable() {
        let a: Name = "/ndn/router-a".parse().unwrap();
        let b: Name = "/ndn/router-b".parse().unwrap();
        assert_eq!(NodeId::from_name(&a), NodeId::from_name(&a));
        assert_ne!(NodeId::from_name(&a), NodeId::from_name(&b));
    }

    #[test]
    fn test_node_id_display() {
        let id = NodeId::from_bytes([0xAB; 32]);
        assert_eq!(id.to_string(), "abababababababab");
        assert_eq!(id.to_hex().len(), 64);
    }

    #[test]
    fn test_message_limits_valid() {
        assert!(pushed(vec![0x80]).validate_limits().is_ok());
    }

    #[test]
    fn test_message_limits_exceeded() {
        let err = pushed(vec![0u8; limits::MAX_PAYLOAD_BYTES + 1]).validate_limits().unwrap_err();
        assert!(matches!(
            err,
            SyncError::PayloadTooLarge { limit: limits::MAX_PAYLOAD_BYTES, .. }
        ));
        assert!(matches!(
            pushed(Vec::new()).validate_limits(),
            Err(SyncError::InvalidMessage(_))
        ));

        let msg = AdvertMessage::Error {
            code: AdvertErrorCode::InvalidMessage,
            message: "x".repeat(limits::MAX_ERROR_MESSAGE + 1),
        };
        assert!(msg.validate_limits().is_err());
    }

    #[test]
    fn test_rejection_fits_limits() {
        let msg = AdvertMessage::rejection(
            AdvertErrorCode::MalformedFilter,
            "é".repeat(limits::MAX_ERROR_MESSAGE),
        );
        assert!(msg.validate_limits().is_ok());
        match msg {
            AdvertMessage::Error { code, message } => {
                assert_eq!(code, AdvertErrorCode::MalformedFilter);
                assert_eq!(message.len(), limits::MAX_ERROR_MESSAGE);
            }
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[test]
    fn test_message_cbor_roundtrip() {
        let msg = pushed(vec![0x80]);
        let mut buf = Vec::new();
        ciborium::into_writer(&msg, &mut buf).unwrap();
        let back: AdvertMessage = ciborium::from_reader(buf.as_slice()).unwrap();

        match back {
            AdvertMessage::PushedFilter { seq, payload, .. } => {
                assert_eq!(seq, 1);
                assert_eq!(payload, vec![0x80]);
            }
            other => panic!("expected PushedFilter, got {:?}", other),
        }
    }
}
