//! Push protocol session.
//!
//! Each round a router pushes one filter per neighbor, built from what it
//! advertises to that neighbor. On receipt the neighbor builds a filter of
//! the entries it learned from the sender, takes the difference, and peels
//! it into routes to add and routes to withdraw.
//!
//! ```text
//! Router A                                   Router B
//!   encode(advert_for_neighbor(B))
//!   |-------- PushedFilter { seq } ----------->|
//!   |                                  encode(advert_learned_from(A))
//!   |                                  difference(sender, local)
//!   |                                  decode -> added / withdrawn
//! ```

use std::collections::HashMap;
use std::time::Duration;

use routerecon_core::{
    decode, decode_filter, difference, encode, filter_bytes, DecodeStats, Name, RouteEntry,
    DEFAULT_CELL_COUNT,
};

use crate::error::{Result, SyncError};
use crate::messages::{limits, AdvertMessage, NodeId, PROTOCOL_VERSION};
use crate::source::AdvertSource;
use crate::transport::Transport;

/// Configuration for push behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Cells per filter. Must match every neighbor.
    pub cell_count: usize,
    /// Timeout for waiting for peer messages.
    pub message_timeout: Duration,
    /// Largest filter payload accepted or sent. Never more than
    /// [`limits::MAX_PAYLOAD_BYTES`].
    pub max_payload_bytes: usize,
    /// Whether decoded differences are written back to the route source.
    pub reconcile_on_receive: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cell_count: DEFAULT_CELL_COUNT,
            message_timeout: Duration::from_secs(30),
            max_payload_bytes: 64 * 1024,
            reconcile_on_receive: true,
        }
    }
}

impl SessionConfig {
    /// The payload limit actually enforced.
    pub fn payload_limit(&self) -> usize {
        self.max_payload_bytes.min(limits::MAX_PAYLOAD_BYTES)
    }
}

/// Result of one push round.
#[derive(Debug, Default)]
pub struct PushReport {
    /// Sequence number carried by this round.
    pub seq: u64,
    /// Neighbors a filter was delivered to.
    pub sent: Vec<Name>,
    /// Neighbors skipped because they were unreachable or the send failed.
    pub failed: Vec<Name>,
    /// Total payload bytes sent.
    pub bytes_sent: usize,
}

/// Result of handling one pushed filter.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// The neighbor that pushed the filter.
    pub from: Name,
    /// The neighbor's sequence number.
    pub seq: u64,
    /// Entries the neighbor advertises that were missing locally.
    pub added: Vec<RouteEntry>,
    /// Entries learned from the neighbor that it no longer advertises.
    pub withdrawn: Vec<RouteEntry>,
    /// Decoder counters.
    pub stats: DecodeStats,
    /// Entries changed in the route source.
    pub applied: usize,
    /// Whether the difference decoded completely.
    pub success: bool,
    /// Error message if decoding failed.
    pub error: Option<String>,
}

/// Push session state.
pub struct PushSession<S: AdvertSource, T: Transport> {
    /// The local routing table.
    source: S,
    /// The transport layer.
    transport: T,
    /// Configuration.
    config: SessionConfig,
    /// Our advertisement sequence number.
    seq: u64,
    /// Configured neighbors, in the order they were added.
    neighbors: Vec<(NodeId, Name)>,
    /// Latest sequence number handled per neighbor.
    latest_seq: HashMap<NodeId, u64>,
}

impl<S: AdvertSource, T: Transport> PushSession<S, T> {
    /// Create a new push session.
    pub fn new(source: S, transport: T, config: SessionConfig) -> Self {
        Self {
            source,
            transport,
            config,
            seq: 0,
            neighbors: Vec::new(),
            latest_seq: HashMap::new(),
        }
    }

    /// Set the neighbors filters are pushed to and accepted from.
    pub fn with_neighbors(mut self, neighbors: impl IntoIterator<Item = Name>) -> Self {
        for name in neighbors {
            let id = NodeId::from_name(&name);
            if !self.neighbors.iter().any(|(n, _)| n == &id) {
                self.neighbors.push((id, name));
            }
        }
        self
    }

    /// The route source backing this session.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Our current advertisement sequence number.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Push one filter to every configured neighbor.
    ///
    /// A neighbor that cannot be reached is logged and skipped.
    pub async fn push_to_neighbors(&mut self) -> Result<PushReport> {
        self.seq += 1;
        let mut report = PushReport {
            seq: self.seq,
            ..Default::default()
        };

        for (id, name) in &self.neighbors {
            let advert = self.source.advert_for_neighbor(name).await?;
            let filter = encode(&advert, self.config.cell_count);
            let payload = filter_bytes(&filter);

            tracing::info!(
                neighbor = %name,
                entries = advert.len(),
                bytes = payload.len(),
                "advert size"
            );

            if payload.len() > self.config.payload_limit() {
                tracing::warn!(
                    neighbor = %name,
                    bytes = payload.len(),
                    limit = self.config.payload_limit(),
                    "filter payload over limit, skipping"
                );
                report.failed.push(name.clone());
                continue;
            }

            if !self.transport.is_reachable(id).await {
                tracing::warn!(neighbor = %name, "neighbor unreachable, skipping");
                report.failed.push(name.clone());
                continue;
            }

            let size = payload.len();
            let msg = AdvertMessage::PushedFilter {
                node_id: self.transport.local_node_id(),
                protocol_version: PROTOCOL_VERSION,
                seq: self.seq,
                payload,
            };

            match self.transport.push(id, msg).await {
                Ok(()) => {
                    report.sent.push(name.clone());
                    report.bytes_sent += size;
                }
                Err(e) => {
                    tracing::warn!(neighbor = %name, error = %e, "push failed");
                    report.failed.push(name.clone());
                }
            }
        }

        Ok(report)
    }

    /// Reconcile against a filter pushed by `from`.
    ///
    /// Structural problems (bad version, oversized or malformed payload,
    /// unknown sender, mismatched cell count) are errors. A difference that
    /// does not fully decode is reported with `success == false` and
    /// whatever entries were recovered before peeling stalled.
    pub async fn handle_pushed(&mut self, from: &NodeId, message: AdvertMessage) -> Result<ReconcileReport> {
        message.validate_limits()?;

        let (node_id, protocol_version, seq, payload) = match message {
            AdvertMessage::PushedFilter {
                node_id,
                protocol_version,
                seq,
                payload,
            } => (node_id, protocol_version, seq, payload),
            AdvertMessage::Error { code, message } => {
                return Err(SyncError::PeerError { code, message });
            }
        };

        if protocol_version != PROTOCOL_VERSION {
            return Err(SyncError::VersionMismatch {
                local: PROTOCOL_VERSION,
                peer: protocol_version,
            });
        }
        if payload.len() > self.config.payload_limit() {
            return Err(SyncError::PayloadTooLarge {
                size: payload.len(),
                limit: self.config.payload_limit(),
            });
        }
        if &node_id != from {
            return Err(SyncError::InvalidMessage(
                "PushedFilter node_id does not match sender".into(),
            ));
        }

        let neighbor = self
            .neighbors
            .iter()
            .find(|(id, _)| id == from)
            .map(|(_, name)| name.clone())
            .ok_or(SyncError::UnknownNeighbor(*from))?;

        if let Some(&latest) = self.latest_seq.get(from) {
            if seq <= latest {
                tracing::debug!(neighbor = %neighbor, seq, latest, "old advertisement");
                return Err(SyncError::StaleAdvert {
                    from: *from,
                    seq,
                    latest,
                });
            }
        }

        let sender = decode_filter(&payload)?;
        let learned = self.source.advert_learned_from(&neighbor).await?;
        let local = encode(&learned, self.config.cell_count);
        let mut diff = difference(&sender, &local)?;

        self.latest_seq.insert(*from, seq);

        let mut report = ReconcileReport {
            from: neighbor.clone(),
            seq,
            ..Default::default()
        };

        match decode(&mut diff) {
            Ok(decoded) => {
                report.added = decoded.added;
                report.withdrawn = decoded.withdrawn;
                report.stats = decoded.stats;
                report.success = true;
            }
            Err(e) => {
                tracing::error!(neighbor = %neighbor, seq, error = %e, "failed to decode difference");
                report.error = Some(e.to_string());
                if let Some(partial) = e.into_partial() {
                    report.added = partial.added;
                    report.withdrawn = partial.withdrawn;
                    report.stats = partial.stats;
                }
            }
        }

        tracing::info!(
            neighbor = %neighbor,
            seq,
            added = report.added.len(),
            withdrawn = report.withdrawn.len(),
            success = report.success,
            "decoded pushed advertisement"
        );

        if self.config.reconcile_on_receive && report.success {
            report.applied = self
                .source
                .apply(&neighbor, &report.added, &report.withdrawn)
                .await?;
        }

        Ok(report)
    }

    /// Wait for the next message and handle it.
    ///
    /// A refused push is answered with an [`AdvertMessage::Error`] before
    /// the error is returned.
    pub async fn receive_next(&mut self) -> Result<ReconcileReport> {
        let timeout = self.config.message_timeout;
        let Some(delivery) = self.transport.next_delivery(timeout).await? else {
            return Err(SyncError::Timeout("waiting for PushedFilter".into()));
        };

        let from = delivery.from;
        match self.handle_pushed(&from, delivery.message).await {
            Ok(report) => Ok(report),
            Err(e) => {
                self.reject(&from, &e).await;
                Err(e)
            }
        }
    }

    async fn reject(&self, peer: &NodeId, error: &SyncError) {
        let Some(code) = error.advert_code() else {
            return;
        };
        tracing::warn!(peer = %peer, error = %error, "refusing pushed filter");

        let reply = AdvertMessage::rejection(code, error.to_string());
        if let Err(e) = self.transport.push(peer, reply).await {
            tracing::debug!(peer = %peer, error = %e, "could not deliver refusal");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::AdvertErrorCode;
    use crate::source::MemoryRouteTable;
    use crate::transport::memory::{MemoryNetwork, MemoryTransport};

    fn name(uri: &str) -> Name {
        uri.parse().unwrap()
    }

    fn entry(dest: &str, nh: &str, cost: u64) -> RouteEntry {
        RouteEntry::parse(dest, nh, cost).unwrap()
    }

    fn config() -> SessionConfig {
        SessionConfig {
            message_timeout: Duration::from_millis(200),
            ..Default::default()
        }
    }

    async fn session(
        network: &std::sync::Arc<MemoryNetwork>,
        local: &str,
        neighbors: &[&str],
    ) -> PushSession<MemoryRouteTable, MemoryTransport> {
        let local = name(local);
        let transport = network.attach(NodeId::from_name(&local)).await;
        PushSession::new(MemoryRouteTable::new(local), transport, config())
            .with_neighbors(neighbors.iter().map(|n| name(n)))
    }

    #[tokio::test]
    async fn test_push_increments_seq_and_reports() {
        let network = MemoryNetwork::new();
        let mut a = session(&network, "/ndn/router-a", &["/ndn/router-b", "/ndn/router-c"]).await;
        let _b = session(&network, "/ndn/router-b", &["/ndn/router-a"]).await;
        network.link_all().await;

        let report = a.push_to_neighbors().await.unwrap();
        assert_eq!(report.seq, 1);
        assert_eq!(report.sent, vec![name("/ndn/router-b")]);
        assert_eq!(report.failed, vec![name("/ndn/router-c")]);
        assert!(report.bytes_sent > 0);

        let report = a.push_to_neighbors().await.unwrap();
        assert_eq!(report.seq, 2);
        assert_eq!(a.seq(), 2);
    }

    #[tokio::test]
    async fn test_push_and_reconcile() {
        let network = MemoryNetwork::new();
        let mut b = session(&network, "/ndn/router-b", &["/ndn/router-a"]).await;
        let mut a = session(&network, "/ndn/router-a", &["/ndn/router-b"]).await;
        network.link_all().await;

        b.source().insert(entry("/ndn/edu/ucla", "/ndn/router-x", 1)).unwrap();
        b.source().insert(entry("/ndn/edu/arizona", "/ndn/router-x", 2)).unwrap();
        // A still holds a route B no longer advertises.
        a.source().insert(entry("/ndn/edu/wustl", "/ndn/router-b", 2)).unwrap();

        b.push_to_neighbors().await.unwrap();
        let report = a.receive_next().await.unwrap();

        assert!(report.success);
        assert_eq!(report.from, name("/ndn/router-b"));
        assert_eq!(report.seq, 1);
        assert_eq!(report.added.len(), 2);
        assert!(report.added.contains(&entry("/ndn/edu/ucla", "/ndn/router-b", 1)));
        assert!(report.added.contains(&entry("/ndn/edu/arizona", "/ndn/router-b", 2)));
        assert_eq!(report.withdrawn, vec![entry("/ndn/edu/wustl", "/ndn/router-b", 2)]);
        assert_eq!(report.applied, 3);

        let learned = a.source().advert_learned_from(&name("/ndn/router-b")).await.unwrap();
        assert_eq!(learned.len(), 2);

        // Second round: nothing left to reconcile.
        b.push_to_neighbors().await.unwrap();
        let report = a.receive_next().await.unwrap();
        assert!(report.success);
        assert!(report.added.is_empty() && report.withdrawn.is_empty());
        assert_eq!(report.applied, 0);
    }

    #[tokio::test]
    async fn test_stale_advert_rejected() {
        let network = MemoryNetwork::new();
        let mut a = session(&network, "/ndn/router-a", &["/ndn/router-b"]).await;
        let b_id = NodeId::from_name(&name("/ndn/router-b"));
        let payload = filter_bytes(&routerecon_core::Filter::new(DEFAULT_CELL_COUNT));

        let msg = |seq| AdvertMessage::PushedFilter {
            node_id: b_id,
            protocol_version: PROTOCOL_VERSION,
            seq,
            payload: payload.clone(),
        };

        assert!(a.handle_pushed(&b_id, msg(5)).await.unwrap().success);
        let err = a.handle_pushed(&b_id, msg(5)).await.unwrap_err();
        assert!(matches!(err, SyncError::StaleAdvert { seq: 5, latest: 5, .. }));
        assert!(a.handle_pushed(&b_id, msg(6)).await.is_ok());
    }

    #[tokio::test]
    async fn test_rejects_bad_messages() {
        let network = MemoryNetwork::new();
        let mut a = session(&network, "/ndn/router-a", &["/ndn/router-b"]).await;
        let b_id = NodeId::from_name(&name("/ndn/router-b"));
        let payload = filter_bytes(&routerecon_core::Filter::new(DEFAULT_CELL_COUNT));

        let err = a
            .handle_pushed(
                &b_id,
                AdvertMessage::PushedFilter {
                    node_id: b_id,
                    protocol_version: PROTOCOL_VERSION + 1,
                    seq: 1,
                    payload: payload.clone(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::VersionMismatch { .. }));

        let stranger = NodeId::random();
        let err = a
            .handle_pushed(
                &stranger,
                AdvertMessage::PushedFilter {
                    node_id: stranger,
                    protocol_version: PROTOCOL_VERSION,
                    seq: 1,
                    payload: payload.clone(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::UnknownNeighbor(_)));

        let err = a
            .handle_pushed(
                &b_id,
                AdvertMessage::PushedFilter {
                    node_id: b_id,
                    protocol_version: PROTOCOL_VERSION,
                    seq: 1,
                    payload: vec![0xFF, 0x00],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Payload(_)));

        let err = a
            .handle_pushed(
                &b_id,
                AdvertMessage::PushedFilter {
                    node_id: b_id,
                    protocol_version: PROTOCOL_VERSION,
                    seq: 1,
                    payload: Vec::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidMessage(_)));

        let small = filter_bytes(&routerecon_core::Filter::new(10));
        let err = a
            .handle_pushed(
                &b_id,
                AdvertMessage::PushedFilter {
                    node_id: b_id,
                    protocol_version: PROTOCOL_VERSION,
                    seq: 1,
                    payload: small,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Filter(_)));
    }

    #[tokio::test]
    async fn test_payload_cap_overrides_config() {
        let network = MemoryNetwork::new();
        let local = name("/ndn/router-a");
        let transport = network.attach(NodeId::from_name(&local)).await;
        let config = SessionConfig {
            max_payload_bytes: 4 << 20,
            ..config()
        };
        assert_eq!(config.payload_limit(), limits::MAX_PAYLOAD_BYTES);

        let mut a = PushSession::new(MemoryRouteTable::new(local), transport, config)
            .with_neighbors([name("/ndn/router-b")]);
        let b_id = NodeId::from_name(&name("/ndn/router-b"));

        let err = a
            .handle_pushed(
                &b_id,
                AdvertMessage::PushedFilter {
                    node_id: b_id,
                    protocol_version: PROTOCOL_VERSION,
                    seq: 1,
                    payload: vec![0u8; 3 << 20],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::PayloadTooLarge { size, limit }
                if size == 3 << 20 && limit == limits::MAX_PAYLOAD_BYTES
        ));
    }

    #[tokio::test]
    async fn test_refused_push_is_answered() {
        let network = MemoryNetwork::new();
        let mut a = session(&network, "/ndn/router-a", &["/ndn/router-b"]).await;
        let mut b = session(&network, "/ndn/router-b", &["/ndn/router-a"]).await;
        network.link_all().await;
        let a_id = NodeId::from_name(&name("/ndn/router-a"));
        let b_id = NodeId::from_name(&name("/ndn/router-b"));

        b.transport
            .push(
                &a_id,
                AdvertMessage::PushedFilter {
                    node_id: b_id,
                    protocol_version: PROTOCOL_VERSION + 1,
                    seq: 1,
                    payload: vec![0x80],
                },
            )
            .await
            .unwrap();

        let err = a.receive_next().await.unwrap_err();
        assert!(matches!(err, SyncError::VersionMismatch { .. }));

        let err = b.receive_next().await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::PeerError {
                code: AdvertErrorCode::VersionMismatch,
                ..
            }
        ));

        // A refusal is not answered in turn.
        assert!(matches!(a.receive_next().await, Err(SyncError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_receive_timeout() {
        let network = MemoryNetwork::new();
        let mut a = session(&network, "/ndn/router-a", &["/ndn/router-b"]).await;
        assert!(matches!(a.receive_next().await, Err(SyncError::Timeout(_))));
    }
}
