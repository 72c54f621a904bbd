//! Delivery of pushed filters between neighboring routers.
//!
//! A push behaves like a datagram over a point-to-point link: it either
//! lands in the neighbor's mailbox right away or fails. Nothing is queued
//! behind a slow neighbor or retried; the next round carries a complete
//! advertisement anyway.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Result, SyncError};
use crate::messages::{AdvertMessage, NodeId};

/// A message and the node that pushed it.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub from: NodeId,
    pub message: AdvertMessage,
}

/// Link layer used by a push session.
#[async_trait]
pub trait Transport: Send + Sync {
    /// The identity pushes are sent under.
    fn local_node_id(&self) -> NodeId;

    /// Whether a push to `neighbor` can currently be delivered.
    async fn is_reachable(&self, neighbor: &NodeId) -> bool;

    /// Push one message to `neighbor` without waiting for room.
    async fn push(&self, neighbor: &NodeId, message: AdvertMessage) -> Result<()>;

    /// The next delivered message, or `None` if nothing arrives within `wait`.
    async fn next_delivery(&self, wait: Duration) -> Result<Option<Delivery>>;
}

/// Routers joined by in-process links, for tests and simulations.
pub mod memory {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;
    use tokio::sync::{mpsc, Mutex, RwLock};

    /// Pushes a router may hold unread before further pushes to it fail.
    pub const MAILBOX_DEPTH: usize = 16;

    fn link_key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// A set of attached routers and the links between them.
    #[derive(Default)]
    pub struct MemoryNetwork {
        mailboxes: RwLock<HashMap<NodeId, mpsc::Sender<Delivery>>>,
        links: RwLock<HashSet<(NodeId, NodeId)>>,
    }

    impl MemoryNetwork {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Attach a router. It reaches nobody until linked.
        pub async fn attach(self: &Arc<Self>, node_id: NodeId) -> MemoryTransport {
            let (tx, rx) = mpsc::channel(MAILBOX_DEPTH);
            self.mailboxes.write().await.insert(node_id, tx);

            MemoryTransport {
                node_id,
                network: Arc::clone(self),
                mailbox: Mutex::new(rx),
            }
        }

        /// Bring up the link between `a` and `b`.
        pub async fn link(&self, a: NodeId, b: NodeId) {
            self.links.write().await.insert(link_key(a, b));
        }

        /// Take the link between `a` and `b` down.
        pub async fn unlink(&self, a: NodeId, b: NodeId) {
            self.links.write().await.remove(&link_key(a, b));
        }

        /// Link every pair of attached routers.
        pub async fn link_all(&self) {
            let nodes: Vec<NodeId> = self.mailboxes.read().await.keys().copied().collect();
            let mut links = self.links.write().await;
            for (i, a) in nodes.iter().enumerate() {
                for b in &nodes[i + 1..] {
                    links.insert(link_key(*a, *b));
                }
            }
        }

        async fn is_linked(&self, a: NodeId, b: NodeId) -> bool {
            self.links.read().await.contains(&link_key(a, b))
        }
    }

    /// One router's end of a [`MemoryNetwork`].
    pub struct MemoryTransport {
        node_id: NodeId,
        network: Arc<MemoryNetwork>,
        mailbox: Mutex<mpsc::Receiver<Delivery>>,
    }

    #[async_trait]
    impl Transport for MemoryTransport {
        fn local_node_id(&self) -> NodeId {
            self.node_id
        }

        async fn is_reachable(&self, neighbor: &NodeId) -> bool {
            self.network.is_linked(self.node_id, *neighbor).await
                && self.network.mailboxes.read().await.contains_key(neighbor)
        }

        async fn push(&self, neighbor: &NodeId, message: AdvertMessage) -> Result<()> {
            if !self.network.is_linked(self.node_id, *neighbor).await {
                return Err(SyncError::TransportError(format!("no link to {}", neighbor)));
            }

            let mailboxes = self.network.mailboxes.read().await;
            let mailbox = mailboxes
                .get(neighbor)
                .ok_or_else(|| SyncError::TransportError(format!("{} is not attached", neighbor)))?;

            let delivery = Delivery {
                from: self.node_id,
                message,
            };
            mailbox.try_send(delivery).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    SyncError::TransportError(format!("mailbox of {} is full", neighbor))
                }
                mpsc::error::TrySendError::Closed(_) => {
                    SyncError::TransportError(format!("{} stopped receiving", neighbor))
                }
            })
        }

        async fn next_delivery(&self, wait: Duration) -> Result<Option<Delivery>> {
            let mut mailbox = self.mailbox.lock().await;
            match tokio::time::timeout(wait, mailbox.recv()).await {
                Ok(Some(delivery)) => Ok(Some(delivery)),
                Ok(None) => Err(SyncError::TransportError("mailbox closed".into())),
                Err(_) => Ok(None),
            }
        }
    }
}
