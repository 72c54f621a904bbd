//! # Routerecon Sync
//!
//! Push protocol for reconciling routing tables between neighboring
//! routers.
//!
//! ## Overview
//!
//! Each round a router encodes, per neighbor, the routes it advertises to
//! that neighbor into a fixed-size filter and pushes it. The receiver
//! encodes the routes it learned from the sender, subtracts the two
//! filters, and decodes the difference into routes to add and routes to
//! withdraw. Only the filter crosses the wire, so its size does not depend
//! on the size of the routing table.
//!
//! ## Key Properties
//!
//! - **Stateless rounds**: every push carries the full advertisement
//! - **Ordered**: a filter older than one already handled is rejected
//! - **Bounded**: payload size is fixed by the cell count
//!
//! ## Usage
//!
//! ```rust,no_run
//! use routerecon_sync::{MemoryNetwork, MemoryRouteTable, NodeId, PushSession, SessionConfig};
//!
//! async fn example() -> routerecon_sync::Result<()> {
//!     let local: routerecon_core::Name = "/ndn/router-a".parse().unwrap();
//!     let neighbor: routerecon_core::Name = "/ndn/router-b".parse().unwrap();
//!
//!     let network = MemoryNetwork::new();
//!     let transport = network.attach(NodeId::from_name(&local)).await;
//!     network.link(NodeId::from_name(&local), NodeId::from_name(&neighbor)).await;
//!     let table = MemoryRouteTable::new(local);
//!
//!     let mut session = PushSession::new(table, transport, SessionConfig::default())
//!         .with_neighbors([neighbor]);
//!
//!     let report = session.push_to_neighbors().await?;
//!     println!("pushed seq {} to {} neighbors", report.seq, report.sent.len());
//!
//!     let reconciled = session.receive_next().await?;
//!     println!("{} added, {} withdrawn", reconciled.added.len(), reconciled.withdrawn.len());
//!     Ok(())
//! }
//! ```

pub mod convergence;
pub mod error;
pub mod messages;
pub mod protocol;
pub mod source;
pub mod transport;

pub use convergence::{route_set_digest, verify_convergence, ConvergenceResult, RouteSetDigest};
pub use error::{Result, SyncError};
pub use messages::{limits, AdvertErrorCode, AdvertMessage, NodeId, PROTOCOL_VERSION};
pub use protocol::{PushReport, PushSession, ReconcileReport, SessionConfig};
pub use source::{AdvertSource, MemoryRouteTable};
pub use transport::{memory::MemoryNetwork, memory::MemoryTransport, Delivery, Transport};
