//! # Routerecon
//!
//! Reconcile routing tables between neighboring routers by exchanging
//! fixed-size invertible Bloom filters instead of full route lists.
//!
//! ## Overview
//!
//! - **Encode**: a router's advertisement to a neighbor becomes a filter
//!   of a fixed number of cells, whatever the table size
//! - **Difference**: the receiver subtracts a filter of what it learned
//!   from the sender; only entries on one side survive
//! - **Decode**: peeling recovers those entries as routes to add and
//!   routes to withdraw, or reports that the difference was too large
//!
//! ## Usage
//!
//! ```rust,no_run
//! use routerecon::{Reconciler, ReconcilerConfig};
//! use routerecon::sync::MemoryRouteTable;
//! use routerecon::core::{Name, RouteEntry};
//!
//! async fn example() -> routerecon::Result<()> {
//!     let a: Name = "/ndn/router-a".parse()?;
//!     let b: Name = "/ndn/router-b".parse()?;
//!
//!     let table_b = MemoryRouteTable::new(b.clone());
//!     table_b.insert(RouteEntry::parse("/ndn/edu/ucla", "/ndn/router-x", 1)?)?;
//!     let router_b = Reconciler::new(table_b, ReconcilerConfig::default());
//!
//!     let router_a = Reconciler::new(MemoryRouteTable::new(a.clone()), ReconcilerConfig::default());
//!
//!     // B pushes its advertisement to A; A decodes and applies it.
//!     let payload = router_b.advert_payload(&a).await?;
//!     let decoded = router_a.reconcile_payload(&b, &payload).await?;
//!     router_a.apply(&b, &decoded).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `routerecon::core` - Entries, canonical encoding, filters, decoder
//! - `routerecon::sync` - Push protocol, transports, route sources

pub mod error;
pub mod reconciler;

// Re-export component crates
pub use routerecon_core as core;
pub use routerecon_sync as sync;

// Re-export main types for convenience
pub use error::{ReconError, Result};
pub use reconciler::{Reconciler, ReconcilerConfig, SharedSource};

// Re-export commonly used core types
pub use routerecon_core::{
    decode, difference, encode, Cell, DecodeError, DecodeStats, Decoded, Filter, FilterError,
    HashIndexer, Name, RouteEntry, DEFAULT_CELL_COUNT,
};
