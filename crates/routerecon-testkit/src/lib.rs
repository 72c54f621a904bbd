//! # Routerecon Testkit
//!
//! Testing utilities for routerecon.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known entries with expected bytes, home cells and signatures
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Named routes and routers for setting up test scenarios
//!
//! ## Golden Vectors
//!
//! Golden vectors pin the hashing and canonical encoding so two peers
//! built separately agree on every filter:
//!
//! ```rust
//! use routerecon_testkit::vectors::verify_all_vectors;
//!
//! for (name, ok, detail) in verify_all_vectors() {
//!     assert!(ok, "{}: {}", name, detail);
//! }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use routerecon_testkit::generators::DifferenceParams;
//!
//! proptest! {
//!     #[test]
//!     fn decoded_lists_are_exact(params: DifferenceParams) {
//!         let (mut diff, _, _) = params.difference_filter(50);
//!         if let Ok(decoded) = diff.decode() {
//!             prop_assert!(params.matches(&decoded));
//!         }
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use routerecon_testkit::fixtures::{ucla, wustl, RouterFixture};
//!
//! let router = RouterFixture::new("/ndn/router-a").with_routes(&[ucla(), wustl()]);
//! assert_eq!(router.table.entries().unwrap().len(), 2);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{connected_sessions, site_entries, RouterFixture};
pub use generators::{route_entry, DifferenceParams};
pub use vectors::{all_vectors, key_vectors, verify_all_vectors, GoldenVector, KeyVector};
