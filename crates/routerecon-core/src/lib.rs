//! # Routerecon Core
//!
//! Pure primitives for reconciling routing tables with invertible Bloom
//! filters: route entries, their canonical encoding, filter cells, and the
//! peeling decoder.
//!
//! This crate contains no I/O and no networking. Two peers that agree on
//! the cell count can each [`encode`] their entries, exchange filters,
//! take the [`difference`], and [`decode`] it into the entries each side
//! is missing.
//!
//! ## Key Types
//!
//! - [`RouteEntry`] - A (destination, next hop, cost) triple
//! - [`Filter`] - Fixed-size array of [`Cell`]s
//! - [`HashIndexer`] - Home cells and signatures for keys
//! - [`Decoded`] - Added and withdrawn entries recovered from a difference
//!
//! ## Canonicalization
//!
//! Entries and filters are encoded as deterministic CBOR. See [`canonical`].

pub mod canonical;
pub mod cell;
pub mod decode;
pub mod entry;
pub mod error;
pub mod filter;
pub mod hash;
pub mod name;

pub use canonical::{decode_filter, entry_bytes, filter_bytes, parse_entry};
pub use cell::{strip_padding, xor_right_aligned, Cell};
pub use decode::{decode, is_pure, pure_list, DecodeStats, Decoded};
pub use entry::{contains, remove_first, RouteEntry};
pub use error::{CoreError, DecodeError, FilterError};
pub use filter::{difference, encode, Filter, DEFAULT_CELL_COUNT};
pub use hash::{murmur3_32, HashIndexer, INDEX_SEEDS, SIGNATURE_SEED};
pub use name::Name;
