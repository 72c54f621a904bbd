//! Cell positions and verification signatures for filter keys.
//!
//! Every key maps to three home cells and one signature, each from an
//! independently seeded MurmurHash3 (x86, 32-bit). Seeds are fixed so two
//! peers hash the same entry identically.

use std::io::Cursor;

/// Seeds for the three position hashes.
pub const INDEX_SEEDS: [u32; 3] = [0xA1A1_A1A1, 0xB2B2_B2B2, 0xC3C3_C3C3];

/// Seed for the signature hash.
pub const SIGNATURE_SEED: u32 = 0xD4D4_D4D4;

/// Bit offset of the signature slice within the hash output.
const SIGNATURE_SHIFT: u32 = 24;
const SIGNATURE_MASK: u64 = 0xFFFF;

/// Seeded MurmurHash3 x86_32.
pub fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    let mut cursor = Cursor::new(data);
    // Reading from an in-memory cursor cannot fail.
    murmur3::murmur3_32(&mut cursor, seed).unwrap_or(0)
}

/// Maps keys onto the cells of a filter with a fixed cell count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashIndexer {
    cell_count: usize,
}

impl HashIndexer {
    /// Create an indexer for filters of `cell_count` cells.
    pub const fn new(cell_count: usize) -> Self {
        Self { cell_count }
    }

    /// The cell count this indexer maps into.
    pub const fn cell_count(&self) -> usize {
        self.cell_count
    }

    /// The three home cells of `key`. Positions may coincide.
    ///
    /// # Panics
    /// Panics if the indexer was built for zero cells.
    pub fn indices(&self, key: &[u8]) -> [usize; 3] {
        let m = self.cell_count as u64;
        INDEX_SEEDS.map(|seed| (u64::from(murmur3_32(key, seed)) % m) as usize)
    }

    /// The verification signature of `key`: bits 24..40 of the signature hash.
    pub fn signature(key: &[u8]) -> u64 {
        (u64::from(murmur3_32(key, SIGNATURE_SEED)) >> SIGNATURE_SHIFT) & SIGNATURE_MASK
    }

    /// Whether `index` is one of the home cells of `key`.
    pub fn is_home(&self, key: &[u8], index: usize) -> bool {
        self.indices(key).contains(&index)
    }
}
