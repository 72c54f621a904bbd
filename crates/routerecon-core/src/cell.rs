//! Filter cells and the right-aligned XOR they are built on.
//!
//! A cell key is treated as a big-endian value: operands of different
//! lengths are zero-extended on the left before XOR, so the stored buffer
//! grows to the longest operand and the original key is recovered by
//! stripping leading zero bytes.

use std::fmt;

/// XOR `a` and `b` after zero-extending the shorter one on the left.
pub fn xor_right_aligned(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = a.to_vec();
    xor_into(&mut out, b);
    out
}

/// In-place form of [`xor_right_aligned`].
pub fn xor_into(dst: &mut Vec<u8>, src: &[u8]) {
    if src.len() > dst.len() {
        let pad = src.len() - dst.len();
        dst.splice(0..0, std::iter::repeat(0u8).take(pad));
    }
    let offset = dst.len() - src.len();
    for (d, s) in dst[offset..].iter_mut().zip(src) {
        *d ^= s;
    }
}

/// Drop leading zero bytes left behind by right alignment.
pub fn strip_padding(key: &[u8]) -> &[u8] {
    let start = key.iter().position(|&b| b != 0).unwrap_or(key.len());
    &key[start..]
}

/// One slot of an invertible Bloom filter.
///
/// Keys compare as right-aligned values, so `[0, 0, 7]` equals `[7]`.
#[derive(Clone, Default)]
pub struct Cell {
    key: Vec<u8>,
    signature: u64,
    count: i64,
}

impl Cell {
    /// Build a cell from raw parts (used when loading a peer's filter).
    pub fn from_parts(key: Vec<u8>, signature: u64, count: i64) -> Self {
        Self {
            key,
            signature,
            count,
        }
    }

    /// The accumulated key buffer, including any padding.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The accumulated signature.
    pub fn signature(&self) -> u64 {
        self.signature
    }

    /// Net insertions minus removals at this cell.
    pub fn count(&self) -> i64 {
        self.count
    }

    /// The key with right-alignment padding removed.
    pub fn candidate_key(&self) -> &[u8] {
        strip_padding(&self.key)
    }

    /// Whether the count is zero.
    pub fn is_zero(&self) -> bool {
        self.count == 0
    }

    /// Whether nothing is left in the cell: zero count, zero signature and
    /// an all-zero key. A zero count alone can hide entries that cancelled
    /// each other out.
    pub fn is_empty(&self) -> bool {
        self.count == 0 && self.signature == 0 && self.candidate_key().is_empty()
    }

    /// Whether the count is +1 or -1.
    pub fn is_singleton(&self) -> bool {
        self.count == 1 || self.count == -1
    }

    /// Add one occurrence of `key`.
    pub(crate) fn insert(&mut self, key: &[u8], signature: u64) {
        xor_into(&mut self.key, key);
        self.signature ^= signature;
        self.count += 1;
    }

    /// Exact inverse of [`Cell::insert`].
    pub(crate) fn remove(&mut self, key: &[u8], signature: u64) {
        xor_into(&mut self.key, key);
        self.signature ^= signature;
        self.count -= 1;
    }

    /// Take a peeled entry out of the cell.
    ///
    /// `occurrence` is the count the entry was peeled with (+1 for an
    /// added entry, -1 for a withdrawn one) and is subtracted as-is, so a
    /// home cell shared with an entry of the opposite sign keeps that
    /// entry's contribution intact.
    pub(crate) fn subtract(&mut self, key: &[u8], signature: u64, occurrence: i64) {
        xor_into(&mut self.key, key);
        self.signature ^= signature;
        self.count -= occurrence;
    }

    /// Cell of a difference filter: XOR keys and signatures, subtract counts.
    pub(crate) fn difference(sender: &Cell, local: &Cell) -> Cell {
        Cell {
            key: xor_right_aligned(&sender.key, &local.key),
            signature: sender.signature ^ local.signature,
            count: sender.count - local.count,
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count
            && self.signature == other.signature
            && self.candidate_key() == other.candidate_key()
    }
}

impl Eq for Cell {}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cell(count: {}, sig: {:#x}, key: {})",
            self.count,
            self.signature,
            hex::encode(&self.key)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_xor_equal_lengths() {
        assert_eq!(xor_right_aligned(&[0xF0, 0x0F], &[0xFF, 0xFF]), vec![0x0F, 0xF0]);
    }

    #[test]
    fn test_xor_pads_on_the_left() {
        assert_eq!(xor_right_aligned(&[0x01], &[0x10, 0x02, 0x03]), vec![0x10, 0x02, 0x02]);
        assert_eq!(xor_right_aligned(&[0x10, 0x02, 0x03], &[0x01]), vec![0x10, 0x02, 0x02]);
    }

    #[test]
    fn test_xor_with_empty() {
        assert_eq!(xor_right_aligned(&[], &[0xAB, 0xCD]), vec![0xAB, 0xCD]);
        assert_eq!(xor_right_aligned(&[0xAB], &[]), vec![0xAB]);
    }

    #[test]
    fn test_xor_self_inverse_keeps_length() {
        let short = [0x12, 0x34];
        let long = [0xA3, 0x00, 0x55, 0x66];
        let once = xor_right_aligned(&short, &long);
        let twice = xor_right_aligned(&once, &long);
        assert_eq!(twice, vec![0x00, 0x00, 0x12, 0x34]);
        assert_eq!(strip_padding(&twice), &short);
    }

    #[test]
    fn test_strip_padding() {
        assert_eq!(strip_padding(&[0, 0, 1, 0, 2]), &[1, 0, 2]);
        assert_eq!(strip_padding(&[0, 0]), &[] as &[u8]);
        assert_eq!(strip_padding(&[]), &[] as &[u8]);
    }

    #[test]
    fn test_insert_remove_restores_cell() {
        let mut cell = Cell::from_parts(vec![0x05], 0x11, -2);
        let before = cell.clone();

        cell.insert(&[0xA3, 0x01, 0x02], 0x42);
        assert_eq!(cell.count(), -1);
        cell.remove(&[0xA3, 0x01, 0x02], 0x42);

        assert_eq!(cell, before);
        assert_eq!(cell.key(), &[0x00, 0x00, 0x05]);
    }

    #[test]
    fn test_subtract_by_occurrence_sign() {
        let mut pos = Cell::from_parts(vec![0x01], 0x01, 2);
        pos.subtract(&[0x01], 0x01, 1);
        assert_eq!(pos.count(), 1);

        let mut neg = Cell::from_parts(vec![0x01], 0x01, -1);
        neg.subtract(&[0x01], 0x01, -1);
        assert_eq!(neg.count(), 0);
        assert_eq!(neg.candidate_key(), &[] as &[u8]);
        assert_eq!(neg.signature(), 0);

        // An added and a withdrawn entry sharing a cell: peeling the added
        // one leaves the withdrawn one at -1.
        let mut mixed = Cell::from_parts(vec![0x01 ^ 0x02], 0x01 ^ 0x02, 0);
        mixed.subtract(&[0x01], 0x01, 1);
        assert_eq!(mixed.count(), -1);
        assert_eq!(mixed.candidate_key(), &[0x02]);
        assert_eq!(mixed.signature(), 0x02);
    }

    #[test]
    fn test_difference_cell() {
        let a = Cell::from_parts(vec![0xAA, 0x01], 0x0F, 3);
        let b = Cell::from_parts(vec![0x01], 0x0F, 5);
        let d = Cell::difference(&a, &b);
        assert_eq!(d.key(), &[0xAA, 0x00]);
        assert_eq!(d.signature(), 0);
        assert_eq!(d.count(), -2);
    }

    #[test]
    fn test_zero_count_is_not_empty() {
        assert!(Cell::default().is_empty());
        assert!(Cell::from_parts(vec![0, 0], 0, 0).is_empty());

        let residue = Cell::from_parts(vec![0x01 ^ 0x02], 0x01 ^ 0x02, 0);
        assert!(residue.is_zero());
        assert!(!residue.is_empty());
    }

    #[test]
    fn test_cell_equality_ignores_padding() {
        let a = Cell::from_parts(vec![0, 0, 7], 1, 1);
        let b = Cell::from_parts(vec![7], 1, 1);
        assert_eq!(a, b);
        assert_ne!(a, Cell::from_parts(vec![7], 1, -1));
    }

    proptest! {
        #[test]
        fn test_xor_twice_restores_value(
            a in prop::collection::vec(any::<u8>(), 0..40),
            b in prop::collection::vec(any::<u8>(), 0..40),
        ) {
            let twice = xor_right_aligned(&xor_right_aligned(&a, &b), &b);
            prop_assert_eq!(twice.len(), a.len().max(b.len()));
            prop_assert_eq!(strip_padding(&twice), strip_padding(&a));
        }

        #[test]
        fn test_xor_commutes(
            a in prop::collection::vec(any::<u8>(), 0..40),
            b in prop::collection::vec(any::<u8>(), 0..40),
        ) {
            prop_assert_eq!(xor_right_aligned(&a, &b), xor_right_aligned(&b, &a));
        }

        #[test]
        fn test_difference_of_equal_cells_is_empty(
            key in prop::collection::vec(any::<u8>(), 0..40),
            signature in any::<u64>(),
            count in -8i64..8,
        ) {
            let cell = Cell::from_parts(key, signature, count);
            prop_assert!(Cell::difference(&cell, &cell).is_empty());
        }
    }
}
