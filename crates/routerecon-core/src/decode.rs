//! Peeling decoder for difference filters.
//!
//! Decoding repeatedly finds *pure* cells (cells provably holding exactly
//! one surviving entry), extracts their entry, and subtracts it from all
//! three of its home cells, which may expose new pure cells. It stops when
//! a full scan peels nothing. If any cell still holds anything at that
//! point (a count, a signature, or key bytes) the difference exceeded what
//! the filter can resolve.
//!
//! ```text
//! Scanning ──pure cell──> Peeling ──> Scanning
//!    │
//!    └─no progress──> Done (all cells empty) | Failed (leftover cells)
//! ```
//!
//! A cell with count ±1 is only trusted if its key's recomputed signature
//! matches the stored one and the cell is one of the key's own home cells.
//! XOR accumulation can leave a cell that merely looks like a single entry
//! (a "fake pure" cell); both checks reject those.
//!
//! Decoding mutates the filter in place. Do not decode the same filter
//! from more than one place at a time; independent filters are fine.

use crate::canonical::parse_entry;
use crate::entry::{contains, remove_first, RouteEntry};
use crate::error::DecodeError;
use crate::filter::Filter;
use crate::hash::HashIndexer;

/// Upper bound on peel steps, as a multiple of the cell count.
///
/// A resolvable difference peels at most one entry per cell; the factor
/// leaves room for cancellations before the decoder gives up.
const PEEL_LIMIT_PER_CELL: usize = 4;

/// Counters collected while decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Entries extracted and subtracted from their home cells.
    pub peeled: usize,
    /// Cells skipped because the stored signature did not match the key.
    pub signature_mismatches: usize,
    /// Cells skipped because they are not a home cell of their own key.
    pub fake_pure: usize,
    /// Entries that appeared both added and withdrawn and cancelled out.
    pub cancellations: usize,
    /// Full scans over the filter.
    pub rounds: usize,
}

/// The classified difference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    /// Entries only the sender holds.
    pub added: Vec<RouteEntry>,
    /// Entries only the local side holds.
    pub withdrawn: Vec<RouteEntry>,
    /// Decoder counters.
    pub stats: DecodeStats,
}

impl Decoded {
    /// Whether both lists are empty.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.withdrawn.is_empty()
    }

    /// Record an entry extracted from a cell with the given count.
    ///
    /// An entry seen on the opposite side before cancels that occurrence
    /// instead of being recorded twice.
    fn classify(&mut self, entry: RouteEntry, count: i64) {
        let (this, other) = match count {
            1 => (&mut self.added, &mut self.withdrawn),
            -1 => (&mut self.withdrawn, &mut self.added),
            _ => return,
        };

        if remove_first(other, &entry) {
            self.stats.cancellations += 1;
        } else if !contains(this, &entry) {
            this.push(entry);
        }
    }
}

/// Whether the cell at `index` currently holds exactly one verifiable entry.
pub fn is_pure(filter: &Filter, index: usize) -> bool {
    let Some(cell) = filter.cell(index) else {
        return false;
    };
    if !cell.is_singleton() {
        return false;
    }

    let key = cell.candidate_key();
    if key.is_empty() {
        return false;
    }
    if HashIndexer::signature(key) != cell.signature() {
        return false;
    }
    filter.indexer().is_home(key, index)
}

/// Purity of every cell, in index order.
pub fn pure_list(filter: &Filter) -> Vec<bool> {
    (0..filter.cell_count()).map(|i| is_pure(filter, i)).collect()
}

/// Peel a difference filter into added and withdrawn entries.
///
/// On success every cell of `filter` is left empty. On
/// [`DecodeError::Leftover`] the entries classified so far travel with the
/// error. A pure cell whose bytes do not parse as an entry aborts the whole
/// decode with [`DecodeError::Parse`].
pub fn decode(filter: &mut Filter) -> Result<Decoded, DecodeError> {
    let indexer = filter.indexer();
    let peel_limit = filter.cell_count().saturating_mul(PEEL_LIMIT_PER_CELL);

    let mut decoded = Decoded::default();
    let mut pure = pure_list(filter);

    'scan: loop {
        decoded.stats.rounds += 1;
        let mut progressed = false;

        for i in 0..filter.cell_count() {
            if !pure[i] {
                continue;
            }

            let cell = &filter.cells()[i];
            let key = cell.candidate_key().to_vec();
            let count = cell.count();
            let stored_signature = cell.signature();

            if key.is_empty() {
                pure[i] = false;
                continue;
            }

            let entry = parse_entry(&key).map_err(|source| DecodeError::Parse { cell: i, source })?;

            let signature = HashIndexer::signature(&key);
            if stored_signature != signature {
                decoded.stats.signature_mismatches += 1;
                continue;
            }

            let homes = indexer.indices(&key);
            if !homes.contains(&i) {
                decoded.stats.fake_pure += 1;
                pure[i] = false;
                continue;
            }

            tracing::debug!(cell = i, count, entry = %entry, "peeling pure cell");
            decoded.classify(entry, count);

            for home in homes {
                filter.cells_mut()[home].subtract(&key, signature, count);
            }
            decoded.stats.peeled += 1;
            progressed = true;

            if decoded.stats.peeled >= peel_limit {
                tracing::warn!(peeled = decoded.stats.peeled, "peel limit reached, stopping");
                break 'scan;
            }

            pure = pure_list(filter);
        }

        if !progressed {
            break;
        }
    }

    // Counts alone are not enough: an added and a withdrawn entry with the
    // same home cells cancel every count while their keys remain.
    let leftover = filter.residual_cells();
    if !leftover.is_empty() {
        for &i in &leftover {
            let cell = &filter.cells()[i];
            tracing::warn!(
                cell = i,
                count = cell.count(),
                signature = cell.signature(),
                key = %hex::encode(cell.key()),
                "leftover cell"
            );
        }
        return Err(DecodeError::Leftover {
            partial: Box::new(decoded),
            cells: leftover,
        });
    }

    tracing::debug!(
        added = decoded.added.len(),
        withdrawn = decoded.withdrawn.len(),
        peeled = decoded.stats.peeled,
        signature_mismatches = decoded.stats.signature_mismatches,
        fake_pure = decoded.stats.fake_pure,
        cancellations = decoded.stats.cancellations,
        "filter decoded"
    );
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::filter::{difference, encode};

    fn entry(dest: &str, nh: &str, cost: u64) -> RouteEntry {
        RouteEntry::parse(dest, nh, cost).unwrap()
    }

    /// Home cells of this entry in a 50-cell filter are 22, 31 and 18,
    /// and its signature is 217.
    fn golden() -> RouteEntry {
        entry("/ndn/a/prefix", "/ndn/b", 1)
    }

    #[test]
    fn test_decode_zero_filter() {
        let mut filter = Filter::new(50);
        let decoded = decode(&mut filter).unwrap();
        assert!(decoded.is_empty());
        assert_eq!(decoded.stats.peeled, 0);
        assert_eq!(decoded.stats.rounds, 1);
    }

    #[test]
    fn test_decode_empty_cell_array() {
        let mut filter = Filter::new(0);
        assert!(decode(&mut filter).unwrap().is_empty());
    }

    #[test]
    fn test_decode_single_add() {
        let e = golden();
        let mut filter = encode([&e], 50);

        let decoded = decode(&mut filter).unwrap();
        assert_eq!(decoded.added, vec![e]);
        assert!(decoded.withdrawn.is_empty());
        assert_eq!(decoded.stats.peeled, 1);
        assert!(filter.is_zero());
    }

    #[test]
    fn test_decode_single_withdraw() {
        let e = golden();
        let mut filter = difference(&Filter::new(50), &encode([&e], 50)).unwrap();

        let decoded = decode(&mut filter).unwrap();
        assert!(decoded.added.is_empty());
        assert_eq!(decoded.withdrawn, vec![e]);
    }

    #[test]
    fn test_home_cell_is_pure() {
        let filter = encode([&golden()], 50);
        let pure = pure_list(&filter);
        let marked: Vec<usize> = (0..50).filter(|&i| pure[i]).collect();
        assert_eq!(marked, vec![18, 22, 31]);
    }

    #[test]
    fn test_foreign_cell_never_pure() {
        // Correct key and signature, but cell 0 is not one of its homes.
        let key = golden().to_bytes();
        let mut cells = vec![Cell::default(); 50];
        cells[0] = Cell::from_parts(key, 217, 1);
        let mut filter = Filter::from_cells(cells);

        assert!(!is_pure(&filter, 0));

        match decode(&mut filter) {
            Err(DecodeError::Leftover { partial, cells }) => {
                assert!(partial.is_empty());
                assert_eq!(cells, vec![0]);
            }
            other => panic!("expected leftover, got {:?}", other),
        }
    }

    #[test]
    fn test_tampered_signature_never_pure() {
        let key = golden().to_bytes();
        let mut cells = vec![Cell::default(); 50];
        cells[22] = Cell::from_parts(key, 217 ^ 0x01, 1);
        let mut filter = Filter::from_cells(cells);

        assert!(!is_pure(&filter, 22));
        let err = decode(&mut filter).unwrap_err();
        assert!(matches!(err, DecodeError::Leftover { ref cells, .. } if cells == &vec![22]));
    }

    #[test]
    fn test_count_two_is_not_pure() {
        let key = golden().to_bytes();
        let mut cells = vec![Cell::default(); 50];
        cells[22] = Cell::from_parts(key, 217, 2);
        let filter = Filter::from_cells(cells);
        assert!(!is_pure(&filter, 22));
    }

    #[test]
    fn test_unparseable_pure_cell_aborts() {
        // "hello" has home cells 42, 24, 35 and signature 126 but is not an entry.
        let mut cells = vec![Cell::default(); 50];
        cells[24] = Cell::from_parts(b"hello".to_vec(), 126, 1);
        let mut filter = Filter::from_cells(cells);

        assert!(is_pure(&filter, 24));
        match decode(&mut filter) {
            Err(DecodeError::Parse { cell, .. }) => assert_eq!(cell, 24),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_cancels_opposite_side() {
        let a = golden();
        let b = entry("/ndn/c", "/ndn/d", 7);
        let mut decoded = Decoded::default();

        decoded.classify(a.clone(), -1);
        decoded.classify(b.clone(), 1);
        decoded.classify(a.clone(), 1);

        assert_eq!(decoded.added, vec![b.clone()]);
        assert!(decoded.withdrawn.is_empty());
        assert_eq!(decoded.stats.cancellations, 1);

        decoded.classify(b.clone(), 1);
        assert_eq!(decoded.added, vec![b]);
    }

    #[test]
    fn test_classify_ignores_other_counts() {
        let mut decoded = Decoded::default();
        decoded.classify(golden(), 2);
        decoded.classify(golden(), 0);
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_cancelled_counts_are_leftover() {
        // Two entries whose counts cancelled in the same cell.
        let mut cells = vec![Cell::default(); 50];
        cells[3] = Cell::from_parts(vec![0x0F], 0x55, 0);
        let mut filter = Filter::from_cells(cells);

        match decode(&mut filter) {
            Err(DecodeError::Leftover { cells, .. }) => assert_eq!(cells, vec![3]),
            other => panic!("expected leftover, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_opposite_signs_sharing_cells() {
        let a = entry("/ndn/a/prefix", "/ndn/b", 1);
        let a2 = entry("/ndn/a/prefix", "/ndn/b", 2);
        let mut diff = difference(&encode([&a], 50), &encode([&a2], 50)).unwrap();

        let decoded = decode(&mut diff).unwrap();
        assert_eq!(decoded.added, vec![a]);
        assert_eq!(decoded.withdrawn, vec![a2]);
        assert_eq!(decoded.stats.cancellations, 0);
    }
}
