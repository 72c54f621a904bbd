//! Fixed-size invertible Bloom filters over route entries.
//!
//! A filter is a dense array of [`Cell`]s. Encoding inserts every entry's
//! canonical bytes at its three home cells; the difference of two filters
//! holds exactly the entries present on one side only, which the peeling
//! decoder in [`crate::decode`] extracts.
//!
//! The cell count is a protocol constant shared by both peers. It is not
//! carried in the wire form and a mismatch cannot be detected from the
//! payload alone.

use crate::cell::Cell;
use crate::decode::{self, Decoded};
use crate::entry::RouteEntry;
use crate::error::{DecodeError, FilterError};
use crate::hash::HashIndexer;

/// Cell count used by peers that do not configure one.
pub const DEFAULT_CELL_COUNT: usize = 50;

/// An invertible Bloom filter with a fixed number of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    cells: Vec<Cell>,
}

impl Filter {
    /// A zero-valued filter of `cell_count` cells.
    pub fn new(cell_count: usize) -> Self {
        Self {
            cells: vec![Cell::default(); cell_count],
        }
    }

    /// Wrap already-built cells.
    pub fn from_cells(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// All cells in index order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// The cell at `index`, if in range.
    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// The indexer matching this filter's cell count.
    pub fn indexer(&self) -> HashIndexer {
        HashIndexer::new(self.cells.len())
    }

    /// Whether every cell count is zero.
    pub fn is_zero(&self) -> bool {
        self.cells.iter().all(Cell::is_zero)
    }

    /// Indices of cells that still hold anything, count or not.
    pub fn residual_cells(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_empty())
            .map(|(i, _)| i)
            .collect()
    }

    /// XOR `key` and `signature` into the cell at `index` and bump its count.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn insert(&mut self, index: usize, key: &[u8], signature: u64) {
        self.cells[index].insert(key, signature);
    }

    /// Undo one [`Filter::insert`] of the same key and signature.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn remove(&mut self, index: usize, key: &[u8], signature: u64) {
        self.cells[index].remove(key, signature);
    }

    /// Insert a key at all three of its home cells.
    pub fn insert_key(&mut self, key: &[u8]) {
        if self.cells.is_empty() {
            return;
        }
        let signature = HashIndexer::signature(key);
        for index in self.indexer().indices(key) {
            self.insert(index, key, signature);
        }
    }

    /// Remove a key from all three of its home cells.
    pub fn remove_key(&mut self, key: &[u8]) {
        if self.cells.is_empty() {
            return;
        }
        let signature = HashIndexer::signature(key);
        for index in self.indexer().indices(key) {
            self.remove(index, key, signature);
        }
    }

    /// Insert a route entry.
    pub fn insert_entry(&mut self, entry: &RouteEntry) {
        self.insert_key(&entry.to_bytes());
    }

    /// Peel the filter. See [`crate::decode::decode`].
    pub fn decode(&mut self) -> Result<Decoded, DecodeError> {
        decode::decode(self)
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_COUNT)
    }
}

/// Build a filter of `cell_count` cells holding every entry.
///
/// Duplicate entries accumulate; they are not collapsed.
pub fn encode<'a, I>(entries: I, cell_count: usize) -> Filter
where
    I: IntoIterator<Item = &'a RouteEntry>,
{
    let mut filter = Filter::new(cell_count);
    for entry in entries {
        filter.insert_entry(entry);
    }
    filter
}

/// Combine a peer's filter with the local one, cell by cell.
///
/// Positive counts in the result belong to entries only the sender holds;
/// negative counts to entries only the local side holds. Swapping the
/// arguments negates every count.
pub fn difference(sender: &Filter, local: &Filter) -> Result<Filter, FilterError> {
    let sender_cells = sender.cell_count();
    let local_cells = local.cell_count();

    if sender_cells == 0 || local_cells == 0 {
        tracing::error!(sender_cells, local_cells, "difference over empty filter");
        return Err(FilterError::EmptyFilter {
            sender_cells,
            local_cells,
        });
    }
    if sender_cells != local_cells {
        return Err(FilterError::CellCountMismatch {
            sender_cells,
            local_cells,
        });
    }

    let cells = sender
        .cells
        .iter()
        .zip(&local.cells)
        .map(|(s, l)| Cell::difference(s, l))
        .collect();

    Ok(Filter { cells })
}
