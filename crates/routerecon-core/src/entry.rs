//! Route advertisement entries and the list helpers used while classifying
//! decoded entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::canonical::{entry_bytes, parse_entry};
use crate::error::CoreError;
use crate::name::Name;

/// One advertised route: reach `destination` through `next_hop` at `cost`.
#[derive(Clone, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// The advertised prefix.
    pub destination: Name,
    /// The router the advertisement points through.
    pub next_hop: Name,
    /// Path cost.
    pub cost: u64,
}

impl RouteEntry {
    /// Create a new entry.
    pub fn new(destination: Name, next_hop: Name, cost: u64) -> Self {
        Self {
            destination,
            next_hop,
            cost,
        }
    }

    /// Convenience constructor from URI strings.
    pub fn parse(destination: &str, next_hop: &str, cost: u64) -> Result<Self, CoreError> {
        Ok(Self::new(Name::from_uri(destination)?, Name::from_uri(next_hop)?, cost))
    }

    /// Canonical bytes, used as the filter key.
    pub fn to_bytes(&self) -> Vec<u8> {
        entry_bytes(self)
    }

    /// Parse canonical bytes back into an entry.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        parse_entry(bytes)
    }
}

// Field-wise comparison; cost participates, so two entries for the same
// route at different costs are distinct.
impl PartialEq for RouteEntry {
    fn eq(&self, other: &Self) -> bool {
        self.destination == other.destination
            && self.next_hop == other.next_hop
            && self.cost == other.cost
    }
}

impl Hash for RouteEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.destination.hash(state);
        self.next_hop.hash(state);
        self.cost.hash(state);
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RouteEntry({} via {} cost {})", self.destination, self.next_hop, self.cost)
    }
}

impl fmt::Display for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "destination: {}, nexthop: {}, cost: {}", self.destination, self.next_hop, self.cost)
    }
}

/// Whether `list` holds an entry equal to `target`.
pub fn contains(list: &[RouteEntry], target: &RouteEntry) -> bool {
    list.iter().any(|e| e == target)
}

/// Remove the first entry equal to `target`, keeping the order of the rest.
///
/// Returns true if an entry was removed.
pub fn remove_first(list: &mut Vec<RouteEntry>, target: &RouteEntry) -> bool {
    match list.iter().position(|e| e == target) {
        Some(i) => {
            list.remove(i);
            true
        }
        None => false,
    }
}
