//! Where advertisements come from and where reconciled entries go.
//!
//! A router advertises to each neighbor every route it does not reach
//! through that neighbor, rewritten to point through itself. The receiver
//! stores what it decodes as-is, so its "learned from" set for a neighbor
//! lines up entry for entry with that neighbor's advertisement to it.

use std::sync::RwLock;

use async_trait::async_trait;

use routerecon_core::{contains, remove_first, Name, RouteEntry};

use crate::error::{Result, SyncError};

/// A router's view of its routing table, as the push protocol needs it.
#[async_trait]
pub trait AdvertSource: Send + Sync {
    /// The entries this router advertises to `neighbor`.
    async fn advert_for_neighbor(&self, neighbor: &Name) -> Result<Vec<RouteEntry>>;

    /// The local entries whose next hop is `neighbor`.
    async fn advert_learned_from(&self, neighbor: &Name) -> Result<Vec<RouteEntry>>;

    /// Install `added` and drop `withdrawn`, both learned from `neighbor`.
    ///
    /// Returns the number of entries that actually changed.
    async fn apply(
        &self,
        neighbor: &Name,
        added: &[RouteEntry],
        withdrawn: &[RouteEntry],
    ) -> Result<usize>;
}

/// In-memory routing table.
///
/// Thread-safe via RwLock. Holds a plain list of entries; the same
/// destination may appear through several next hops.
pub struct MemoryRouteTable {
    local: Name,
    routes: RwLock<Vec<RouteEntry>>,
}

impl MemoryRouteTable {
    /// Create an empty table for the router named `local`.
    pub fn new(local: Name) -> Self {
        Self {
            local,
            routes: RwLock::new(Vec::new()),
        }
    }

    /// The router this table belongs to.
    pub fn local_name(&self) -> &Name {
        &self.local
    }

    /// Add an entry. Returns false if an identical entry is already present.
    pub fn insert(&self, entry: RouteEntry) -> Result<bool> {
        let mut routes = self.write()?;
        if contains(&routes, &entry) {
            return Ok(false);
        }
        routes.push(entry);
        Ok(true)
    }

    /// Remove an entry. Returns false if it was not present.
    pub fn remove(&self, entry: &RouteEntry) -> Result<bool> {
        let mut routes = self.write()?;
        Ok(remove_first(&mut routes, entry))
    }

    /// Snapshot of every entry, in insertion order.
    pub fn entries(&self) -> Result<Vec<RouteEntry>> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<RouteEntry>>> {
        self.routes
            .read()
            .map_err(|_| SyncError::SourceError("route table lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<RouteEntry>>> {
        self.routes
            .write()
            .map_err(|_| SyncError::SourceError("route table lock poisoned".into()))
    }
}

#[async_trait]
impl AdvertSource for MemoryRouteTable {
    async fn advert_for_neighbor(&self, neighbor: &Name) -> Result<Vec<RouteEntry>> {
        let routes = self.read()?;
        let mut advert = Vec::new();
        for route in routes.iter().filter(|r| &r.next_hop != neighbor) {
            let rewritten = RouteEntry::new(route.destination.clone(), self.local.clone(), route.cost);
            if !contains(&advert, &rewritten) {
                advert.push(rewritten);
            }
        }
        Ok(advert)
    }

    async fn advert_learned_from(&self, neighbor: &Name) -> Result<Vec<RouteEntry>> {
        let routes = self.read()?;
        Ok(routes
            .iter()
            .filter(|r| &r.next_hop == neighbor)
            .cloned()
            .collect())
    }

    async fn apply(
        &self,
        neighbor: &Name,
        added: &[RouteEntry],
        withdrawn: &[RouteEntry],
    ) -> Result<usize> {
        let mut routes = self.write()?;
        let mut changed = 0;

        for entry in withdrawn {
            if &entry.next_hop != neighbor {
                tracing::warn!(neighbor = %neighbor, entry = %entry, "ignoring withdrawal through another next hop");
                continue;
            }
            if remove_first(&mut routes, entry) {
                changed += 1;
            }
        }
        for entry in added {
            if &entry.next_hop != neighbor {
                tracing::warn!(neighbor = %neighbor, entry = %entry, "ignoring route through another next hop");
                continue;
            }
            if !contains(&routes, entry) {
                routes.push(entry.clone());
                changed += 1;
            }
        }

        Ok(changed)
    }
}
