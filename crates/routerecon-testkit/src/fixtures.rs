//! Test fixtures and helpers.
//!
//! Common setup code for integration tests. The named routes all point
//! through `/ndn/router-b`, as router A would hold them after learning
//! them from B.

use std::time::Duration;

use routerecon_core::{Name, RouteEntry};
use routerecon_sync::{MemoryNetwork, MemoryRouteTable, MemoryTransport, NodeId, PushSession, SessionConfig};

/// Next hop shared by the named routes.
pub const ROUTER_B: &str = "/ndn/router-b";

fn via_b(destination: &str, cost: u64) -> RouteEntry {
    RouteEntry::parse(destination, ROUTER_B, cost).expect("fixture names are valid")
}

/// `/ndn/edu/ucla` via router B at cost 1.
pub fn ucla() -> RouteEntry {
    via_b("/ndn/edu/ucla", 1)
}

/// `/ndn/edu/arizona` via router B at cost 2.
pub fn arizona() -> RouteEntry {
    via_b("/ndn/edu/arizona", 2)
}

/// `/ndn/edu/memphis` via router B at cost 3.
pub fn memphis() -> RouteEntry {
    via_b("/ndn/edu/memphis", 3)
}

/// `/ndn/edu/wustl` via router B at cost 2.
pub fn wustl() -> RouteEntry {
    via_b("/ndn/edu/wustl", 2)
}

/// The ucla route after its cost changed to 5.
pub fn ucla_rerouted() -> RouteEntry {
    via_b("/ndn/edu/ucla", 5)
}

/// `count` distinct routes `/ndn/site-{i}/prefix` via router A.
pub fn site_entries(count: usize) -> Vec<RouteEntry> {
    (0..count)
        .map(|i| {
            RouteEntry::parse(
                &format!("/ndn/site-{}/prefix", i),
                "/ndn/router-a",
                (i % 5 + 1) as u64,
            )
            .expect("fixture names are valid")
        })
        .collect()
}

/// A router name with an in-memory routing table.
pub struct RouterFixture {
    pub name: Name,
    pub table: MemoryRouteTable,
}

impl RouterFixture {
    /// Create a router with an empty table.
    pub fn new(uri: &str) -> Self {
        let name = Name::from_uri(uri).expect("fixture names are valid");
        Self {
            table: MemoryRouteTable::new(name.clone()),
            name,
        }
    }

    /// Add routes to the table.
    pub fn with_routes(self, routes: &[RouteEntry]) -> Self {
        for route in routes {
            self.table.insert(route.clone()).expect("memory table accepts inserts");
        }
        self
    }

    /// This router's transport identity.
    pub fn node_id(&self) -> NodeId {
        NodeId::from_name(&self.name)
    }
}

/// Config with a short timeout for tests.
pub fn test_config() -> SessionConfig {
    SessionConfig {
        message_timeout: Duration::from_millis(500),
        ..Default::default()
    }
}

/// One push session per router, fully meshed over a memory network.
pub async fn connected_sessions(
    routers: Vec<RouterFixture>,
) -> Vec<PushSession<MemoryRouteTable, MemoryTransport>> {
    let network = MemoryNetwork::new();
    let names: Vec<Name> = routers.iter().map(|r| r.name.clone()).collect();

    let mut sessions = Vec::with_capacity(routers.len());
    for router in routers {
        let transport = network.attach(router.node_id()).await;
        let neighbors: Vec<Name> = names.iter().filter(|n| **n != router.name).cloned().collect();
        sessions.push(PushSession::new(router.table, transport, test_config()).with_neighbors(neighbors));
    }
    network.link_all().await;
    sessions
}
