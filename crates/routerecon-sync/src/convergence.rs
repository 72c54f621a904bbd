//! Convergence verification for the push protocol.
//!
//! After a round, a router can check that what it learned from a neighbor
//! matches what that neighbor advertises to it by comparing digests of the
//! two route sets, without exchanging the sets themselves.

use std::collections::HashSet;

use routerecon_core::{Name, RouteEntry};

use crate::error::Result;
use crate::source::AdvertSource;

/// Order-independent digest of a set of route entries.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteSetDigest(pub [u8; 32]);

impl RouteSetDigest {
    /// Hex of the digest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for RouteSetDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RouteSetDigest({})", self.to_hex())
    }
}

/// Compute the digest of a route set.
///
/// Algorithm:
/// 1. Hash each distinct entry's canonical bytes with Blake3
/// 2. XOR the entry hashes together
/// 3. Return Blake3(domain || xor || count)
///
/// Duplicates are counted once and input order does not matter.
pub fn route_set_digest(entries: &[RouteEntry]) -> RouteSetDigest {
    let distinct: HashSet<&RouteEntry> = entries.iter().collect();

    let mut acc = [0u8; 32];
    for entry in &distinct {
        let h = blake3::hash(&entry.to_bytes());
        for (a, b) in acc.iter_mut().zip(h.as_bytes()) {
            *a ^= b;
        }
    }

    let mut hasher = blake3::Hasher::new();
    hasher.update(b"routerecon-routes-v0:");
    hasher.update(&acc);
    hasher.update(&(distinct.len() as u64).to_le_bytes());
    RouteSetDigest(*hasher.finalize().as_bytes())
}

/// Verify that what we learned from `neighbor` matches its advertisement.
///
/// `remote` is the digest of the neighbor's advertisement to us.
pub async fn verify_convergence<S: AdvertSource>(
    source: &S,
    neighbor: &Name,
    remote: &RouteSetDigest,
) -> Result<ConvergenceResult> {
    let learned = source.advert_learned_from(neighbor).await?;
    let local = route_set_digest(&learned);

    if &local == remote {
        Ok(ConvergenceResult::Converged)
    } else {
        Ok(ConvergenceResult::NotConverged {
            local,
            remote: *remote,
        })
    }
}

/// Result of convergence verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvergenceResult {
    /// Both sides hold the same route set.
    Converged,
    /// The sets differ (may need more push rounds).
    NotConverged {
        local: RouteSetDigest,
        remote: RouteSetDigest,
    },
}

impl ConvergenceResult {
    /// Check if the sets have converged.
    pub fn is_converged(&self) -> bool {
        matches!(self, ConvergenceResult::Converged)
    }
}
