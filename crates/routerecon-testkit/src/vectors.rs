//! Golden test vectors for deterministic verification.
//!
//! These vectors pin canonical entry bytes, home cells and signatures for
//! 50-cell filters. Two routers only reconcile if they agree on all three.

use serde::Serialize;

use routerecon_core::{HashIndexer, RouteEntry, DEFAULT_CELL_COUNT};

/// A golden entry vector.
#[derive(Debug, Clone, Serialize)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Destination URI.
    pub destination: &'static str,
    /// Next hop URI.
    pub next_hop: &'static str,
    /// Path cost.
    pub cost: u64,
    /// Expected canonical bytes (hex).
    pub expected_bytes: &'static str,
    /// Expected home cells in a 50-cell filter.
    pub expected_indices: [usize; 3],
    /// Expected signature.
    pub expected_signature: u64,
}

impl GoldenVector {
    /// The entry this vector describes.
    pub fn entry(&self) -> RouteEntry {
        RouteEntry::parse(self.destination, self.next_hop, self.cost).expect("vector names are valid")
    }
}

/// A golden vector for raw keys.
#[derive(Debug, Clone, Serialize)]
pub struct KeyVector {
    pub key: &'static [u8],
    pub expected_indices: [usize; 3],
    pub expected_signature: u64,
}

/// Get all golden entry vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "three-component destination",
            destination: "/ndn/a/prefix",
            next_hop: "/ndn/b",
            cost: 1,
            expected_bytes: "a30083636e646e6161667072656669780182636e646e61620201",
            expected_indices: [22, 31, 18],
            expected_signature: 217,
        },
        GoldenVector {
            name: "two-component destination",
            destination: "/ndn/c",
            next_hop: "/ndn/d",
            cost: 7,
            expected_bytes: "a30082636e646e61630182636e646e61640207",
            expected_indices: [7, 25, 42],
            expected_signature: 170,
        },
        GoldenVector {
            name: "root names at zero cost",
            destination: "/",
            next_hop: "/",
            cost: 0,
            expected_bytes: "a3008001800200",
            expected_indices: [48, 31, 29],
            expected_signature: 191,
        },
        GoldenVector {
            name: "ucla via router-b",
            destination: "/ndn/edu/ucla",
            next_hop: "/ndn/router-b",
            cost: 1,
            expected_bytes: "a30083636e646e636564756475636c610182636e646e68726f757465722d620201",
            // Two seeds land on the same cell.
            expected_indices: [33, 33, 8],
            expected_signature: 34,
        },
        GoldenVector {
            name: "ucla via router-b at cost 5",
            destination: "/ndn/edu/ucla",
            next_hop: "/ndn/router-b",
            cost: 5,
            expected_bytes: "a30083636e646e636564756475636c610182636e646e68726f757465722d620205",
            expected_indices: [45, 4, 37],
            expected_signature: 6,
        },
        GoldenVector {
            name: "arizona via router-b",
            destination: "/ndn/edu/arizona",
            next_hop: "/ndn/router-b",
            cost: 2,
            expected_bytes: "a30083636e646e63656475676172697a6f6e610182636e646e68726f757465722d620202",
            expected_indices: [15, 8, 44],
            expected_signature: 190,
        },
        GoldenVector {
            name: "memphis via router-b",
            destination: "/ndn/edu/memphis",
            next_hop: "/ndn/router-b",
            cost: 3,
            expected_bytes: "a30083636e646e63656475676d656d706869730182636e646e68726f757465722d620203",
            expected_indices: [6, 6, 45],
            expected_signature: 232,
        },
        GoldenVector {
            name: "wustl via router-b",
            destination: "/ndn/edu/wustl",
            next_hop: "/ndn/router-b",
            cost: 2,
            expected_bytes: "a30083636e646e6365647565777573746c0182636e646e68726f757465722d620202",
            expected_indices: [18, 32, 46],
            expected_signature: 126,
        },
    ]
}

/// Get the raw key vectors.
pub fn key_vectors() -> Vec<KeyVector> {
    vec![
        KeyVector {
            key: b"hello",
            expected_indices: [42, 24, 35],
            expected_signature: 126,
        },
        KeyVector {
            key: b"ndn-route",
            expected_indices: [7, 34, 7],
            expected_signature: 70,
        },
    ]
}

/// Check every vector against this build.
///
/// Returns (name, matches, detail) per vector; detail describes the first
/// mismatch, or is empty.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let indexer = HashIndexer::new(DEFAULT_CELL_COUNT);

    let entries = all_vectors().into_iter().map(|v| {
        let bytes = v.entry().to_bytes();
        let hex = hex::encode(&bytes);
        let indices = indexer.indices(&bytes);
        let signature = HashIndexer::signature(&bytes);

        let detail = if hex != v.expected_bytes {
            format!("bytes {}", hex)
        } else if indices != v.expected_indices {
            format!("indices {:?}", indices)
        } else if signature != v.expected_signature {
            format!("signature {}", signature)
        } else {
            String::new()
        };
        (v.name.to_string(), detail.is_empty(), detail)
    });

    let keys = key_vectors().into_iter().map(|v| {
        let indices = indexer.indices(v.key);
        let signature = HashIndexer::signature(v.key);
        let detail = if indices != v.expected_indices {
            format!("indices {:?}", indices)
        } else if signature != v.expected_signature {
            format!("signature {}", signature)
        } else {
            String::new()
        };
        (String::from_utf8_lossy(v.key).into_owned(), detail.is_empty(), detail)
    });

    entries.chain(keys).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use routerecon_core::parse_entry;

    #[test]
    fn test_all_vectors_match() {
        for (name, ok, detail) in verify_all_vectors() {
            assert!(ok, "vector '{}' mismatched: {}", name, detail);
        }
    }

    #[test]
    fn test_vector_bytes_parse_back() {
        for vector in all_vectors() {
            let bytes = hex::decode(vector.expected_bytes).unwrap();
            assert_eq!(parse_entry(&bytes).unwrap(), vector.entry(), "vector '{}'", vector.name);
        }
    }

    #[test]
    fn test_vectors_serialize() {
        let json = serde_json::to_string(&all_vectors()).unwrap();
        assert!(json.contains("\"expected_signature\":217"));
    }
}
