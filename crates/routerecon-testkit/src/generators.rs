//! Proptest generators for property-based testing.

use std::collections::HashSet;

use proptest::prelude::*;

use routerecon_core::{difference, encode, Decoded, Filter, Name, RouteEntry};

/// Generate a name component.
pub fn component() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,11}".prop_map(String::from)
}

/// Generate a name of one to four components.
pub fn name() -> impl Strategy<Value = Name> {
    prop::collection::vec(component(), 1..=4)
        .prop_map(|components| Name::from_components(components).expect("generated components are valid"))
}

/// Generate a path cost.
pub fn cost() -> impl Strategy<Value = u64> {
    prop_oneof![0u64..=16, any::<u64>()]
}

/// Generate a route entry.
pub fn route_entry() -> impl Strategy<Value = RouteEntry> {
    (name(), name(), cost()).prop_map(|(destination, next_hop, cost)| RouteEntry::new(destination, next_hop, cost))
}

/// Generate a set of distinct entries.
pub fn entry_set(max: usize) -> impl Strategy<Value = Vec<RouteEntry>> {
    prop::collection::hash_set(route_entry(), 0..=max).prop_map(|set| set.into_iter().collect())
}

/// Two route sets split into what is shared and what each side holds alone.
#[derive(Debug, Clone, Default)]
pub struct DifferenceParams {
    pub shared: Vec<RouteEntry>,
    pub sender_only: Vec<RouteEntry>,
    pub local_only: Vec<RouteEntry>,
}

impl DifferenceParams {
    /// Everything the sender holds.
    pub fn sender(&self) -> Vec<RouteEntry> {
        self.shared.iter().chain(&self.sender_only).cloned().collect()
    }

    /// Everything the local side holds.
    pub fn local(&self) -> Vec<RouteEntry> {
        self.shared.iter().chain(&self.local_only).cloned().collect()
    }

    /// Encode both sides and take their difference.
    ///
    /// Returns the difference along with the sender and local filters.
    pub fn difference_filter(&self, cell_count: usize) -> (Filter, Filter, Filter) {
        let sender = encode(&self.sender(), cell_count);
        let local = encode(&self.local(), cell_count);
        let diff = difference(&sender, &local).expect("both filters have the same non-zero cell count");
        (diff, sender, local)
    }

    /// Whether `decoded` holds exactly the one-sided entries.
    pub fn matches(&self, decoded: &Decoded) -> bool {
        same_set(&decoded.added, &self.sender_only) && same_set(&decoded.withdrawn, &self.local_only)
    }

    /// Whether every decoded entry belongs on the side it was classified to.
    pub fn is_consistent(&self, decoded: &Decoded) -> bool {
        decoded.added.iter().all(|e| self.sender_only.contains(e))
            && decoded.withdrawn.iter().all(|e| self.local_only.contains(e))
    }
}

fn same_set(a: &[RouteEntry], b: &[RouteEntry]) -> bool {
    a.len() == b.len() && a.iter().collect::<HashSet<_>>() == b.iter().collect::<HashSet<_>>()
}

impl Arbitrary for DifferenceParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        prop::collection::hash_set(route_entry(), 0..=24)
            .prop_flat_map(|set| {
                let entries: Vec<RouteEntry> = set.into_iter().collect();
                let n = entries.len();
                // Side 0 is sender-only, 1 is local-only, the rest are shared.
                (Just(entries), prop::collection::vec(0u8..8, n))
            })
            .prop_map(|(entries, sides)| {
                let mut params = DifferenceParams::default();
                for (entry, side) in entries.into_iter().zip(sides) {
                    match side {
                        0 => params.sender_only.push(entry),
                        1 => params.local_only.push(entry),
                        _ => params.shared.push(entry),
                    }
                }
                params
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routerecon_core::{decode_filter, filter_bytes, DecodeError, DEFAULT_CELL_COUNT};

    proptest! {
        #[test]
        fn test_identical_sets_cancel(entries in entry_set(40)) {
            let f = encode(&entries, DEFAULT_CELL_COUNT);
            let mut diff = difference(&f, &f).unwrap();
            prop_assert!(diff.is_zero());

            let decoded = diff.decode().unwrap();
            prop_assert!(decoded.is_empty());
        }

        #[test]
        fn test_order_does_not_matter(entries in entry_set(20)) {
            let mut reversed = entries.clone();
            reversed.reverse();
            prop_assert_eq!(
                encode(&entries, DEFAULT_CELL_COUNT),
                encode(&reversed, DEFAULT_CELL_COUNT)
            );
        }

        #[test]
        fn test_insert_then_remove_restores(entries in entry_set(10), extra in route_entry()) {
            let mut filter = encode(&entries, DEFAULT_CELL_COUNT);
            let before = filter.clone();

            let key = extra.to_bytes();
            filter.insert_key(&key);
            filter.remove_key(&key);

            prop_assert_eq!(filter, before);
        }

        #[test]
        fn test_filter_wire_form(entries in entry_set(10)) {
            let filter = encode(&entries, DEFAULT_CELL_COUNT);
            prop_assert_eq!(decode_filter(&filter_bytes(&filter)).unwrap(), filter);
        }

        #[test]
        fn test_decode_never_misclassifies(params: DifferenceParams) {
            let (mut diff, _, _) = params.difference_filter(DEFAULT_CELL_COUNT);

            match diff.decode() {
                Ok(decoded) => prop_assert!(params.matches(&decoded)),
                Err(DecodeError::Leftover { partial, cells }) => {
                    prop_assert!(!cells.is_empty());
                    prop_assert!(params.is_consistent(&partial));
                }
                // A fake pure cell can pass the 8-bit signature check and
                // then fail to parse; that aborts the decode without a list.
                Err(DecodeError::Parse { .. }) => {}
            }
        }

        #[test]
        fn test_difference_antisymmetric(params: DifferenceParams) {
            let (forward, sender, local) = params.difference_filter(DEFAULT_CELL_COUNT);
            let backward = difference(&local, &sender).unwrap();

            for (f, b) in forward.cells().iter().zip(backward.cells()) {
                prop_assert_eq!(f.count(), -b.count());
                prop_assert_eq!(f.signature(), b.signature());
                prop_assert_eq!(f.candidate_key(), b.candidate_key());
            }
        }
    }
}
