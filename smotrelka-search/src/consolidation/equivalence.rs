//! Disjoint-set grouping of hits that share an external identifier.
//!
//! The forest is a plain parent array indexed by hit position; `find` and
//! `union` are free functions over it.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use super::identifiers::Identifiers;
use crate::registry::SourceRegistry;

/// Root of the set containing `index`, halving the path on the way up.
pub fn find(parent: &mut [usize], mut index: usize) -> usize {
    while parent[index] != index {
        parent[index] = parent[parent[index]];
        index = parent[index];
    }
    index
}

/// Merges the sets containing `a` and `b`.
pub fn union(parent: &mut [usize], a: usize, b: usize) {
    let root_a = find(parent, a);
    let root_b = find(parent, b);
    if root_a != root_b {
        let (keep, attach) = if root_a < root_b {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        parent[attach] = keep;
    }
}

/// Root index for every position, merging positions that share a value in
/// any registry, transitively across registries.
pub fn equivalence_roots(identifiers: &[Identifiers]) -> Vec<usize> {
    equivalence_roots_in_order(identifiers, &SourceRegistry::ALL)
}

pub(crate) fn equivalence_roots_in_order(
    identifiers: &[Identifiers],
    registries: &[SourceRegistry],
) -> Vec<usize> {
    let mut parent: Vec<usize> = (0..identifiers.len()).collect();

    for &registry in registries {
        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        for (index, ids) in identifiers.iter().enumerate() {
            let Some(value) = ids.get(registry) else {
                continue;
            };
            match first_seen.entry(value) {
                Entry::Occupied(entry) => union(&mut parent, *entry.get(), index),
                Entry::Vacant(entry) => {
                    entry.insert(index);
                }
            }
        }
    }

    (0..identifiers.len())
        .map(|index| find(&mut parent, index))
        .collect()
}
