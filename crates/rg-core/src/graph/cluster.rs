//! Bounded neighborhood search
//!
//! Works over any ordered adjacency index, so the same traversal serves the
//! layout graph (node ids) and generated layouts (room ids). Each call owns
//! its own visited set; nothing is cached between calls.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Nodes within `max_depth` hops of `start`, including `start`
///
/// Returns an empty set if `start` is not in the index.
pub fn find_cluster<K>(adjacency: &BTreeMap<K, BTreeSet<K>>, start: K, max_depth: usize) -> BTreeSet<K>
where
    K: Ord + Copy,
{
    find_distances(adjacency, [start], max_depth)
        .into_keys()
        .collect()
}

/// The cluster of every node in the index
pub fn find_clusters<K>(adjacency: &BTreeMap<K, BTreeSet<K>>, max_depth: usize) -> BTreeMap<K, BTreeSet<K>>
where
    K: Ord + Copy,
{
    adjacency
        .keys()
        .map(|&node| (node, find_cluster(adjacency, node, max_depth)))
        .collect()
}

/// Hop distance from the nearest of `starts` to every node within `max_depth`
///
/// Starts that are not in the index are ignored.
pub fn find_distances<K, I>(adjacency: &BTreeMap<K, BTreeSet<K>>, starts: I, max_depth: usize) -> BTreeMap<K, usize>
where
    K: Ord + Copy,
    I: IntoIterator<Item = K>,
{
    let mut distances = BTreeMap::new();
    let mut queue = VecDeque::new();

    for start in starts {
        if adjacency.contains_key(&start) && !distances.contains_key(&start) {
            distances.insert(start, 0);
            queue.push_back(start);
        }
    }

    while let Some(node) = queue.pop_front() {
        let depth = distances[&node];
        if depth >= max_depth {
            continue;
        }
        for &next in adjacency.get(&node).into_iter().flatten() {
            if !distances.contains_key(&next) {
                distances.insert(next, depth + 1);
                queue.push_back(next);
            }
        }
    }

    distances
}
