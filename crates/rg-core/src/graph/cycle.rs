//! Cycle basis of the layout graph
//!
//! A depth-first spanning tree is grown from every unvisited node in
//! ascending id order, visiting neighbors in ascending order. Each back edge
//! (an edge to a node still open on the current path) closes one
//! fundamental cycle: the tree path from that ancestor down to the current
//! node.

use std::collections::{BTreeMap, BTreeSet};

use super::layout_graph::{LayoutGraph, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Open,
    Closed,
}

/// Fundamental cycles of the graph, each listed in tree-path order
///
/// Cycles with the same node set are reported once.
pub fn find_cycles(graph: &LayoutGraph) -> Vec<Vec<NodeId>> {
    let adjacency = graph.adjacency();
    let mut visits: BTreeMap<NodeId, Visit> = BTreeMap::new();
    let mut parents: BTreeMap<NodeId, NodeId> = BTreeMap::new();
    let mut seen: BTreeSet<Vec<NodeId>> = BTreeSet::new();
    let mut cycles = Vec::new();

    for &root in adjacency.keys() {
        if visits.contains_key(&root) {
            continue;
        }
        visits.insert(root, Visit::Open);
        // (node, index of the next neighbor to look at)
        let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];

        while let Some(top) = stack.last_mut() {
            let (node, cursor) = *top;
            let next = adjacency.get(&node).and_then(|s| s.iter().nth(cursor)).copied();
            top.1 += 1;

            let Some(next) = next else {
                visits.insert(node, Visit::Closed);
                stack.pop();
                continue;
            };
            if parents.get(&node) == Some(&next) {
                continue;
            }

            match visits.get(&next) {
                None => {
                    visits.insert(next, Visit::Open);
                    parents.insert(next, node);
                    stack.push((next, 0));
                }
                Some(Visit::Open) => {
                    let cycle = tree_path(&parents, next, node);
                    let mut canonical = cycle.clone();
                    canonical.sort_unstable();
                    if seen.insert(canonical) {
                        cycles.push(cycle);
                    }
                }
                // A finished descendant: its back edge to us is already recorded
                Some(Visit::Closed) => {}
            }
        }
    }

    cycles
}

/// Path from `ancestor` down to `node` along parent links
fn tree_path(parents: &BTreeMap<NodeId, NodeId>, ancestor: NodeId, node: NodeId) -> Vec<NodeId> {
    let mut path = vec![node];
    let mut current = node;
    while current != ancestor {
        match parents.get(&current) {
            Some(&parent) => {
                path.push(parent);
                current = parent;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

/// Every node lying on at least one cycle
pub fn cycle_nodes(cycles: &[Vec<NodeId>]) -> BTreeSet<NodeId> {
    cycles.iter().flatten().copied().collect()
}

/// Every edge lying on at least one cycle, as ascending endpoint pairs
pub fn cycle_edges(cycles: &[Vec<NodeId>]) -> BTreeSet<(NodeId, NodeId)> {
    let mut edges = BTreeSet::new();
    for cycle in cycles {
        for (i, &a) in cycle.iter().enumerate() {
            let b = cycle[(i + 1) % cycle.len()];
            edges.insert((a.min(b), a.max(b)));
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_from(edges: &[(NodeId, NodeId)]) -> LayoutGraph {
        let mut graph = LayoutGraph::new(1, "test");
        for &(a, b) in edges {
            graph.add_edge(a, b).unwrap();
        }
        graph
    }

    fn as_sets(cycles: &[Vec<NodeId>]) -> Vec<BTreeSet<NodeId>> {
        cycles.iter().map(|c| c.iter().copied().collect()).collect()
    }

    #[test]
    fn test_tree_has_no_cycles() {
        let graph = graph_from(&[(1, 2), (2, 3), (2, 4)]);
        assert!(find_cycles(&graph).is_empty());
    }

    #[test]
    fn test_ring() {
        let graph = graph_from(&[(1, 2), (2, 3), (3, 4), (4, 1)]);
        let cycles = find_cycles(&graph);
        assert_eq!(cycles, vec![vec![1, 2, 3, 4]]);
    }

    #[test]
    fn test_two_cycles_sharing_an_edge() {
        // 1-2-3-1 and 2-3-4-2
        let graph = graph_from(&[(1, 2), (2, 3), (3, 1), (3, 4), (4, 2)]);
        let cycles = find_cycles(&graph);
        assert_eq!(cycles.len(), 2);
        for cycle in &cycles {
            // consecutive nodes of every cycle are adjacent
            for (i, &a) in cycle.iter().enumerate() {
                let b = cycle[(i + 1) % cycle.len()];
                assert!(graph.edge(a, b).is_some(), "{:?}", cycle);
            }
        }
        assert_eq!(cycle_nodes(&cycles).len(), 4);
    }

    #[test]
    fn test_disconnected_components() {
        let graph = graph_from(&[(1, 2), (2, 3), (3, 1), (10, 11), (11, 12), (12, 10)]);
        let sets = as_sets(&find_cycles(&graph));
        assert_eq!(sets, vec![BTreeSet::from([1, 2, 3]), BTreeSet::from([10, 11, 12])]);
    }

    #[test]
    fn test_cycle_edges() {
        let edges = cycle_edges(&[vec![3, 1, 2]]);
        assert_eq!(edges, BTreeSet::from([(1, 3), (1, 2), (2, 3)]));
    }
}
