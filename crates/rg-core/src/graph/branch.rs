//! Branch decomposition
//!
//! Splits the tree-like parts of the graph into branches. Cycle edges are
//! taken out first; every branch then starts at a cycle node (or, in a graph
//! without cycles, at the root junction) and runs outward until it reaches
//! a leaf or another cycle node. At each step the walk continues into the
//! neighbor with the most unvisited neighbors of its own, ties going to the
//! lowest id, so trunk-like runs stay together. A junction passed on the way
//! starts further branches once the current one is finished.

use std::collections::{BTreeSet, VecDeque};

use super::cycle::{cycle_edges, cycle_nodes, find_cycles};
use super::layout_graph::{LayoutGraph, NodeId};

/// Scratch state for one decomposition
struct BranchWalk<'a> {
    graph: &'a LayoutGraph,
    visited: BTreeSet<(NodeId, NodeId)>,
}

impl BranchWalk<'_> {
    fn key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
        (a.min(b), a.max(b))
    }

    fn is_open(&self, a: NodeId, b: NodeId) -> bool {
        !self.visited.contains(&Self::key(a, b))
    }

    fn open_edges(&self, node: NodeId) -> usize {
        self.graph
            .neighbors(node)
            .filter(|&n| self.is_open(node, n))
            .count()
    }

    /// Next step out of `node`: the open neighbor with the most open edges
    /// besides the one back to `node`
    fn pick_next(&self, node: NodeId) -> Option<NodeId> {
        let mut best: Option<(NodeId, usize)> = None;
        for next in self.graph.neighbors(node).filter(|&n| self.is_open(node, n)) {
            let onward = self.open_edges(next).saturating_sub(1);
            if best.is_none_or(|(_, count)| onward > count) {
                best = Some((next, onward));
            }
        }
        best.map(|(next, _)| next)
    }
}

/// Starting node for a graph without cycles
///
/// The highest-degree junction (degree 3 or more), else the lowest-id leaf.
fn tree_root(graph: &LayoutGraph) -> Option<NodeId> {
    let junction = graph
        .node_ids()
        .filter(|&n| graph.degree(n) >= 3)
        .fold(None, |best: Option<NodeId>, n| match best {
            Some(b) if graph.degree(b) >= graph.degree(n) => Some(b),
            _ => Some(n),
        });
    junction.or_else(|| graph.node_ids().find(|&n| graph.degree(n) == 1))
}

/// Decompose the non-cycle part of the graph into branches
///
/// Every edge that is not on a cycle belongs to exactly one branch. Each
/// branch is ordered from its start (cycle node or junction) outward.
pub fn find_branches(graph: &LayoutGraph) -> Vec<Vec<NodeId>> {
    let cycles = find_cycles(graph);
    let on_cycle = cycle_nodes(&cycles);
    let mut walk = BranchWalk {
        graph,
        visited: cycle_edges(&cycles),
    };

    let mut starts: VecDeque<NodeId> = if on_cycle.is_empty() {
        tree_root(graph).into_iter().collect()
    } else {
        on_cycle.iter().copied().collect()
    };

    let mut branches = Vec::new();
    while let Some(start) = starts.pop_front() {
        while let Some(first) = walk.pick_next(start) {
            let mut branch = vec![start];
            let mut current = start;
            let mut next = first;
            loop {
                walk.visited.insert(BranchWalk::key(current, next));
                branch.push(next);
                current = next;
                if on_cycle.contains(&current) {
                    break;
                }
                if walk.open_edges(current) > 1 {
                    starts.push_back(current);
                }
                match walk.pick_next(current) {
                    Some(n) => next = n,
                    None => break,
                }
            }
            branches.push(branch);
        }
    }

    branches
}

/// Nodes that only lead to dead ends
///
/// These are the nodes of branches ending in a leaf, minus the node each
/// such branch starts from.
pub fn dead_end_nodes(graph: &LayoutGraph) -> BTreeSet<NodeId> {
    find_branches(graph)
        .into_iter()
        .filter(|b| b.last().is_some_and(|&n| graph.degree(n) == 1))
        .flat_map(|b| b.into_iter().skip(1))
        .collect()
}
