//! Chain decomposition
//!
//! Nodes whose degree is not 2 are chain boundaries. Every chain starts at a
//! boundary and follows the run of degree-2 nodes until it reaches the next
//! boundary. A run that comes back to its own start is a closed cycle chain.
//! Components with no boundary at all (plain rings) become one closed chain
//! starting at their lowest node. Boundaries and their neighbors are visited
//! in ascending id order.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::layout_graph::{LayoutGraph, NodeId};

/// One step along a chain, in walking order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainLink {
    pub from: NodeId,
    pub to: NodeId,
}

impl ChainLink {
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self { from, to }
    }

    pub fn reversed(self) -> Self {
        Self::new(self.to, self.from)
    }

    /// Endpoints in ascending order
    pub fn normalized(&self) -> (NodeId, NodeId) {
        (self.from.min(self.to), self.from.max(self.to))
    }
}

/// An ordered run of edges where each link starts where the previous ended
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    links: Vec<ChainLink>,
}

impl Chain {
    pub fn new(links: Vec<ChainLink>) -> Self {
        Self { links }
    }

    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn start(&self) -> Option<NodeId> {
        self.links.first().map(|l| l.from)
    }

    pub fn end(&self) -> Option<NodeId> {
        self.links.last().map(|l| l.to)
    }

    /// Whether the chain ends where it started
    pub fn is_closed(&self) -> bool {
        !self.is_empty() && self.start() == self.end()
    }

    /// Nodes in walking order, start first
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.start().into_iter().collect();
        nodes.extend(self.links.iter().map(|l| l.to));
        nodes
    }

    /// The same chain walked from the other end
    pub fn reversed(&self) -> Chain {
        Chain::new(self.links.iter().rev().map(|l| l.reversed()).collect())
    }

    /// Split into consecutive fragments of at most `max_len` links
    fn split(self, max_len: usize) -> Vec<Chain> {
        if max_len == 0 || self.links.len() <= max_len {
            return vec![self];
        }
        self.links
            .chunks(max_len)
            .map(|c| Chain::new(c.to_vec()))
            .collect()
    }
}

/// Decompose the graph into edge-disjoint chains
///
/// With `max_length`, any chain longer than that is cut into fragments of
/// `max_length` links (the last one possibly shorter), keeping link order.
/// Every edge of the graph appears in exactly one returned chain.
pub fn find_chains(graph: &LayoutGraph, max_length: Option<usize>) -> Vec<Chain> {
    let mut visited: BTreeSet<(NodeId, NodeId)> = BTreeSet::new();
    let mut chains = Vec::new();

    let is_boundary = |n: NodeId| graph.degree(n) != 2;

    let walk = |start: NodeId, first: NodeId, visited: &mut BTreeSet<(NodeId, NodeId)>| {
        let mut links = Vec::new();
        let mut previous = start;
        let mut current = first;
        loop {
            let link = ChainLink::new(previous, current);
            visited.insert(link.normalized());
            links.push(link);
            if is_boundary(current) || current == start {
                break;
            }
            let next = graph
                .neighbors(current)
                .find(|&n| !visited.contains(&(current.min(n), current.max(n))));
            match next {
                Some(n) => {
                    previous = current;
                    current = n;
                }
                None => break,
            }
        }
        Chain::new(links)
    };

    for start in graph.node_ids().filter(|&n| is_boundary(n)) {
        let neighbors: Vec<NodeId> = graph.neighbors(start).collect();
        for first in neighbors {
            if !visited.contains(&(start.min(first), start.max(first))) {
                chains.push(walk(start, first, &mut visited));
            }
        }
    }

    // Rings with no boundary node
    for start in graph.node_ids() {
        let first = graph
            .neighbors(start)
            .find(|&n| !visited.contains(&(start.min(n), start.max(n))));
        if let Some(first) = first {
            chains.push(walk(start, first, &mut visited));
        }
    }

    match max_length {
        Some(max) => chains.into_iter().flat_map(|c| c.split(max)).collect(),
        None => chains,
    }
}
