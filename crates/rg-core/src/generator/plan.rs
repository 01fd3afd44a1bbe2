//! Placement order
//!
//! Turns the chain decomposition into a flat list of placement steps. The
//! first room is the start of the longest chain that does not run into a
//! dead end. After that, chains are taken one at a time from those touching
//! an already placed node:
//! 1. chains whose two ends are both placed (they close a cycle),
//! 2. then chains that do not lead into dead ends,
//! 3. then the rest,
//! with ties going to the chain found first by the decomposer. Each chain is
//! walked from its placed end.
//!
//! Every step places exactly one room against an anchor that is already
//! placed. When the new room also has placed graph neighbors whose edge is
//! still open, those edges become closing links of the same step: the room
//! must land where it meets all of them at once.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{LayoutError, Result};
use crate::graph::{
    Chain, EdgeDirection, EdgeKey, LayoutEdge, LayoutGraph, NodeId, dead_end_nodes, find_chains,
};
use crate::layout::RoomId;

/// A connection a step must realize, seen from the room listed first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StepLink {
    /// The already placed room on the other side
    pub other: RoomId,
    pub edge: EdgeKey,
    pub direction: EdgeDirection,
    pub code: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlacementStep {
    pub target: RoomId,
    /// Link from the anchor room to `target`; None for the first room
    ///
    /// The direction is seen from the anchor.
    pub anchor: Option<StepLink>,
    /// Links from `target` to other placed rooms, seen from `target`
    pub closing: Vec<StepLink>,
    /// Position of the owning chain in processing order
    pub chain: usize,
}

/// Direction of `edge` when walked away from `from`
fn direction_from(edge: &LayoutEdge, from: NodeId) -> EdgeDirection {
    if edge.from == from {
        edge.direction
    } else {
        edge.direction.reversed()
    }
}

fn link_to(edge: &LayoutEdge, from: NodeId, other: RoomId) -> StepLink {
    StepLink {
        other,
        edge: edge.key(),
        direction: direction_from(edge, from),
        code: edge.door_code,
    }
}

/// Chains in processing order, each oriented to start at a placed node
///
/// Returns the root node and the oriented chains. Fails if some chain never
/// touches the placed part of the graph.
pub(crate) fn order_chains(graph: &LayoutGraph, chains: Vec<Chain>) -> Result<(NodeId, Vec<Chain>)> {
    let dead = dead_end_nodes(graph);
    let is_dead_end = |chain: &Chain| chain.nodes().iter().any(|n| dead.contains(n));

    let longest = |dead_ends: bool| {
        chains
            .iter()
            .filter(|c| dead_ends || !is_dead_end(c))
            .fold(None, |best: Option<&Chain>, c| match best {
                Some(b) if b.len() >= c.len() => Some(b),
                _ => Some(c),
            })
    };
    let root = match longest(false).or_else(|| longest(true)) {
        Some(chain) => chain.start(),
        None => graph.node_ids().next(),
    }
    .ok_or(LayoutError::EmptyGraph)?;

    let mut placed = BTreeSet::from([root]);
    let mut remaining: Vec<(usize, Chain)> = chains.into_iter().enumerate().collect();
    let mut ordered = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let pick = remaining
            .iter()
            .enumerate()
            .filter_map(|(slot, (index, chain))| {
                let start = chain.start().is_some_and(|n| placed.contains(&n));
                let end = chain.end().is_some_and(|n| placed.contains(&n));
                if !start && !end {
                    return None;
                }
                let rank = if start && end {
                    0
                } else if !is_dead_end(chain) {
                    1
                } else {
                    2
                };
                Some((rank, *index, slot))
            })
            .min()
            .map(|(_, _, slot)| slot);

        let Some(slot) = pick else {
            return Err(LayoutError::InvalidChainOrder(format!(
                "{} chains do not touch the placed rooms",
                remaining.len()
            )));
        };
        let (_, chain) = remaining.remove(slot);
        let chain = if chain.start().is_some_and(|n| placed.contains(&n)) {
            chain
        } else {
            chain.reversed()
        };
        placed.extend(chain.nodes());
        ordered.push(chain);
    }

    Ok((root, ordered))
}

/// Flatten the chain decomposition into placement steps
///
/// `edge_rooms` lists the edges that materialize as rooms of their own; each
/// of those is placed between its two endpoints and contributes two links.
pub(crate) fn plan_placement(
    graph: &LayoutGraph,
    edge_rooms: &BTreeSet<EdgeKey>,
    max_branch_length: Option<usize>,
) -> Result<Vec<PlacementStep>> {
    let chains = find_chains(graph, max_branch_length);
    let (root, chains) = order_chains(graph, chains)?;

    let mut steps = vec![PlacementStep {
        target: RoomId::Node(root),
        anchor: None,
        closing: Vec::new(),
        chain: 0,
    }];
    let mut placed = BTreeSet::from([root]);
    let mut realized: BTreeSet<EdgeKey> = BTreeSet::new();

    let missing_edge =
        |a: NodeId, b: NodeId| LayoutError::InvalidChainOrder(format!("no edge ({}, {})", a, b));

    for (chain_index, chain) in chains.iter().enumerate() {
        for link in chain.links() {
            let edge = graph
                .edge(link.from, link.to)
                .ok_or_else(|| missing_edge(link.from, link.to))?;
            let key = edge.key();
            if realized.contains(&key) {
                continue;
            }
            if !placed.contains(&link.from) {
                return Err(LayoutError::InvalidChainOrder(format!(
                    "chain walks from unplaced node {}",
                    link.from
                )));
            }

            let from_room = RoomId::Node(link.from);
            let to_room = RoomId::Node(link.to);
            let mut anchor = link_to(edge, link.from, from_room);

            if edge_rooms.contains(&key) {
                let edge_room = RoomId::Edge(key);
                if placed.contains(&link.to) {
                    steps.push(PlacementStep {
                        target: edge_room,
                        anchor: Some(anchor),
                        closing: vec![link_to(edge, link.from, to_room)],
                        chain: chain_index,
                    });
                    realized.insert(key);
                    continue;
                }
                steps.push(PlacementStep {
                    target: edge_room,
                    anchor: Some(anchor),
                    closing: Vec::new(),
                    chain: chain_index,
                });
                anchor.other = edge_room;
            } else if placed.contains(&link.to) {
                return Err(LayoutError::InvalidChainOrder(format!(
                    "edge ({}, {}) left open between placed nodes",
                    link.from, link.to
                )));
            }

            realized.insert(key);
            placed.insert(link.to);

            let mut closing = Vec::new();
            for neighbor in graph.neighbors(link.to) {
                let Some(other_edge) = graph.edge(link.to, neighbor) else {
                    continue;
                };
                let other_key = other_edge.key();
                if placed.contains(&neighbor)
                    && !realized.contains(&other_key)
                    && !edge_rooms.contains(&other_key)
                {
                    closing.push(link_to(other_edge, link.to, RoomId::Node(neighbor)));
                    realized.insert(other_key);
                }
            }

            steps.push(PlacementStep {
                target: to_room,
                anchor: Some(anchor),
                closing,
                chain: chain_index,
            });
        }
    }

    verify_coverage(graph, edge_rooms, &steps)?;
    Ok(steps)
}

/// Every node placed once and every edge realized by the expected number of links
fn verify_coverage(
    graph: &LayoutGraph,
    edge_rooms: &BTreeSet<EdgeKey>,
    steps: &[PlacementStep],
) -> Result<()> {
    let targets: BTreeSet<RoomId> = steps.iter().map(|s| s.target).collect();
    if targets.len() != steps.len() {
        return Err(LayoutError::InvalidChainOrder(
            "a room is placed twice".to_string(),
        ));
    }
    if let Some(node) = graph.node_ids().find(|&n| !targets.contains(&RoomId::Node(n))) {
        return Err(LayoutError::InvalidChainOrder(format!(
            "node {} is never placed",
            node
        )));
    }

    let mut links: BTreeMap<EdgeKey, usize> = BTreeMap::new();
    for step in steps {
        for link in step.anchor.iter().chain(&step.closing) {
            *links.entry(link.edge).or_default() += 1;
        }
    }
    for edge in graph.edges() {
        let key = edge.key();
        let expected = if edge_rooms.contains(&key) { 2 } else { 1 };
        let found = links.remove(&key).unwrap_or(0);
        if found != expected {
            return Err(LayoutError::InvalidChainOrder(format!(
                "edge ({}, {}) realized {} times, expected {}",
                key.from, key.to, found, expected
            )));
        }
    }
    if let Some(key) = links.keys().next() {
        return Err(LayoutError::InvalidChainOrder(format!(
            "link for unknown edge ({}, {})",
            key.from, key.to
        )));
    }
    Ok(())
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

    fn geek() -> LayoutGraph {
        graph_from(&[
            (1, 2),
            (2, 3),
            (3, 4),
            (4, 6),
            (4, 7),
            (5, 6),
            (3, 5),
            (7, 8),
            (6, 10),
            (5, 9),
            (10, 11),
            (11, 12),
            (11, 13),
            (12, 13),
        ])
    }

    fn targets(steps: &[PlacementStep]) -> Vec<RoomId> {
        steps.iter().map(|s| s.target).collect()
    }

    #[test]
    fn test_single_node_is_root_only() {
        let mut graph = LayoutGraph::new(1, "one");
        graph.add_node(4);
        let steps = plan_placement(&graph, &BTreeSet::new(), None).unwrap();
        assert_eq!(targets(&steps), vec![RoomId::Node(4)]);
        assert!(steps[0].anchor.is_none());
    }

    #[test]
    fn test_geek_order() {
        let steps = plan_placement(&geek(), &BTreeSet::new(), None).unwrap();
        let order: Vec<RoomId> = [11, 12, 13, 10, 6, 4, 3, 5, 2, 1, 7, 8, 9]
            .into_iter()
            .map(RoomId::Node)
            .collect();
        assert_eq!(targets(&steps), order);

        // 13 closes the triangle back to 11, 5 closes the square back to 6
        let closing: Vec<(RoomId, Vec<RoomId>)> = steps
            .iter()
            .filter(|s| !s.closing.is_empty())
            .map(|s| (s.target, s.closing.iter().map(|l| l.other).collect()))
            .collect();
        assert_eq!(
            closing,
            vec![
                (RoomId::Node(13), vec![RoomId::Node(11)]),
                (RoomId::Node(5), vec![RoomId::Node(6)]),
            ]
        );
    }

    #[test]
    fn test_edge_room_between_endpoints() {
        let graph = graph_from(&[(1, 2), (2, 3), (3, 1)]);
        let edge_rooms = BTreeSet::from([EdgeKey::new(1, 2), EdgeKey::new(3, 1)]);
        let steps = plan_placement(&graph, &edge_rooms, None).unwrap();
        assert_eq!(steps.len(), 5);

        let edge_room = steps
            .iter()
            .find(|s| s.target == RoomId::Edge(EdgeKey::new(3, 1)))
            .unwrap();
        // The last edge room closes the ring
        assert_eq!(edge_room.closing.len(), 1);
        assert_eq!(edge_room.closing[0].other, RoomId::Node(1));
    }

    #[test]
    fn test_link_direction_follows_walk() {
        let mut graph = graph_from(&[(2, 1), (2, 3)]);
        graph.edge_mut(2, 1).unwrap().direction = EdgeDirection::ForwardFixed;
        let steps = plan_placement(&graph, &BTreeSet::new(), None).unwrap();
        assert_eq!(steps[0].target, RoomId::Node(1));
        let to_two = steps
            .iter()
            .find(|s| s.target == RoomId::Node(2))
            .unwrap();
        // 2 is reached from 1, against the stored (2, 1) order
        assert_eq!(to_two.anchor.unwrap().direction, EdgeDirection::ReverseFixed);
    }

    #[test]
    fn test_split_chains_still_cover() {
        let graph = graph_from(&[(1, 2), (2, 3), (3, 4), (4, 5), (5, 6), (6, 1)]);
        let steps = plan_placement(&graph, &BTreeSet::new(), Some(2)).unwrap();
        assert_eq!(steps.len(), 6);
    }
}
