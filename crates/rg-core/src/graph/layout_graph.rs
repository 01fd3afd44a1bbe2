//! Layout graph: rooms as nodes, required connections as edges

use std::collections::{BTreeMap, BTreeSet};

use rg_rng::RandomStream;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use super::cluster::find_cluster;
use crate::error::{LayoutError, Result};
use crate::room::DoorType;

/// Node identifier
pub type NodeId = u32;

/// RGBA display color
pub type Color = [u8; 4];

/// Color used when a node or edge does not set one
pub const DEFAULT_COLOR: Color = [128, 128, 128, 255];

/// Identity of an edge, as the (from, to) pair it was added with
///
/// An edge is unique per unordered pair: the graph never holds both
/// (a, b) and (b, a).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey {
    pub from: NodeId,
    pub to: NodeId,
}

impl EdgeKey {
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self { from, to }
    }

    /// Endpoints in ascending order
    pub fn normalized(&self) -> (NodeId, NodeId) {
        (self.from.min(self.to), self.from.max(self.to))
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.from == node || self.to == node
    }

    /// The endpoint that is not `node`
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if self.from == node {
            Some(self.to)
        } else if self.to == node {
            Some(self.from)
        } else {
            None
        }
    }
}

/// Which way an edge may be traversed, relative to its (from, to) order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, Serialize, Deserialize,
)]
pub enum EdgeDirection {
    /// Two-way passage on both sides
    #[default]
    Both,
    /// Forward one-way allowed, two-way also accepted
    ForwardFlexible,
    /// Strictly one-way from `from` to `to`
    ForwardFixed,
    /// Reverse one-way allowed, two-way also accepted
    ReverseFlexible,
    /// Strictly one-way from `to` to `from`
    ReverseFixed,
}

impl EdgeDirection {
    /// The same constraint seen from the other endpoint
    pub fn reversed(self) -> Self {
        match self {
            EdgeDirection::Both => EdgeDirection::Both,
            EdgeDirection::ForwardFlexible => EdgeDirection::ReverseFlexible,
            EdgeDirection::ForwardFixed => EdgeDirection::ReverseFixed,
            EdgeDirection::ReverseFlexible => EdgeDirection::ForwardFlexible,
            EdgeDirection::ReverseFixed => EdgeDirection::ForwardFixed,
        }
    }

    /// Whether the door on the `from` side may have this type
    ///
    /// The `to` side door must then align with it (see
    /// [`DoorType::aligns_with`]).
    pub fn allows_from_door(self, door_type: DoorType) -> bool {
        let two_way = matches!(
            door_type,
            DoorType::TwoWay | DoorType::TwoWayExit | DoorType::TwoWayEntrance
        );
        match self {
            EdgeDirection::Both => two_way,
            EdgeDirection::ForwardFlexible => two_way || door_type == DoorType::OneWayExit,
            EdgeDirection::ForwardFixed => door_type == DoorType::OneWayExit,
            EdgeDirection::ReverseFlexible => two_way || door_type == DoorType::OneWayEntrance,
            EdgeDirection::ReverseFixed => door_type == DoorType::OneWayEntrance,
        }
    }
}

/// A node of the layout graph; always becomes one room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutNode {
    pub id: NodeId,
    pub name: String,
    /// Template group the room is drawn from
    pub template_group: String,
    /// Layer the room is placed on
    pub z: i32,
    pub color: Color,
    pub tags: Vec<String>,
}

impl LayoutNode {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            name: format!("Node {}", id),
            template_group: String::new(),
            z: 0,
            color: DEFAULT_COLOR,
            tags: Vec::new(),
        }
    }

    pub fn with_template_group(mut self, group: impl Into<String>) -> Self {
        self.template_group = group.into();
        self
    }
}

/// An edge of the layout graph; may materialize as its own room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub name: String,
    /// Template group used when the edge becomes a room
    pub template_group: String,
    /// Layer of the edge room
    pub z: i32,
    pub color: Color,
    /// Door code both doors of this connection must carry
    pub door_code: u32,
    pub direction: EdgeDirection,
    /// Probability of materializing as an edge room
    pub room_chance: f32,
    /// Always materialize as an edge room
    pub require_room: bool,
}

impl LayoutEdge {
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self {
            from,
            to,
            name: format!("Edge ({}, {})", from, to),
            template_group: String::new(),
            z: 0,
            color: DEFAULT_COLOR,
            door_code: 0,
            direction: EdgeDirection::Both,
            room_chance: 0.0,
            require_room: false,
        }
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.from, self.to)
    }

    /// Whether this edge can ever become a room
    pub fn may_become_room(&self) -> bool {
        self.require_room || self.room_chance > 0.0
    }
}

/// The abstract connectivity graph a layout is generated from
///
/// Nodes and edges serialize as sequences (JSON map keys must be strings);
/// the adjacency index is not written and is rebuilt on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GraphRecord")]
pub struct LayoutGraph {
    pub id: u32,
    pub name: String,
    #[serde(serialize_with = "serialize_values")]
    nodes: BTreeMap<NodeId, LayoutNode>,
    #[serde(serialize_with = "serialize_values")]
    edges: BTreeMap<EdgeKey, LayoutEdge>,
    #[serde(skip)]
    neighbors: BTreeMap<NodeId, BTreeSet<NodeId>>,
    node_variations: BTreeMap<String, BTreeSet<NodeId>>,
}

fn serialize_values<K, V, S>(map: &BTreeMap<K, V>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    V: Serialize,
    S: serde::Serializer,
{
    serializer.collect_seq(map.values())
}

/// Serialized form of a [`LayoutGraph`]
#[derive(Deserialize)]
struct GraphRecord {
    id: u32,
    name: String,
    nodes: Vec<LayoutNode>,
    edges: Vec<LayoutEdge>,
    #[serde(default)]
    node_variations: BTreeMap<String, BTreeSet<NodeId>>,
}

impl TryFrom<GraphRecord> for LayoutGraph {
    type Error = LayoutError;

    /// Rebuild the graph, rejecting repeated ids and edges to unknown nodes
    fn try_from(record: GraphRecord) -> Result<Self> {
        let mut graph = LayoutGraph::new(record.id, record.name);
        for node in record.nodes {
            if graph.nodes.contains_key(&node.id) {
                return Err(LayoutError::DuplicateId(format!("node {}", node.id)));
            }
            graph.neighbors.entry(node.id).or_default();
            graph.nodes.insert(node.id, node);
        }
        for edge in record.edges {
            if let Some(missing) = [edge.from, edge.to]
                .into_iter()
                .find(|id| !graph.nodes.contains_key(id))
            {
                return Err(LayoutError::InvalidId(format!(
                    "node {} of edge ({}, {})",
                    missing, edge.from, edge.to
                )));
            }
            if edge.from == edge.to || graph.existing_key(edge.from, edge.to).is_some() {
                return Err(LayoutError::DuplicateId(format!(
                    "edge ({}, {})",
                    edge.from, edge.to
                )));
            }
            for (a, b) in [(edge.from, edge.to), (edge.to, edge.from)] {
                graph.neighbors.entry(a).or_default().insert(b);
            }
            graph.edges.insert(edge.key(), edge);
        }
        for (group, nodes) in record.node_variations {
            graph.add_node_variation(group, nodes)?;
        }
        Ok(graph)
    }
}

impl LayoutGraph {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a node, or return the existing one
    pub fn add_node(&mut self, id: NodeId) -> &mut LayoutNode {
        self.neighbors.entry(id).or_default();
        self.nodes.entry(id).or_insert_with(|| LayoutNode::new(id))
    }

    /// Add an edge, creating missing endpoints, or return the existing one
    ///
    /// An existing edge is returned whichever way round it was added.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> Result<&mut LayoutEdge> {
        if from == to {
            return Err(LayoutError::DuplicateId(format!(
                "edge from node {} to itself",
                from
            )));
        }
        self.add_node(from);
        self.add_node(to);

        let key = self.existing_key(from, to).unwrap_or(EdgeKey::new(from, to));
        if let Some(set) = self.neighbors.get_mut(&from) {
            set.insert(to);
        }
        if let Some(set) = self.neighbors.get_mut(&to) {
            set.insert(from);
        }
        Ok(self
            .edges
            .entry(key)
            .or_insert_with(|| LayoutEdge::new(from, to)))
    }

    /// Remove a node and every edge touching it
    pub fn remove_node(&mut self, id: NodeId) -> Option<LayoutNode> {
        let node = self.nodes.remove(&id)?;
        let adjacent: Vec<NodeId> = self
            .neighbors
            .remove(&id)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
        for other in adjacent {
            self.remove_edge(id, other);
        }
        for members in self.node_variations.values_mut() {
            members.remove(&id);
        }
        Some(node)
    }

    /// Remove the edge between two nodes, whichever way round it was added
    pub fn remove_edge(&mut self, a: NodeId, b: NodeId) -> Option<LayoutEdge> {
        let key = self.existing_key(a, b)?;
        if let Some(set) = self.neighbors.get_mut(&a) {
            set.remove(&b);
        }
        if let Some(set) = self.neighbors.get_mut(&b) {
            set.remove(&a);
        }
        self.edges.remove(&key)
    }

    fn existing_key(&self, a: NodeId, b: NodeId) -> Option<EdgeKey> {
        [EdgeKey::new(a, b), EdgeKey::new(b, a)]
            .into_iter()
            .find(|k| self.edges.contains_key(k))
    }

    pub fn node(&self, id: NodeId) -> Option<&LayoutNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut LayoutNode> {
        self.nodes.get_mut(&id)
    }

    /// Edge between two nodes, whichever way round it was added
    pub fn edge(&self, a: NodeId, b: NodeId) -> Option<&LayoutEdge> {
        self.existing_key(a, b).and_then(|k| self.edges.get(&k))
    }

    pub fn edge_mut(&mut self, a: NodeId, b: NodeId) -> Option<&mut LayoutEdge> {
        let key = self.existing_key(a, b)?;
        self.edges.get_mut(&key)
    }

    /// Nodes in ascending id order
    pub fn nodes(&self) -> impl Iterator<Item = &LayoutNode> {
        self.nodes.values()
    }

    /// Edges in ascending key order
    pub fn edges(&self) -> impl Iterator<Item = &LayoutEdge> {
        self.edges.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Neighbors of a node in ascending id order (empty for unknown nodes)
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.neighbors.get(&id).into_iter().flatten().copied()
    }

    pub fn degree(&self, id: NodeId) -> usize {
        self.neighbors.get(&id).map_or(0, |s| s.len())
    }

    /// The full adjacency index
    pub fn adjacency(&self) -> &BTreeMap<NodeId, BTreeSet<NodeId>> {
        &self.neighbors
    }

    /// Register nodes as interchangeable within a named variation group
    pub fn add_node_variation(
        &mut self,
        group: impl Into<String>,
        nodes: impl IntoIterator<Item = NodeId>,
    ) -> Result<()> {
        let nodes: Vec<NodeId> = nodes.into_iter().collect();
        if let Some(missing) = nodes.iter().find(|id| !self.nodes.contains_key(id)) {
            return Err(LayoutError::InvalidId(format!("node {}", missing)));
        }
        self.node_variations
            .entry(group.into())
            .or_default()
            .extend(nodes);
        Ok(())
    }

    pub fn node_variation(&self, group: &str) -> Option<&BTreeSet<NodeId>> {
        self.node_variations.get(group)
    }

    pub fn node_variations(&self) -> &BTreeMap<String, BTreeSet<NodeId>> {
        &self.node_variations
    }

    /// Exchange the edge sets of two nodes
    ///
    /// Every edge touching `a` is moved to `b` and the other way round; an
    /// edge between `a` and `b` stays where it is. Edge data (direction,
    /// door code, room settings) moves with the edge.
    pub fn swap_edges(&mut self, a: NodeId, b: NodeId) -> Result<()> {
        for id in [a, b] {
            if !self.nodes.contains_key(&id) {
                return Err(LayoutError::InvalidId(format!("node {}", id)));
            }
        }
        if a == b {
            return Ok(());
        }

        let moved: Vec<LayoutEdge> = self
            .edges
            .values()
            .filter(|e| e.key().contains(a) || e.key().contains(b))
            .filter(|e| !(e.key().contains(a) && e.key().contains(b)))
            .cloned()
            .collect();
        for edge in &moved {
            self.remove_edge(edge.from, edge.to);
        }

        let relabel = |id: NodeId| {
            if id == a {
                b
            } else if id == b {
                a
            } else {
                id
            }
        };
        for mut edge in moved {
            edge.from = relabel(edge.from);
            edge.to = relabel(edge.to);
            let key = edge.key();
            self.neighbors.entry(edge.from).or_default().insert(edge.to);
            self.neighbors.entry(edge.to).or_default().insert(edge.from);
            self.edges.insert(key, edge);
        }
        Ok(())
    }

    /// Copy of this graph with every variation group's nodes permuted
    ///
    /// Permuting is done by swapping edge sets, so the copy has the same
    /// shape and stays connected if this graph is.
    pub fn create_variation(&self, rng: &mut RandomStream) -> Result<LayoutGraph> {
        let mut graph = self.clone();
        for members in self.node_variations.values() {
            let ids: Vec<NodeId> = members.iter().copied().collect();
            for i in (1..ids.len()).rev() {
                let j = rng.rn2(i as u32 + 1) as usize;
                if i != j {
                    graph.swap_edges(ids[i], ids[j])?;
                }
            }
        }
        Ok(graph)
    }

    /// Whether every node is reachable from the first one
    pub fn is_fully_connected(&self) -> bool {
        match self.nodes.keys().next() {
            None => true,
            Some(&start) => find_cluster(&self.neighbors, start, usize::MAX).len() == self.nodes.len(),
        }
    }

    /// Check the graph can be laid out: non-empty and connected
    pub fn validate(&self) -> Result<()> {
        let Some(&start) = self.nodes.keys().next() else {
            return Err(LayoutError::EmptyGraph);
        };
        let reached = find_cluster(&self.neighbors, start, usize::MAX).len();
        if reached != self.nodes.len() {
            return Err(LayoutError::GraphNotFullyConnected {
                start,
                unreachable: self.nodes.len() - reached,
            });
        }
        Ok(())
    }
}
