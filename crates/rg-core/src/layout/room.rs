//! Placed rooms and the door connections between them

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::graph::{Color, EdgeKey, NodeId};
use crate::room::{DoorPosition, RoomTemplate, Vec2};

/// Identity of a placed room, derived from the graph element it came from
///
/// Node rooms sort before edge rooms.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum RoomId {
    Node(NodeId),
    Edge(EdgeKey),
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomId::Node(id) => write!(f, "node {}", id),
            RoomId::Edge(key) => write!(f, "edge ({}, {})", key.from, key.to),
        }
    }
}

impl From<NodeId> for RoomId {
    fn from(id: NodeId) -> Self {
        RoomId::Node(id)
    }
}

/// A collectable spot within one room: cell plus index in the cell's spot list
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SpotKey {
    pub position: Vec2,
    pub index: usize,
}

/// A collectable assigned to a spot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedCollectable {
    pub spot: SpotKey,
    pub group: String,
    pub collectable_id: u32,
}

/// A template variation placed at an absolute position and layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    /// Absolute grid position of the template's (0, 0) cell
    pub position: Vec2,
    pub z: i32,
    pub template: Arc<RoomTemplate>,
    pub color: Color,
    pub collectables: Vec<AssignedCollectable>,
}

impl Room {
    /// Absolute coordinate of a template-local cell
    pub fn to_absolute(&self, local: Vec2) -> Vec2 {
        self.position + local
    }

    /// Absolute coordinates of every footprint cell
    pub fn occupied_cells(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.template.occupied().map(|(p, _)| self.position + p)
    }

    /// Collectables already assigned to a spot
    pub fn collectables_at(&self, spot: SpotKey) -> usize {
        self.collectables.iter().filter(|c| c.spot == spot).count()
    }
}

/// Two placed rooms joined through a pair of facing doors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorConnection {
    pub from_room: RoomId,
    pub to_room: RoomId,
    /// Door on `from_room`, in template-local coordinates
    pub from_door: DoorPosition,
    /// Door on `to_room`, in template-local coordinates
    pub to_door: DoorPosition,
    /// Graph edge this connection realizes
    pub edge: EdgeKey,
}

impl DoorConnection {
    pub fn involves(&self, room: RoomId) -> bool {
        self.from_room == room || self.to_room == room
    }
}
