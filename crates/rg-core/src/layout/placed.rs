//! The generated layout: placed rooms plus their door connections

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::room::{DoorConnection, Room, RoomId};
use crate::graph::find_distances;
use crate::room::Vec2;

/// Serde helper for the room map: JSON needs string keys, so rooms are
/// written as a sequence and re-keyed by their own id on load.
mod rooms_serde {
    use super::*;
    use serde::de::{self, SeqAccess, Visitor};

    pub fn serialize<S>(rooms: &BTreeMap<RoomId, Room>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(rooms.values())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<RoomId, Room>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct RoomsVisitor;

        impl<'de> Visitor<'de> for RoomsVisitor {
            type Value = BTreeMap<RoomId, Room>;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a sequence of rooms with unique ids")
            }

            fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut rooms = BTreeMap::new();
                while let Some(room) = access.next_element::<Room>()? {
                    let id = room.id;
                    if rooms.insert(id, room).is_some() {
                        return Err(de::Error::custom(format!("duplicate room id: {}", id)));
                    }
                }
                Ok(rooms)
            }
        }

        deserializer.deserialize_seq(RoomsVisitor)
    }
}

/// Result of one successful generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Id of the graph the layout was generated from
    pub id: u32,
    pub name: String,
    pub seed: u64,
    #[serde(with = "rooms_serde")]
    rooms: BTreeMap<RoomId, Room>,
    door_connections: Vec<DoorConnection>,
}

impl Layout {
    pub fn new(id: u32, name: impl Into<String>, seed: u64) -> Self {
        Self {
            id,
            name: name.into(),
            seed,
            rooms: BTreeMap::new(),
            door_connections: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        id: u32,
        name: impl Into<String>,
        seed: u64,
        rooms: BTreeMap<RoomId, Room>,
        door_connections: Vec<DoorConnection>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            seed,
            rooms,
            door_connections,
        }
    }

    /// Rooms in id order
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    pub fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(&id)
    }

    pub fn room_ids(&self) -> impl Iterator<Item = RoomId> + '_ {
        self.rooms.keys().copied()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn door_connections(&self) -> &[DoorConnection] {
        &self.door_connections
    }

    /// Room adjacency through door connections
    pub fn room_adjacency(&self) -> BTreeMap<RoomId, BTreeSet<RoomId>> {
        let mut adjacency: BTreeMap<RoomId, BTreeSet<RoomId>> =
            self.rooms.keys().map(|&id| (id, BTreeSet::new())).collect();
        for connection in &self.door_connections {
            adjacency
                .entry(connection.from_room)
                .or_default()
                .insert(connection.to_room);
            adjacency
                .entry(connection.to_room)
                .or_default()
                .insert(connection.from_room);
        }
        adjacency
    }

    /// Rooms sharing a door connection with `id`, in id order
    pub fn room_neighbors(&self, id: RoomId) -> Vec<RoomId> {
        self.room_adjacency()
            .remove(&id)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default()
    }

    /// Door-connection hop count from `from` to every reachable room
    pub fn room_distances(&self, from: RoomId) -> BTreeMap<RoomId, usize> {
        find_distances(&self.room_adjacency(), [from], usize::MAX)
    }

    /// Every pair of rooms sharing a cell on the same layer
    pub fn find_overlaps(&self) -> Vec<(RoomId, RoomId)> {
        let mut owners: BTreeMap<(Vec2, i32), RoomId> = BTreeMap::new();
        let mut overlaps = BTreeSet::new();
        for room in self.rooms.values() {
            for cell in room.occupied_cells() {
                if let Some(&other) = owners.get(&(cell, room.z)) {
                    overlaps.insert((other, room.id));
                } else {
                    owners.insert((cell, room.z), room.id);
                }
            }
        }
        overlaps.into_iter().collect()
    }

    /// Whether a connection's doors face each other in absolute space
    ///
    /// Checks that both rooms exist, the doors point in opposite directions,
    /// the cell behind one door is the door cell of the other, and the two
    /// door types and codes are compatible.
    pub fn is_connection_aligned(&self, connection: &DoorConnection) -> bool {
        let (Some(from), Some(to)) = (
            self.rooms.get(&connection.from_room),
            self.rooms.get(&connection.to_room),
        ) else {
            return false;
        };
        let from_door = connection.from_door;
        let to_door = connection.to_door;
        if from_door.direction.opposite() != to_door.direction {
            return false;
        }
        let (step, layer_step) = from_door.direction.step();
        from.to_absolute(from_door.position) + step == to.to_absolute(to_door.position)
            && from.z + layer_step == to.z
            && from_door.door.aligns_with(&to_door.door)
    }
}
