//! Placed rooms, door connections and the occupancy store

mod occupancy;
mod placed;
mod room;

pub use occupancy::OccupancyMap;
pub use placed::Layout;
pub use room::{AssignedCollectable, DoorConnection, Room, RoomId, SpotKey};
