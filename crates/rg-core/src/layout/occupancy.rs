//! Occupancy store for placed room footprints
//!
//! Maps every absolute (x, y, layer) cell to the room covering it. The
//! placement engine tests a candidate before committing it and rolls rooms
//! back when it backtracks.

use hashbrown::HashMap;

use super::room::RoomId;
use crate::room::{RoomTemplate, Vec2};

type CellKey = (i32, i32, i32);

#[derive(Debug, Clone, Default)]
pub struct OccupancyMap {
    cells: HashMap<CellKey, RoomId>,
    footprints: HashMap<RoomId, Vec<CellKey>>,
}

impl OccupancyMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn keys(template: &RoomTemplate, position: Vec2, z: i32) -> impl Iterator<Item = CellKey> + '_ {
        template.occupied().map(move |(p, _)| {
            let cell = position + p;
            (cell.x, cell.y, z)
        })
    }

    /// Whether `template` at `position` on layer `z` touches any committed room
    pub fn collides(&self, template: &RoomTemplate, position: Vec2, z: i32) -> bool {
        Self::keys(template, position, z).any(|key| self.cells.contains_key(&key))
    }

    /// The room covering an absolute cell, if any
    pub fn owner(&self, cell: Vec2, z: i32) -> Option<RoomId> {
        self.cells.get(&(cell.x, cell.y, z)).copied()
    }

    /// Record a room's footprint
    ///
    /// Callers test with [`collides`](Self::collides) first; committing over
    /// an occupied cell reassigns that cell. Committing the same id twice
    /// replaces its earlier footprint.
    pub fn commit(&mut self, id: RoomId, template: &RoomTemplate, position: Vec2, z: i32) {
        self.rollback(id);
        let footprint: Vec<CellKey> = Self::keys(template, position, z).collect();
        for &key in &footprint {
            self.cells.insert(key, id);
        }
        self.footprints.insert(id, footprint);
    }

    /// Remove a room's footprint; returns false if it was not committed
    pub fn rollback(&mut self, id: RoomId) -> bool {
        let Some(footprint) = self.footprints.remove(&id) else {
            return false;
        };
        for key in footprint {
            if self.cells.get(&key) == Some(&id) {
                self.cells.remove(&key);
            }
        }
        true
    }

    pub fn contains(&self, id: RoomId) -> bool {
        self.footprints.contains_key(&id)
    }

    /// Number of committed rooms
    pub fn room_count(&self) -> usize {
        self.footprints.len()
    }

    /// Number of occupied cells over all layers
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}
