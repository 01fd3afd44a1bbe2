//! Room templates: named cell grids with door slots
//!
//! A template is immutable once built. Rotations and mirrors produce new
//! templates; [`RoomTemplate::unique_variations`] lists every distinct one.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::cell::Cell;
use super::door::DoorMask;
use super::grid::{Array2D, Vec2};
use crate::error::{LayoutError, Result};

/// A room shape: `None` cells are outside the room's footprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomTemplate {
    pub id: u32,
    pub name: String,
    cells: Array2D<Option<Cell>>,
}

impl RoomTemplate {
    pub fn new(id: u32, name: impl Into<String>, cells: Array2D<Option<Cell>>) -> Self {
        Self {
            id,
            name: name.into(),
            cells,
        }
    }

    /// Solid rectangle of `rows` x `columns` empty cells
    pub fn rectangle(id: u32, name: impl Into<String>, rows: usize, columns: usize) -> Self {
        Self::new(
            id,
            name,
            Array2D::from_rows(vec![vec![Some(Cell::new()); columns]; rows], None),
        )
    }

    pub fn cells(&self) -> &Array2D<Option<Cell>> {
        &self.cells
    }

    pub fn cell(&self, position: Vec2) -> Option<&Cell> {
        self.cells.at(position).and_then(|c| c.as_ref())
    }

    /// Replace the cell at `position` (x = column, y = row)
    pub fn set_cell(&mut self, position: Vec2, cell: Option<Cell>) -> Result<()> {
        let slot = if position.x >= 0 && position.y >= 0 {
            self.cells.get_mut(position.y as usize, position.x as usize)
        } else {
            None
        };
        match slot {
            Some(slot) => {
                *slot = cell;
                Ok(())
            }
            None => Err(LayoutError::InvalidId(format!(
                "cell ({}, {}) of template '{}'",
                position.x, position.y, self.name
            ))),
        }
    }

    /// Edit the cell at `position` in place; no-op outside the footprint
    pub fn update_cell(&mut self, position: Vec2, f: impl FnOnce(Cell) -> Cell) {
        if position.x < 0 || position.y < 0 {
            return;
        }
        if let Some(slot) = self.cells.get_mut(position.y as usize, position.x as usize)
            && let Some(cell) = slot.take()
        {
            *slot = Some(f(cell));
        }
    }

    /// Footprint cells with their local coordinates, row by row
    pub fn occupied(&self) -> impl Iterator<Item = (Vec2, &Cell)> {
        self.cells
            .iter()
            .filter_map(|(p, c)| c.as_ref().map(|cell| (p, cell)))
    }

    /// Footprint coordinates only
    pub fn footprint(&self) -> Vec<Vec2> {
        self.occupied().map(|(p, _)| p).collect()
    }

    /// Union of all door directions on the template
    pub fn door_mask(&self) -> DoorMask {
        self.occupied()
            .fold(DoorMask::empty(), |acc, (_, c)| acc | c.door_mask())
    }

    pub fn has_doors(&self) -> bool {
        self.occupied().any(|(_, c)| c.has_doors())
    }

    /// Whether every footprint cell can reach every other through side neighbors
    pub fn cells_fully_connected(&self) -> bool {
        let footprint: BTreeSet<Vec2> = self.occupied().map(|(p, _)| p).collect();
        let Some(&start) = footprint.iter().next() else {
            return false;
        };
        let mut reached = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(p) = queue.pop_front() {
            for step in [Vec2::new(0, -1), Vec2::new(1, 0), Vec2::new(0, 1), Vec2::new(-1, 0)] {
                let next = p + step;
                if footprint.contains(&next) && reached.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        reached.len() == footprint.len()
    }

    /// Check the template can take part in a layout
    pub fn validate(&self) -> Result<()> {
        if !self.cells_fully_connected() {
            return Err(LayoutError::CellsNotFullyConnected {
                template: self.name.clone(),
            });
        }
        if !self.has_doors() {
            return Err(LayoutError::NoDoorsExist {
                template: self.name.clone(),
            });
        }
        Ok(())
    }

    fn transformed(
        &self,
        grid: impl Fn(&Array2D<Option<Cell>>) -> Array2D<Option<Cell>>,
        cell: impl Fn(&Cell) -> Cell,
    ) -> RoomTemplate {
        RoomTemplate {
            id: self.id,
            name: self.name.clone(),
            cells: grid(&self.cells).map(|c| c.as_ref().map(&cell)),
        }
    }

    pub fn rotated_clockwise(&self) -> RoomTemplate {
        self.transformed(Array2D::rotated_clockwise, Cell::rotated_clockwise)
    }

    pub fn mirrored_horizontally(&self) -> RoomTemplate {
        self.transformed(Array2D::mirrored_horizontally, Cell::mirrored_horizontally)
    }

    pub fn mirrored_vertically(&self) -> RoomTemplate {
        self.transformed(Array2D::mirrored_vertically, Cell::mirrored_vertically)
    }

    /// Every distinct rotation and mirror image, starting with this template
    ///
    /// Order: the four rotations, then the four rotations of the horizontal
    /// mirror; duplicates (by cell content) are dropped.
    pub fn unique_variations(&self) -> Vec<RoomTemplate> {
        let mut candidates = Vec::with_capacity(8);
        let mut current = self.clone();
        for _ in 0..4 {
            let next = current.rotated_clockwise();
            candidates.push(current);
            current = next;
        }
        let mut current = self.mirrored_horizontally();
        for _ in 0..4 {
            let next = current.rotated_clockwise();
            candidates.push(current);
            current = next;
        }

        let mut unique: Vec<RoomTemplate> = Vec::new();
        for candidate in candidates {
            if !unique.iter().any(|u| u.cells == candidate.cells) {
                unique.push(candidate);
            }
        }
        unique
    }
}
