//! Template cells: footprint unit with door slots and collectable spots

use serde::{Deserialize, Serialize};

use super::door::{Door, DoorDirection, DoorMask, DoorType};

/// A place in a cell that can hold collectables from one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectableSpot {
    pub group: String,
    /// Maximum number of collectables this spot accepts
    pub capacity: u32,
    /// Relative preference, multiplied by the distance weight
    pub weight: f64,
}

impl CollectableSpot {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            capacity: 1,
            weight: 1.0,
        }
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// One grid unit of a room template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Door slot per direction, indexed by [`DoorDirection::index`]
    doors: [Option<Door>; 6],
    pub collectable_spots: Vec<CollectableSpot>,
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_door(mut self, direction: DoorDirection, door: Door) -> Self {
        self.set_door(direction, Some(door));
        self
    }

    pub fn with_spot(mut self, spot: CollectableSpot) -> Self {
        self.collectable_spots.push(spot);
        self
    }

    pub fn set_door(&mut self, direction: DoorDirection, door: Option<Door>) {
        self.doors[direction.index()] = door;
    }

    pub fn door(&self, direction: DoorDirection) -> Option<&Door> {
        self.doors[direction.index()].as_ref()
    }

    /// Doors present on this cell, in direction order
    pub fn doors(&self) -> impl Iterator<Item = (DoorDirection, &Door)> {
        DoorDirection::ALL
            .into_iter()
            .filter_map(|d| self.doors[d.index()].as_ref().map(|door| (d, door)))
    }

    /// Doors that can take a connection; closed `DoorType::None` slots are skipped
    pub fn open_doors(&self) -> impl Iterator<Item = (DoorDirection, &Door)> {
        self.doors().filter(|(_, door)| door.door_type != DoorType::None)
    }

    pub fn has_doors(&self) -> bool {
        self.open_doors().next().is_some()
    }

    /// Directions carrying an open door
    pub fn door_mask(&self) -> DoorMask {
        self.open_doors()
            .fold(DoorMask::empty(), |acc, (d, _)| acc | d.mask())
    }

    fn remapped(&self, f: impl Fn(DoorDirection) -> DoorDirection) -> Cell {
        let mut doors = [None; 6];
        for (direction, door) in self.doors() {
            doors[f(direction).index()] = Some(*door);
        }
        Cell {
            doors,
            collectable_spots: self.collectable_spots.clone(),
        }
    }

    pub fn rotated_clockwise(&self) -> Cell {
        self.remapped(DoorDirection::rotated_clockwise)
    }

    pub fn mirrored_horizontally(&self) -> Cell {
        self.remapped(DoorDirection::mirrored_horizontally)
    }

    pub fn mirrored_vertically(&self) -> Cell {
        self.remapped(DoorDirection::mirrored_vertically)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doors_and_mask() {
        let cell = Cell::new()
            .with_door(DoorDirection::North, Door::two_way())
            .with_door(DoorDirection::Top, Door::new(DoorType::OneWayExit, 3));
        assert!(cell.has_doors());
        assert_eq!(cell.door_mask(), DoorMask::NORTH | DoorMask::TOP);
        assert_eq!(cell.door(DoorDirection::Top).unwrap().code, 3);
        assert!(cell.door(DoorDirection::South).is_none());
        assert_eq!(cell.doors().count(), 2);
    }

    #[test]
    fn test_closed_slots_are_not_doors() {
        let cell = Cell::new().with_door(DoorDirection::East, Door::new(DoorType::None, 0));
        assert!(!cell.has_doors());
        assert!(cell.door_mask().is_empty());
        assert_eq!(cell.doors().count(), 1);

        let cell = cell.with_door(DoorDirection::West, Door::two_way());
        assert!(cell.has_doors());
        assert_eq!(cell.door_mask(), DoorMask::WEST);
    }

    #[test]
    fn test_rotation_moves_doors() {
        let cell = Cell::new().with_door(DoorDirection::North, Door::two_way());
        let turned = cell.rotated_clockwise();
        assert!(turned.door(DoorDirection::East).is_some());
        assert!(turned.door(DoorDirection::North).is_none());
    }

    #[test]
    fn test_mirror_keeps_spots() {
        let cell = Cell::new()
            .with_door(DoorDirection::East, Door::two_way())
            .with_spot(CollectableSpot::new("keys").with_capacity(2));
        let mirrored = cell.mirrored_horizontally();
        assert!(mirrored.door(DoorDirection::West).is_some());
        assert_eq!(mirrored.collectable_spots, cell.collectable_spots);
        assert_eq!(mirrored.mirrored_horizontally(), cell);
    }
}
