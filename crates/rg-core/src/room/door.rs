//! Doors: direction, type and code

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use super::grid::Vec2;
use crate::error::{LayoutError, Result};

/// Side of a cell a door sits on
///
/// Top and Bottom connect to the layer above and below.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
pub enum DoorDirection {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
    Top = 4,
    Bottom = 5,
}

impl DoorDirection {
    pub const ALL: [DoorDirection; 6] = [
        DoorDirection::North,
        DoorDirection::East,
        DoorDirection::South,
        DoorDirection::West,
        DoorDirection::Top,
        DoorDirection::Bottom,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opposite(self) -> Self {
        match self {
            DoorDirection::North => DoorDirection::South,
            DoorDirection::East => DoorDirection::West,
            DoorDirection::South => DoorDirection::North,
            DoorDirection::West => DoorDirection::East,
            DoorDirection::Top => DoorDirection::Bottom,
            DoorDirection::Bottom => DoorDirection::Top,
        }
    }

    /// Direction after a quarter turn clockwise
    pub fn rotated_clockwise(self) -> Self {
        match self {
            DoorDirection::North => DoorDirection::East,
            DoorDirection::East => DoorDirection::South,
            DoorDirection::South => DoorDirection::West,
            DoorDirection::West => DoorDirection::North,
            vertical => vertical,
        }
    }

    /// Direction after a left-right flip
    pub fn mirrored_horizontally(self) -> Self {
        match self {
            DoorDirection::East => DoorDirection::West,
            DoorDirection::West => DoorDirection::East,
            other => other,
        }
    }

    /// Direction after a top-bottom flip
    pub fn mirrored_vertically(self) -> Self {
        match self {
            DoorDirection::North => DoorDirection::South,
            DoorDirection::South => DoorDirection::North,
            other => other,
        }
    }

    /// Grid step to the neighboring cell and layer step to the neighboring layer
    pub fn step(self) -> (Vec2, i32) {
        match self {
            DoorDirection::North => (Vec2::new(0, -1), 0),
            DoorDirection::East => (Vec2::new(1, 0), 0),
            DoorDirection::South => (Vec2::new(0, 1), 0),
            DoorDirection::West => (Vec2::new(-1, 0), 0),
            DoorDirection::Top => (Vec2::ZERO, 1),
            DoorDirection::Bottom => (Vec2::ZERO, -1),
        }
    }

    pub fn mask(self) -> DoorMask {
        DoorMask::from_bits_truncate(1 << self.index())
    }
}

impl TryFrom<u8> for DoorDirection {
    type Error = LayoutError;

    fn try_from(value: u8) -> Result<Self> {
        DoorDirection::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| LayoutError::UnhandledCase(format!("door direction {}", value)))
    }
}

bitflags! {
    /// Set of door directions present on a cell or template
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct DoorMask: u8 {
        const NORTH = 0x01;
        const EAST = 0x02;
        const SOUTH = 0x04;
        const WEST = 0x08;
        const TOP = 0x10;
        const BOTTOM = 0x20;
    }
}

impl DoorMask {
    /// The mask with every direction replaced by its opposite
    pub fn opposite(self) -> DoorMask {
        DoorDirection::ALL
            .iter()
            .filter(|d| self.contains(d.mask()))
            .fold(DoorMask::empty(), |acc, d| acc | d.opposite().mask())
    }
}

/// How a door may be passed
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Display,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
pub enum DoorType {
    /// Closed slot; never connects
    #[default]
    None = 0,
    TwoWay = 1,
    TwoWayExit = 2,
    TwoWayEntrance = 3,
    OneWayExit = 4,
    OneWayEntrance = 5,
}

impl DoorType {
    /// Whether a door of this type can face a door of `other` type
    pub fn aligns_with(self, other: DoorType) -> bool {
        match self {
            DoorType::None => false,
            DoorType::TwoWay => matches!(
                other,
                DoorType::TwoWay | DoorType::TwoWayExit | DoorType::TwoWayEntrance
            ),
            DoorType::TwoWayExit => matches!(other, DoorType::TwoWay | DoorType::TwoWayEntrance),
            DoorType::TwoWayEntrance => matches!(other, DoorType::TwoWay | DoorType::TwoWayExit),
            DoorType::OneWayExit => other == DoorType::OneWayEntrance,
            DoorType::OneWayEntrance => other == DoorType::OneWayExit,
        }
    }
}

impl TryFrom<u8> for DoorType {
    type Error = LayoutError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(DoorType::None),
            1 => Ok(DoorType::TwoWay),
            2 => Ok(DoorType::TwoWayExit),
            3 => Ok(DoorType::TwoWayEntrance),
            4 => Ok(DoorType::OneWayExit),
            5 => Ok(DoorType::OneWayEntrance),
            _ => Err(LayoutError::UnhandledCase(format!("door type {}", value))),
        }
    }
}

/// A door slot on one side of a cell
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Door {
    pub door_type: DoorType,
    /// Only doors with equal codes can be connected
    pub code: u32,
}

impl Door {
    pub fn new(door_type: DoorType, code: u32) -> Self {
        Self { door_type, code }
    }

    pub fn two_way() -> Self {
        Self::new(DoorType::TwoWay, 0)
    }

    /// Whether this door can be connected to `other` at all
    pub fn aligns_with(&self, other: &Door) -> bool {
        self.code == other.code && self.door_type.aligns_with(other.door_type)
    }
}
