//! Room templates and the geometry of connecting them

mod cell;
mod config_space;
mod door;
mod grid;
mod template;
mod template_group;

pub use cell::{Cell, CollectableSpot};
pub use config_space::{Configuration, ConfigurationSpace, ConfigurationSpaceCache, DoorPosition};
pub use door::{Door, DoorDirection, DoorMask, DoorType};
pub use grid::{Array2D, Vec2};
pub use template::RoomTemplate;
pub use template_group::{EntryRef, TemplateGroupEntry, TemplateGroups, TemplateKey, TemplateLibrary};
