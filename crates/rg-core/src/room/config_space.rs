//! Configuration spaces: every relative placement at which two templates
//! share a compatible door
//!
//! For templates A and B, each door-bearing cell of A is paired with each
//! door-bearing cell of B. Where the doors face each other, carry the same
//! code and have aligned types, the offset putting B's cell next to A's
//! (or directly above/below it for Top/Bottom doors) is recorded, unless
//! the two footprints would overlap on the same layer at that offset.
//!
//! Spaces are sorted by offset, then layer step, then cell order, so the
//! same inputs always enumerate candidates in the same order.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use super::door::{Door, DoorDirection};
use super::grid::Vec2;
use super::template::RoomTemplate;
use super::template_group::{TemplateKey, TemplateLibrary};
use crate::error::{LayoutError, Result};
use crate::graph::EdgeDirection;

/// A door on a template cell
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct DoorPosition {
    /// Local cell coordinate in the template
    pub position: Vec2,
    pub direction: DoorDirection,
    pub door: Door,
}

/// One valid placement of template B relative to template A
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Configuration {
    /// Position of B minus position of A
    pub offset: Vec2,
    /// Layer of B minus layer of A
    pub layer_delta: i32,
    /// The door used on A
    pub from_door: DoorPosition,
    /// The door used on B
    pub to_door: DoorPosition,
}

impl Configuration {
    /// Door code both doors share
    pub fn code(&self) -> u32 {
        self.from_door.door.code
    }

    /// Whether this placement satisfies an edge seen from A's side
    pub fn satisfies(&self, direction: EdgeDirection, code: u32) -> bool {
        self.code() == code && direction.allows_from_door(self.from_door.door.door_type)
    }

    /// The same placement seen from B
    pub fn reversed(&self) -> Configuration {
        Configuration {
            offset: -self.offset,
            layer_delta: -self.layer_delta,
            from_door: self.to_door,
            to_door: self.from_door,
        }
    }
}

/// All configurations of an ordered template pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationSpace {
    pub from: TemplateKey,
    pub to: TemplateKey,
    configurations: Vec<Configuration>,
}

impl ConfigurationSpace {
    /// Enumerate every configuration placing `to_template` against `from_template`
    pub fn compute(
        from: TemplateKey,
        from_template: &RoomTemplate,
        to: TemplateKey,
        to_template: &RoomTemplate,
    ) -> Self {
        let mut configurations = Vec::new();

        // Quick reject: no door on A faces any door direction on B
        if from_template.door_mask().opposite() & to_template.door_mask()
            == super::door::DoorMask::empty()
        {
            return Self {
                from,
                to,
                configurations,
            };
        }

        let from_footprint: BTreeSet<Vec2> = from_template.footprint().into_iter().collect();
        let to_footprint = to_template.footprint();

        for (a_pos, a_cell) in from_template.occupied() {
            for (a_dir, a_door) in a_cell.doors() {
                let (step, layer_delta) = a_dir.step();
                for (b_pos, b_cell) in to_template.occupied() {
                    let Some(b_door) = b_cell.door(a_dir.opposite()) else {
                        continue;
                    };
                    if !a_door.aligns_with(b_door) {
                        continue;
                    }
                    let offset = a_pos + step - b_pos;
                    if layer_delta == 0
                        && to_footprint
                            .iter()
                            .any(|&p| from_footprint.contains(&(p + offset)))
                    {
                        continue;
                    }
                    configurations.push(Configuration {
                        offset,
                        layer_delta,
                        from_door: DoorPosition {
                            position: a_pos,
                            direction: a_dir,
                            door: *a_door,
                        },
                        to_door: DoorPosition {
                            position: b_pos,
                            direction: a_dir.opposite(),
                            door: *b_door,
                        },
                    });
                }
            }
        }

        configurations.sort_by_key(Self::sort_key);
        configurations.dedup();
        Self {
            from,
            to,
            configurations,
        }
    }

    fn sort_key(c: &Configuration) -> (i32, i32, i32, i32, i32, DoorDirection, i32, i32) {
        (
            c.offset.x,
            c.offset.y,
            c.layer_delta,
            c.from_door.position.y,
            c.from_door.position.x,
            c.from_door.direction,
            c.to_door.position.y,
            c.to_door.position.x,
        )
    }

    /// The space of the reversed pair, derived without recomputing
    pub fn reversed(&self) -> ConfigurationSpace {
        let mut configurations: Vec<Configuration> =
            self.configurations.iter().map(|c| c.reversed()).collect();
        configurations.sort_by_key(Self::sort_key);
        ConfigurationSpace {
            from: self.to,
            to: self.from,
            configurations,
        }
    }

    pub fn configurations(&self) -> &[Configuration] {
        &self.configurations
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    /// Configurations usable for an edge between layers `layer_delta` apart
    pub fn matching(
        &self,
        direction: EdgeDirection,
        code: u32,
        layer_delta: i32,
    ) -> impl Iterator<Item = &Configuration> {
        self.configurations
            .iter()
            .filter(move |c| c.layer_delta == layer_delta && c.satisfies(direction, code))
    }

    /// Configurations landing B exactly at a known offset
    ///
    /// Used to close cycles, where both rooms are already placed.
    pub fn matching_offset(
        &self,
        direction: EdgeDirection,
        code: u32,
        offset: Vec2,
        layer_delta: i32,
    ) -> impl Iterator<Item = &Configuration> {
        self.matching(direction, code, layer_delta)
            .filter(move |c| c.offset == offset)
    }
}

/// Configuration spaces for the variations of a template library
///
/// Each unordered pair is computed once, on first request; the reverse
/// order is derived from it. Computed spaces are never modified, so one
/// cache can serve several generation runs.
#[derive(Debug, Default)]
pub struct ConfigurationSpaceCache {
    spaces: RwLock<BTreeMap<(TemplateKey, TemplateKey), Arc<ConfigurationSpace>>>,
}

impl ConfigurationSpaceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ordered pairs computed so far
    pub fn len(&self) -> usize {
        self.spaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Space for placing `to` against `from`
    pub fn get(
        &self,
        library: &TemplateLibrary,
        from: TemplateKey,
        to: TemplateKey,
    ) -> Result<Arc<ConfigurationSpace>> {
        if let Some(space) = self
            .spaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(from, to))
        {
            return Ok(Arc::clone(space));
        }

        let template = |key: TemplateKey| {
            library
                .template(key)
                .ok_or_else(|| LayoutError::InvalidId(format!("template variation {}", key.0)))
        };
        let (low, high) = (from.min(to), from.max(to));
        let forward = Arc::new(ConfigurationSpace::compute(
            low,
            template(low)?,
            high,
            template(high)?,
        ));
        let backward = if low == high {
            Arc::clone(&forward)
        } else {
            Arc::new(forward.reversed())
        };

        let mut spaces = self.spaces.write().unwrap_or_else(PoisonError::into_inner);
        spaces.entry((low, high)).or_insert(forward);
        spaces.entry((high, low)).or_insert(backward);
        spaces
            .get(&(from, to))
            .cloned()
            .ok_or_else(|| LayoutError::UnhandledCase("configuration space cache miss".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::{Cell, DoorType, TemplateGroups};

    fn single(id: u32, doors: &[(DoorDirection, DoorType)]) -> RoomTemplate {
        let mut t = RoomTemplate::rectangle(id, format!("t{}", id), 1, 1);
        t.update_cell(Vec2::ZERO, |mut c: Cell| {
            for &(d, ty) in doors {
                c.set_door(d, Some(Door::new(ty, 0)));
            }
            c
        });
        t
    }

    #[test]
    fn test_opposite_doors_only() {
        let a = single(1, &[(DoorDirection::East, DoorType::TwoWay)]);
        let b = single(2, &[(DoorDirection::West, DoorType::TwoWay), (DoorDirection::North, DoorType::TwoWay)]);
        let space = ConfigurationSpace::compute(TemplateKey(0), &a, TemplateKey(1), &b);
        assert_eq!(space.len(), 1);
        let c = space.configurations()[0];
        assert_eq!(c.offset, Vec2::new(1, 0));
        assert_eq!(c.layer_delta, 0);
        assert_eq!(c.to_door.direction, DoorDirection::West);
    }

    #[test]
    fn test_vertical_doors_change_layer() {
        let a = single(1, &[(DoorDirection::Top, DoorType::TwoWay)]);
        let b = single(2, &[(DoorDirection::Bottom, DoorType::TwoWay)]);
        let space = ConfigurationSpace::compute(TemplateKey(0), &a, TemplateKey(1), &b);
        assert_eq!(space.len(), 1);
        assert_eq!(space.configurations()[0].offset, Vec2::ZERO);
        assert_eq!(space.configurations()[0].layer_delta, 1);
    }

    #[test]
    fn test_incompatible_types_skipped() {
        let a = single(1, &[(DoorDirection::East, DoorType::OneWayExit)]);
        let b = single(2, &[(DoorDirection::West, DoorType::TwoWay)]);
        assert!(ConfigurationSpace::compute(TemplateKey(0), &a, TemplateKey(1), &b).is_empty());

        let b = single(2, &[(DoorDirection::West, DoorType::OneWayEntrance)]);
        let space = ConfigurationSpace::compute(TemplateKey(0), &a, TemplateKey(1), &b);
        assert_eq!(space.len(), 1);
        assert_eq!(space.matching(EdgeDirection::ForwardFixed, 0, 0).count(), 1);
        assert_eq!(space.matching(EdgeDirection::Both, 0, 0).count(), 0);
        assert_eq!(space.matching(EdgeDirection::ReverseFixed, 0, 0).count(), 0);
        // Seen from B the same door pair is an entrance
        assert_eq!(space.reversed().matching(EdgeDirection::ReverseFixed, 0, 0).count(), 1);
    }

    #[test]
    fn test_overlapping_offsets_dropped() {
        // A 1x3 bar with a door on the east of its middle cell cannot host a
        // template whose west door sits two cells into its footprint
        let mut a = RoomTemplate::rectangle(1, "bar", 1, 3);
        a.update_cell(Vec2::new(1, 0), |c| c.with_door(DoorDirection::East, Door::two_way()));
        let mut b = RoomTemplate::rectangle(2, "bar", 1, 3);
        b.update_cell(Vec2::new(0, 0), |c| c.with_door(DoorDirection::West, Door::two_way()));
        let space = ConfigurationSpace::compute(TemplateKey(0), &a, TemplateKey(1), &b);
        assert!(space.is_empty());
    }

    #[test]
    fn test_sorted_and_reversible() {
        let square = {
            let mut t = RoomTemplate::rectangle(1, "sq", 2, 2);
            for p in [Vec2::new(0, 0), Vec2::new(1, 1)] {
                t.update_cell(p, |mut c| {
                    for d in [DoorDirection::North, DoorDirection::East, DoorDirection::South, DoorDirection::West] {
                        c.set_door(d, Some(Door::two_way()));
                    }
                    c
                });
            }
            t
        };
        let space = ConfigurationSpace::compute(TemplateKey(0), &square, TemplateKey(0), &square);
        assert!(!space.is_empty());
        let offsets: Vec<Vec2> = space.configurations().iter().map(|c| c.offset).collect();
        let mut sorted = offsets.clone();
        sorted.sort();
        assert_eq!(offsets, sorted);
        assert_eq!(space.reversed().reversed(), space);
    }

    #[test]
    fn test_cache_computes_pair_once() {
        let mut groups = TemplateGroups::new();
        groups
            .add("g", single(1, &[(DoorDirection::East, DoorType::TwoWay), (DoorDirection::West, DoorType::TwoWay)]))
            .unwrap();
        let library = TemplateLibrary::build(&groups);
        let cache = ConfigurationSpaceCache::new();
        let ab = cache.get(&library, TemplateKey(0), TemplateKey(1)).unwrap();
        assert_eq!(cache.len(), 2);
        let ba = cache.get(&library, TemplateKey(1), TemplateKey(0)).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(ba.as_ref(), &ab.reversed());
        assert!(cache.get(&library, TemplateKey(0), TemplateKey(99)).is_err());
    }
}
