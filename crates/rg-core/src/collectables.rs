//! Collectable distribution
//!
//! Assigns every collectable id of every group to a spot of that group in a
//! generated layout. Spots are drawn by weight, where a spot's weight is its
//! own weight times (distance + 1)^exponent and distance is the door hop
//! count to the nearest of the reference room and the rooms filled so far.
//! Farther spots are preferred, which spreads items through the layout.
//!
//! Draws come from the layout seed's collectable stream, so the same layout
//! and groups always produce the same assignment.

use std::collections::BTreeMap;

use rg_rng::{SeedTree, StreamLabel};
use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::graph::find_distances;
use crate::layout::{AssignedCollectable, Layout, RoomId, SpotKey};
use crate::settings::CollectableSettings;

/// Collectable ids by group name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectableGroups {
    groups: BTreeMap<String, Vec<u32>>,
}

impl CollectableGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one id; an id may appear only once per group
    pub fn add(&mut self, group: impl Into<String>, id: u32) -> Result<()> {
        let group = group.into();
        let ids = self.groups.entry(group.clone()).or_default();
        if ids.contains(&id) {
            return Err(LayoutError::DuplicateId(format!(
                "collectable {} in group '{}'",
                id, group
            )));
        }
        ids.push(id);
        Ok(())
    }

    pub fn add_all(
        &mut self,
        group: impl Into<String>,
        ids: impl IntoIterator<Item = u32>,
    ) -> Result<()> {
        let group = group.into();
        for id in ids {
            self.add(group.clone(), id)?;
        }
        Ok(())
    }

    pub fn group(&self, name: &str) -> Option<&[u32]> {
        self.groups.get(name).map(|v| v.as_slice())
    }

    /// Groups in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u32])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Total number of ids over all groups
    pub fn len(&self) -> usize {
        self.groups.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
struct OpenSpot {
    room: RoomId,
    key: SpotKey,
    remaining: u32,
    weight: f64,
}

/// Spots of `group` in room, cell and index order, with capacity left
fn open_spots(layout: &Layout, group: &str) -> Vec<OpenSpot> {
    let mut spots = Vec::new();
    for room in layout.rooms() {
        for (position, cell) in room.template.occupied() {
            for (index, spot) in cell.collectable_spots.iter().enumerate() {
                if spot.group != group {
                    continue;
                }
                let key = SpotKey { position, index };
                let used = room.collectables_at(key) as u32;
                spots.push(OpenSpot {
                    room: room.id,
                    key,
                    remaining: spot.capacity.saturating_sub(used),
                    weight: spot.weight,
                });
            }
        }
    }
    spots
}

/// Assign every collectable in `groups` to a spot in `layout`
///
/// Either every id is assigned or the layout is left untouched. Fails with
/// [`LayoutError::CollectableSpotNotFound`] when a group has no spots, or
/// runs out of spot capacity, and with [`LayoutError::InvalidId`] when the
/// configured reference room is not in the layout.
pub fn distribute_collectables(
    layout: &mut Layout,
    groups: &CollectableGroups,
    settings: &CollectableSettings,
) -> Result<()> {
    settings.validate()?;
    if groups.is_empty() {
        return Ok(());
    }

    let start = match settings.initial_distance_room {
        Some(id) if layout.room(id).is_some() => Some(id),
        Some(id) => {
            return Err(LayoutError::InvalidId(format!("reference room {}", id)));
        }
        None => layout.room_ids().next(),
    };
    let adjacency = layout.room_adjacency();
    let mut distances = find_distances(&adjacency, start, usize::MAX);
    let mut rng = SeedTree::new(layout.seed).stream(StreamLabel::Collectables);
    let mut assigned: Vec<(RoomId, AssignedCollectable)> = Vec::with_capacity(groups.len());

    for (group, ids) in groups.iter() {
        if ids.is_empty() {
            continue;
        }
        let mut spots = open_spots(layout, group);
        let not_found = || LayoutError::CollectableSpotNotFound {
            group: group.to_string(),
        };
        if spots.is_empty() {
            return Err(not_found());
        }

        for &id in ids {
            let weights: Vec<f64> = spots
                .iter()
                .map(|spot| {
                    if spot.remaining == 0 {
                        return 0.0;
                    }
                    let distance = distances.get(&spot.room).copied().unwrap_or(0);
                    spot.weight * ((distance + 1) as f64).powf(settings.distance_exponent)
                })
                .collect();

            let index = match rng.weighted_index(&weights) {
                Some(index) => index,
                None => {
                    // Every open spot has zero weight: fall back to a uniform pick
                    let open: Vec<usize> = spots
                        .iter()
                        .enumerate()
                        .filter(|(_, spot)| spot.remaining > 0)
                        .map(|(i, _)| i)
                        .collect();
                    *rng.choose(&open).ok_or_else(not_found)?
                }
            };

            let spot = &mut spots[index];
            spot.remaining -= 1;
            assigned.push((
                spot.room,
                AssignedCollectable {
                    spot: spot.key,
                    group: group.to_string(),
                    collectable_id: id,
                },
            ));
            for (room, distance) in find_distances(&adjacency, [spot.room], usize::MAX) {
                distances
                    .entry(room)
                    .and_modify(|d| *d = (*d).min(distance))
                    .or_insert(distance);
            }
        }
        log::debug!(target: crate::logging::TARGET, "distributed {} collectables of group '{}'", ids.len(), group);
    }

    for (room, collectable) in assigned {
        if let Some(room) = layout.room_mut(room) {
            room.collectables.push(collectable);
        }
    }
    Ok(())
}
