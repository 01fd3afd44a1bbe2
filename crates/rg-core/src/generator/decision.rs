//! Backtracking state
//!
//! Every committed placement leaves a [`DecisionPoint`] on the stack holding
//! the candidates not tried yet, what the commit changed, and the random
//! streams as they stood after its candidates were drawn. Rolling back is a
//! pop followed by [`PlacementState::undo`].

use std::collections::BTreeMap;

use rg_rng::RandomStream;

use crate::layout::{DoorConnection, OccupancyMap, RoomId};
use crate::room::{EntryRef, RoomTemplate, TemplateKey, Vec2};

/// Where a room went
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PlacedRoom {
    pub key: TemplateKey,
    pub position: Vec2,
    pub z: i32,
}

/// One fully checked way to perform a step
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Candidate {
    pub key: TemplateKey,
    pub position: Vec2,
    /// The anchor connection first, then one per closing link
    pub connections: Vec<DoorConnection>,
}

/// What a commit changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CommitRecord {
    pub room: RoomId,
    pub entry: EntryRef,
    /// Connection count before the commit
    pub connections_before: usize,
}

/// Stream positions to restore when resuming a decision
#[derive(Debug, Clone)]
pub(crate) struct StreamSnapshot {
    pub templates: RandomStream,
    pub configurations: RandomStream,
}

#[derive(Debug, Clone)]
pub(crate) struct DecisionPoint {
    pub step: usize,
    /// Untried candidates, next one last
    remaining: Vec<Candidate>,
    pub record: Option<CommitRecord>,
    pub streams: StreamSnapshot,
}

impl DecisionPoint {
    pub fn new(step: usize, mut candidates: Vec<Candidate>, streams: StreamSnapshot) -> Self {
        candidates.reverse();
        Self {
            step,
            remaining: candidates,
            record: None,
            streams,
        }
    }

    pub fn next_candidate(&mut self) -> Option<Candidate> {
        self.remaining.pop()
    }

    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct DecisionStack {
    points: Vec<DecisionPoint>,
}

impl DecisionStack {
    pub fn push(&mut self, point: DecisionPoint) {
        self.points.push(point);
    }

    pub fn pop(&mut self) -> Option<DecisionPoint> {
        self.points.pop()
    }

    pub fn depth(&self) -> usize {
        self.points.len()
    }
}

/// Rooms, connections, occupancy and template usage of one run
#[derive(Debug, Default)]
pub(crate) struct PlacementState {
    pub rooms: BTreeMap<RoomId, PlacedRoom>,
    pub connections: Vec<DoorConnection>,
    pub occupancy: OccupancyMap,
    pub usage: BTreeMap<EntryRef, u32>,
}

impl PlacementState {
    pub fn room(&self, id: RoomId) -> Option<&PlacedRoom> {
        self.rooms.get(&id)
    }

    pub fn commit(
        &mut self,
        room: RoomId,
        candidate: Candidate,
        template: &RoomTemplate,
        z: i32,
        entry: EntryRef,
    ) -> CommitRecord {
        let record = CommitRecord {
            room,
            entry,
            connections_before: self.connections.len(),
        };
        self.occupancy
            .commit(room, template, candidate.position, z);
        self.rooms.insert(
            room,
            PlacedRoom {
                key: candidate.key,
                position: candidate.position,
                z,
            },
        );
        *self.usage.entry(entry).or_default() += 1;
        self.connections.extend(candidate.connections);
        record
    }

    pub fn undo(&mut self, record: &CommitRecord) {
        self.occupancy.rollback(record.room);
        self.rooms.remove(&record.room);
        if let Some(count) = self.usage.get_mut(&record.entry) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.usage.remove(&record.entry);
            }
        }
        self.connections.truncate(record.connections_before);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeKey;
    use crate::room::{Door, DoorDirection, DoorPosition};

    fn candidate(x: i32) -> Candidate {
        Candidate {
            key: TemplateKey(0),
            position: Vec2::new(x, 0),
            connections: Vec::new(),
        }
    }

    fn streams() -> StreamSnapshot {
        StreamSnapshot {
            templates: RandomStream::new(1),
            configurations: RandomStream::new(2),
        }
    }

    #[test]
    fn test_candidates_come_out_in_order() {
        let mut point = DecisionPoint::new(3, vec![candidate(1), candidate(2)], streams());
        assert_eq!(point.remaining(), 2);
        assert_eq!(point.next_candidate().unwrap().position.x, 1);
        assert_eq!(point.next_candidate().unwrap().position.x, 2);
        assert!(point.next_candidate().is_none());

        let mut stack = DecisionStack::default();
        stack.push(point);
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.pop().unwrap().step, 3);
        assert!(stack.pop().is_none());
    }

    #[test]
    fn test_undo_restores_state() {
        let template = RoomTemplate::rectangle(1, "sq", 1, 1);
        let entry = EntryRef { group: 0, entry: 0 };
        let mut state = PlacementState::default();

        let first = state.commit(RoomId::Node(1), candidate(0), &template, 0, entry);
        let door = DoorPosition {
            position: Vec2::ZERO,
            direction: DoorDirection::East,
            door: Door::two_way(),
        };
        let mut second_candidate = candidate(1);
        second_candidate.connections.push(DoorConnection {
            from_room: RoomId::Node(1),
            to_room: RoomId::Node(2),
            from_door: door,
            to_door: DoorPosition {
                direction: DoorDirection::West,
                ..door
            },
            edge: EdgeKey::new(1, 2),
        });
        let second = state.commit(RoomId::Node(2), second_candidate, &template, 0, entry);

        assert_eq!(state.usage[&entry], 2);
        assert_eq!(state.connections.len(), 1);
        assert!(state.occupancy.collides(&template, Vec2::new(1, 0), 0));

        state.undo(&second);
        assert_eq!(state.usage[&entry], 1);
        assert!(state.connections.is_empty());
        assert!(!state.occupancy.collides(&template, Vec2::new(1, 0), 0));
        assert!(state.room(RoomId::Node(2)).is_none());

        state.undo(&first);
        assert!(state.usage.is_empty());
        assert!(state.rooms.is_empty());
        assert_eq!(state.occupancy.cell_count(), 0);
    }
}
