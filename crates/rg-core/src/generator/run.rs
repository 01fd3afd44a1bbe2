//! One generation run
//!
//! Random draws happen in a fixed order. Edge rooms come from the edge-room
//! stream, one draw per edge in key order, before anything is placed. Each
//! placement step then shuffles the eligible template variations with the
//! template stream (entries below their minimum first, then the rest) and,
//! per variation, shuffles the fitting configurations with the
//! configuration stream.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rg_rng::{RandomStream, SeedTree, StreamLabel};

use super::decision::{
    Candidate, CommitRecord, DecisionPoint, DecisionStack, PlacementState, StreamSnapshot,
};
use super::plan::{PlacementStep, plan_placement};
use super::{GenerationOutcome, GeneratorState, LayoutGenerator};
use crate::cancel::CancelToken;
use crate::error::{LayoutError, Result};
use crate::graph::{Color, LayoutGraph};
use crate::layout::{DoorConnection, Layout, Room, RoomId};
use crate::logging::GenerationLog;
use crate::room::{RoomTemplate, TemplateKey, Vec2};

/// What a room is drawn from
#[derive(Debug, Clone)]
struct RoomSource {
    name: String,
    group: usize,
    z: i32,
    color: Color,
}

pub(super) struct Run<'a> {
    generator: &'a LayoutGenerator,
    graph: &'a LayoutGraph,
    seed: u64,
    log: &'a GenerationLog,
    sources: BTreeMap<RoomId, RoomSource>,
    steps: Vec<PlacementStep>,
    templates: RandomStream,
    configurations: RandomStream,
    state: PlacementState,
    stack: DecisionStack,
    rebases: usize,
}

impl<'a> Run<'a> {
    /// Validate the inputs, draw edge rooms and plan the placement order
    pub fn prepare(
        generator: &'a LayoutGenerator,
        graph: &'a LayoutGraph,
        seed: u64,
        log: &'a GenerationLog,
    ) -> Result<Self> {
        let settings = &generator.settings;
        let library = &generator.library;
        log.info(format!(
            "generating layout {} '{}' with seed {}",
            graph.id, graph.name, seed
        ));
        log.debug(format!("state: {}", GeneratorState::Init));

        graph.validate()?;
        let resolve = |group: &str, source: &str| {
            library
                .group_index(group)
                .filter(|_| library.has_group(group))
                .ok_or_else(|| LayoutError::NoTemplateGroupAssigned {
                    source_name: source.to_string(),
                    group: group.to_string(),
                })
        };

        let mut sources = BTreeMap::new();
        for node in graph.nodes() {
            sources.insert(
                RoomId::Node(node.id),
                RoomSource {
                    name: node.name.clone(),
                    group: resolve(&node.template_group, &node.name)?,
                    z: node.z,
                    color: node.color,
                },
            );
        }

        let tree = SeedTree::new(seed);
        let mut edge_stream = tree.stream(StreamLabel::EdgeRooms);
        let mut edge_rooms = BTreeSet::new();
        for edge in graph.edges() {
            let materialize = if settings.allow_edge_rooms {
                // One draw per edge, whatever its settings
                let roll = edge_stream.chance(f64::from(edge.room_chance));
                edge.require_room || roll
            } else {
                edge.require_room
            };
            // Edges that could become rooms under another seed are checked too
            let needs_group =
                materialize || (settings.allow_edge_rooms && edge.may_become_room());
            if !needs_group {
                continue;
            }
            let group = resolve(&edge.template_group, &edge.name)?;
            if materialize {
                edge_rooms.insert(edge.key());
                sources.insert(
                    RoomId::Edge(edge.key()),
                    RoomSource {
                        name: edge.name.clone(),
                        group,
                        z: edge.z,
                        color: edge.color,
                    },
                );
            }
        }
        log.debug(format!("state: {}", GeneratorState::GraphValidated));

        log.debug(format!("state: {}", GeneratorState::ChainOrdering));
        let steps = plan_placement(graph, &edge_rooms, settings.max_branch_length)?;
        log.debug(format!(
            "{} placement steps, {} edge rooms",
            steps.len(),
            edge_rooms.len()
        ));

        Ok(Self {
            generator,
            graph,
            seed,
            log,
            sources,
            steps,
            templates: tree.stream(StreamLabel::Templates),
            configurations: tree.stream(StreamLabel::Configurations),
            state: PlacementState::default(),
            stack: DecisionStack::default(),
            rebases: 0,
        })
    }

    /// Place every step, backtracking through the decision stack as needed
    pub fn execute(mut self, cancel: Option<&CancelToken>) -> Result<GenerationOutcome> {
        let mut step_index = 0;
        let mut resume: Option<DecisionPoint> = None;
        let mut current_chain = None;

        while let Some(step) = self.steps.get(step_index).cloned() {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                self.log
                    .debug(format!("state: {}", GeneratorState::Cancelled));
                self.log.info("generation cancelled");
                return Ok(GenerationOutcome::Cancelled);
            }
            if current_chain != Some(step.chain) {
                current_chain = Some(step.chain);
                self.log
                    .debug(format!("state: {}", GeneratorState::PlacingChain(step.chain)));
            }

            let mut point = match resume.take() {
                Some(point) => point,
                None => {
                    let candidates = self.candidates(&step)?;
                    self.log.debug(format!(
                        "step {}: {} candidates for {}",
                        step_index,
                        candidates.len(),
                        step.target
                    ));
                    DecisionPoint::new(step_index, candidates, self.snapshot())
                }
            };

            if let Some(candidate) = point.next_candidate() {
                point.record = Some(self.commit(&step, candidate)?);
                self.stack.push(point);
                step_index += 1;
                continue;
            }

            match self.backtrack(&step) {
                Ok(point) => {
                    step_index = point.step;
                    resume = Some(point);
                }
                Err(reason) => {
                    self.log.debug(format!("state: {}", GeneratorState::Failed));
                    self.log.warn(&reason);
                    return Ok(GenerationOutcome::Failed(reason));
                }
            }
        }

        self.log.debug(format!("state: {}", GeneratorState::Placed));
        let layout = self.into_layout()?;
        Ok(GenerationOutcome::Success(layout))
    }

    fn snapshot(&self) -> StreamSnapshot {
        StreamSnapshot {
            templates: self.templates.clone(),
            configurations: self.configurations.clone(),
        }
    }

    fn source(&self, id: RoomId) -> Result<&RoomSource> {
        self.sources
            .get(&id)
            .ok_or_else(|| LayoutError::InvalidId(format!("room source for {}", id)))
    }

    fn template(&self, key: TemplateKey) -> Result<&'a Arc<RoomTemplate>> {
        let generator: &'a LayoutGenerator = self.generator;
        generator
            .library
            .template(key)
            .ok_or_else(|| LayoutError::InvalidId(format!("template variation {}", key.0)))
    }

    /// Every placement of the step's room that fits right now, in try order
    fn candidates(&mut self, step: &PlacementStep) -> Result<Vec<Candidate>> {
        let generator: &'a LayoutGenerator = self.generator;
        let cap = generator.settings.max_candidates_per_step;
        let (group, z) = {
            let source = self.source(step.target)?;
            (source.group, source.z)
        };

        let (mut preferred, mut others) = generator.library.eligible(group, &self.state.usage);
        self.templates.shuffle(&mut preferred);
        self.templates.shuffle(&mut others);
        let keys = preferred.into_iter().chain(others);

        let Some(anchor) = step.anchor else {
            return Ok(keys
                .take(cap)
                .map(|key| Candidate {
                    key,
                    position: Vec2::ZERO,
                    connections: Vec::new(),
                })
                .collect());
        };
        let anchor_room = *self.state.room(anchor.other).ok_or_else(|| {
            LayoutError::InvalidChainOrder(format!("anchor {} is not placed", anchor.other))
        })?;

        let mut candidates = Vec::new();
        for key in keys {
            let template = self.template(key)?;
            let space = generator
                .spaces
                .get(&generator.library, anchor_room.key, key)?;
            let mut found = Vec::new();
            for config in space.matching(anchor.direction, anchor.code, z - anchor_room.z) {
                let position = anchor_room.position + config.offset;
                if self.state.occupancy.collides(template, position, z) {
                    continue;
                }
                let Some(closing) = self.closing_connections(step, key, position, z)? else {
                    continue;
                };
                let mut connections = Vec::with_capacity(1 + closing.len());
                connections.push(DoorConnection {
                    from_room: anchor.other,
                    to_room: step.target,
                    from_door: config.from_door,
                    to_door: config.to_door,
                    edge: anchor.edge,
                });
                connections.extend(closing);
                found.push(Candidate {
                    key,
                    position,
                    connections,
                });
            }
            self.configurations.shuffle(&mut found);
            candidates.extend(found);
            if candidates.len() >= cap {
                candidates.truncate(cap);
                break;
            }
        }
        Ok(candidates)
    }

    /// Connections to the step's already placed neighbors, if the room at
    /// `position` meets every one of them exactly
    fn closing_connections(
        &self,
        step: &PlacementStep,
        key: TemplateKey,
        position: Vec2,
        z: i32,
    ) -> Result<Option<Vec<DoorConnection>>> {
        let generator = self.generator;
        let mut connections = Vec::with_capacity(step.closing.len());
        for link in &step.closing {
            let far = self.state.room(link.other).ok_or_else(|| {
                LayoutError::InvalidChainOrder(format!("closing room {} is not placed", link.other))
            })?;
            let space = generator.spaces.get(&generator.library, key, far.key)?;
            let Some(config) = space
                .matching_offset(link.direction, link.code, far.position - position, far.z - z)
                .next()
                .copied()
            else {
                return Ok(None);
            };
            connections.push(DoorConnection {
                from_room: step.target,
                to_room: link.other,
                from_door: config.from_door,
                to_door: config.to_door,
                edge: link.edge,
            });
        }
        Ok(Some(connections))
    }

    fn commit(&mut self, step: &PlacementStep, candidate: Candidate) -> Result<CommitRecord> {
        let z = self.source(step.target)?.z;
        let template = self.template(candidate.key)?;
        let entry = self.generator.library.origin(candidate.key).ok_or_else(|| {
            LayoutError::InvalidId(format!("template variation {}", candidate.key.0))
        })?;
        Ok(self.state.commit(step.target, candidate, template, z, entry))
    }

    /// Undo placements until a decision with an untried candidate is found
    ///
    /// Decisions with nothing left to try are discarded on the way. Resuming
    /// a decision counts as one rebase. Returns the failure reason when the
    /// stack runs dry or the rebase budget is spent.
    fn backtrack(&mut self, failed: &PlacementStep) -> std::result::Result<DecisionPoint, String> {
        let max_rebases = self.generator.settings.max_rebases;
        loop {
            let Some(mut point) = self.stack.pop() else {
                return Err(format!(
                    "no placement for {} and no earlier decision to revisit",
                    failed.target
                ));
            };
            if let Some(record) = point.record.take() {
                self.state.undo(&record);
            }
            if point.remaining() == 0 {
                continue;
            }
            if self.rebases >= max_rebases {
                return Err(format!(
                    "rebases exhausted: {} used, no placement for {}",
                    self.rebases, failed.target
                ));
            }
            self.rebases += 1;
            self.templates = point.streams.templates.clone();
            self.configurations = point.streams.configurations.clone();
            let target = self
                .steps
                .get(point.step)
                .map(|s| s.target.to_string())
                .unwrap_or_default();
            self.log.warn(format!(
                "rebase {}/{}: no placement for {}, retrying {} ({} candidates left, depth {})",
                self.rebases,
                max_rebases,
                failed.target,
                target,
                point.remaining(),
                self.stack.depth()
            ));
            return Ok(point);
        }
    }

    fn into_layout(mut self) -> Result<Layout> {
        let mut rooms = BTreeMap::new();
        for (&id, placed) in &self.state.rooms {
            let source = self.source(id)?;
            rooms.insert(
                id,
                Room {
                    id,
                    name: source.name.clone(),
                    position: placed.position,
                    z: placed.z,
                    template: Arc::clone(self.template(placed.key)?),
                    color: source.color,
                    collectables: Vec::new(),
                },
            );
        }
        let connections = std::mem::take(&mut self.state.connections);

        self.log.debug(format!("state: {}", GeneratorState::Success));
        self.log.info(format!(
            "placed {} rooms and {} door connections with {} rebases",
            rooms.len(),
            connections.len(),
            self.rebases
        ));
        Ok(Layout::from_parts(
            self.graph.id,
            self.graph.name.clone(),
            self.seed,
            rooms,
            connections,
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::generator::{GenerationOutcome, LayoutGenerator};
    use crate::graph::{EdgeDirection, LayoutGraph};
    use crate::layout::RoomId;
    use crate::room::{Cell, Door, DoorDirection, DoorType, RoomTemplate, TemplateGroups, Vec2};
    use crate::{GenerationLog, GeneratorSettings, LayoutError};

    fn one_cell(doors: &[(DoorDirection, DoorType)]) -> RoomTemplate {
        let mut template = RoomTemplate::rectangle(1, "cell", 1, 1);
        template.update_cell(Vec2::ZERO, |mut c: Cell| {
            for &(d, ty) in doors {
                c.set_door(d, Some(Door::new(ty, 0)));
            }
            c
        });
        template
    }

    fn four_doors() -> RoomTemplate {
        one_cell(&[
            (DoorDirection::North, DoorType::TwoWay),
            (DoorDirection::East, DoorType::TwoWay),
            (DoorDirection::South, DoorType::TwoWay),
            (DoorDirection::West, DoorType::TwoWay),
        ])
    }

    fn generator(template: RoomTemplate) -> LayoutGenerator {
        let mut groups = TemplateGroups::new();
        groups.add("rooms", template).unwrap();
        LayoutGenerator::new(&groups, GeneratorSettings::default()).unwrap()
    }

    fn path(n: u32) -> LayoutGraph {
        let mut graph = LayoutGraph::new(1, "path");
        for id in 1..n {
            graph.add_edge(id, id + 1).unwrap();
        }
        for id in 1..=n {
            graph.node_mut(id).unwrap().template_group = "rooms".to_string();
        }
        graph
    }

    #[test]
    fn test_single_room() {
        let mut graph = LayoutGraph::new(1, "one");
        graph.add_node(1).template_group = "rooms".to_string();
        let outcome = generator(four_doors())
            .generate(&graph, 3, &GenerationLog::silent(), None)
            .unwrap();
        let layout = outcome.into_layout().unwrap();
        assert_eq!(layout.room_count(), 1);
        assert_eq!(layout.room(RoomId::Node(1)).unwrap().position, Vec2::ZERO);
    }

    #[test]
    fn test_path_is_placed() {
        let graph = path(5);
        let outcome = generator(four_doors())
            .generate(&graph, 11, &GenerationLog::silent(), None)
            .unwrap();
        let layout = outcome.into_layout().unwrap();
        assert_eq!(layout.room_count(), 5);
        assert_eq!(layout.door_connections().len(), 4);
        assert!(layout.find_overlaps().is_empty());
    }

    #[test]
    fn test_missing_group_is_an_error() {
        let mut graph = path(2);
        graph.node_mut(2).unwrap().template_group = "nowhere".to_string();
        let result = generator(four_doors()).generate(&graph, 1, &GenerationLog::silent(), None);
        assert!(matches!(
            result,
            Err(LayoutError::NoTemplateGroupAssigned { .. })
        ));
    }

    #[test]
    fn test_one_way_edge_needs_one_way_doors() {
        let mut graph = path(2);
        graph.edge_mut(1, 2).unwrap().direction = EdgeDirection::ForwardFixed;

        // Two-way doors only: nothing fits, which is a failed run, not an error
        let outcome = generator(four_doors())
            .generate(&graph, 5, &GenerationLog::silent(), None)
            .unwrap();
        assert!(matches!(outcome, GenerationOutcome::Failed(_)));

        let one_way = one_cell(&[
            (DoorDirection::East, DoorType::OneWayExit),
            (DoorDirection::West, DoorType::OneWayEntrance),
        ]);
        let layout = generator(one_way)
            .generate(&graph, 5, &GenerationLog::silent(), None)
            .unwrap()
            .into_layout()
            .unwrap();
        let connection = &layout.door_connections()[0];
        assert_eq!(connection.from_room, RoomId::Node(1));
        assert_eq!(connection.from_door.door.door_type, DoorType::OneWayExit);
        assert_eq!(connection.to_door.door.door_type, DoorType::OneWayEntrance);
    }
}
