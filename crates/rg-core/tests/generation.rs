mod common;

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use rg_core::generator::{GenerationOutcome, LayoutGenerator};
use rg_core::graph::{EdgeKey, LayoutGraph};
use rg_core::layout::{Layout, RoomId};
use rg_core::room::TemplateGroups;
use rg_core::{CancelToken, GenerationLog, GeneratorSettings, LayoutError};

use common::{ROOMS, geek_graph, graph_from, room_templates};

fn generator(templates: &TemplateGroups) -> LayoutGenerator {
    LayoutGenerator::new(templates, GeneratorSettings::default()).unwrap()
}

/// First seed in 0..16 that produces a layout
fn first_layout(generator: &LayoutGenerator, graph: &LayoutGraph) -> (u64, Layout) {
    for seed in 0..16 {
        let outcome = generator
            .generate(graph, seed, &GenerationLog::silent(), None)
            .unwrap();
        if let GenerationOutcome::Success(layout) = outcome {
            return (seed, layout);
        }
    }
    panic!("no layout for '{}' in 16 seeds", graph.name);
}

fn assert_consistent(layout: &Layout) {
    assert!(layout.find_overlaps().is_empty(), "overlaps: {:?}", layout.find_overlaps());
    for connection in layout.door_connections() {
        assert!(
            layout.is_connection_aligned(connection),
            "misaligned connection {:?}",
            connection
        );
    }
}

#[test]
fn test_geek_layout() {
    let graph = geek_graph();
    let (seed, layout) = first_layout(&generator(&room_templates()), &graph);

    assert_eq!(layout.seed, seed);
    assert_eq!(layout.room_count(), 13);
    assert_eq!(layout.door_connections().len(), 14);
    assert_consistent(&layout);

    // Every graph edge is realized by exactly one connection
    let realized: BTreeSet<(u32, u32)> = layout
        .door_connections()
        .iter()
        .map(|c| c.edge.normalized())
        .collect();
    let edges: BTreeSet<(u32, u32)> = graph.edges().map(|e| e.key().normalized()).collect();
    assert_eq!(realized, edges);
}

#[test]
fn test_same_seed_same_layout() {
    let graph = geek_graph();
    let templates = room_templates();
    let (seed, layout) = first_layout(&generator(&templates), &graph);

    // A fresh generator has an empty configuration space cache
    let again = generator(&templates)
        .generate(&graph, seed, &GenerationLog::silent(), None)
        .unwrap();
    assert_eq!(again.into_layout(), Some(layout));
}

#[test]
fn test_concurrent_runs_share_a_generator() {
    let graph = geek_graph();
    let generator = generator(&room_templates());
    let (seed, expected) = first_layout(&generator, &graph);

    let outcomes: Vec<GenerationOutcome> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    generator
                        .generate(&graph, seed, &GenerationLog::silent(), None)
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for outcome in outcomes {
        assert_eq!(outcome.layout(), Some(&expected));
    }
    assert!(generator.cached_spaces() > 0);
}

#[test]
fn test_required_edge_room() {
    let mut graph = geek_graph();
    {
        let edge = graph.edge_mut(7, 8).unwrap();
        edge.require_room = true;
        edge.template_group = ROOMS.to_string();
    }
    let (_, layout) = first_layout(&generator(&room_templates()), &graph);

    assert_eq!(layout.room_count(), 14);
    assert_eq!(layout.door_connections().len(), 15);
    assert_consistent(&layout);

    let edge_room = RoomId::Edge(EdgeKey::new(7, 8));
    assert!(layout.room(edge_room).is_some());
    let mut neighbors = layout.room_neighbors(edge_room);
    neighbors.sort();
    assert_eq!(neighbors, vec![RoomId::Node(7), RoomId::Node(8)]);
    // 7 and 8 only meet through the edge room
    assert!(!layout.room_neighbors(RoomId::Node(7)).contains(&RoomId::Node(8)));
}

#[test]
fn test_edge_rooms_disabled() {
    let mut graph = geek_graph();
    {
        let edge = graph.edge_mut(1, 2).unwrap();
        edge.room_chance = 1.0;
        edge.template_group = ROOMS.to_string();
    }
    let settings = GeneratorSettings {
        allow_edge_rooms: false,
        ..Default::default()
    };
    let generator = LayoutGenerator::new(&room_templates(), settings).unwrap();
    let (_, layout) = first_layout(&generator, &graph);
    assert_eq!(layout.room_count(), 13);
}

#[test]
fn test_invalid_graphs_are_errors() {
    let generator = generator(&room_templates());
    let log = GenerationLog::silent();

    let empty = LayoutGraph::new(1, "empty");
    assert_eq!(
        generator.generate(&empty, 1, &log, None),
        Err(LayoutError::EmptyGraph)
    );

    let split = graph_from(&[(1, 2), (3, 4)]);
    assert!(matches!(
        generator.generate(&split, 1, &log, None),
        Err(LayoutError::GraphNotFullyConnected { .. })
    ));

    let mut unassigned = graph_from(&[(1, 2)]);
    unassigned.node_mut(2).unwrap().template_group = "halls".to_string();
    assert!(matches!(
        generator.generate(&unassigned, 1, &log, None),
        Err(LayoutError::NoTemplateGroupAssigned { group, .. }) if group == "halls"
    ));
}

#[test]
fn test_cancelled_before_start() {
    let token = CancelToken::new();
    token.cancel();
    let outcome = generator(&room_templates())
        .generate(&geek_graph(), 1, &GenerationLog::silent(), Some(&token))
        .unwrap();
    assert_eq!(outcome, GenerationOutcome::Cancelled);
}

#[test]
fn test_cancel_from_log_callback() {
    // Cancelling as soon as the run starts stops it before any placement
    let token = CancelToken::new();
    let trigger = token.clone();
    let log = GenerationLog::with_callback(move |message| {
        if message.starts_with("generating layout") {
            trigger.cancel();
        }
    });
    let outcome = generator(&room_templates())
        .generate(&geek_graph(), 3, &log, Some(&token))
        .unwrap();
    assert_eq!(outcome, GenerationOutcome::Cancelled);
}

#[test]
fn test_cancel_while_backtracking() {
    // Three 1x1 rooms never close a triangle, so the run keeps rebasing
    let mut templates = TemplateGroups::new();
    templates.add(ROOMS, common::walled(1, "square", 1, 1)).unwrap();
    let settings = GeneratorSettings {
        max_rebases: 10_000,
        ..Default::default()
    };
    let generator = LayoutGenerator::new(&templates, settings).unwrap();

    let token = CancelToken::new();
    let trigger = token.clone();
    let rebases = Arc::new(Mutex::new(0));
    let seen = Arc::clone(&rebases);
    let log = GenerationLog::with_callback(move |message| {
        if message.starts_with("rebase ") {
            *seen.lock().unwrap() += 1;
            trigger.cancel();
        }
    });
    let triangle = graph_from(&[(1, 2), (2, 3), (3, 1)]);
    let outcome = generator.generate(&triangle, 1, &log, Some(&token)).unwrap();

    assert_eq!(outcome, GenerationOutcome::Cancelled);
    assert_eq!(*rebases.lock().unwrap(), 1);
}

#[test]
fn test_log_trail() {
    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&messages);
    let log = GenerationLog::with_callback(move |message| {
        sink.lock().unwrap().push(message.to_string());
    });
    let generator = generator(&room_templates());
    let graph = geek_graph();
    let (seed, _) = first_layout(&generator, &graph);
    generator.generate(&graph, seed, &log, None).unwrap();

    let messages = messages.lock().unwrap();
    assert!(messages[0].starts_with("generating layout 1 'geek'"));
    assert!(messages.iter().any(|m| m.starts_with("placed 13 rooms and 14 door connections")));
}

#[test]
fn test_unplaceable_cycle_fails_cleanly() {
    // Three 1x1 rooms cannot all touch each other
    let mut templates = TemplateGroups::new();
    templates.add(ROOMS, common::walled(1, "square", 1, 1)).unwrap();
    let settings = GeneratorSettings {
        max_rebases: 5,
        ..Default::default()
    };
    let generator = LayoutGenerator::new(&templates, settings).unwrap();
    let triangle = graph_from(&[(1, 2), (2, 3), (3, 1)]);
    let outcome = generator
        .generate(&triangle, 1, &GenerationLog::silent(), None)
        .unwrap();
    assert!(matches!(outcome, GenerationOutcome::Failed(_)));
}
