//! Shared fixtures for the integration tests

#![allow(dead_code)]

use rg_core::graph::{LayoutGraph, NodeId};
use rg_core::room::{Cell, CollectableSpot, Door, DoorDirection, RoomTemplate, TemplateGroups};

/// Edges of the reference graph: two cycles joined by a bridge, with tails
pub const GEEK_EDGES: [(NodeId, NodeId); 14] = [
    (1, 2),
    (2, 3),
    (3, 4),
    (4, 6),
    (4, 7),
    (5, 6),
    (3, 5),
    (7, 8),
    (6, 10),
    (5, 9),
    (10, 11),
    (11, 12),
    (11, 13),
    (12, 13),
];

pub const ROOMS: &str = "rooms";

pub fn graph_from(edges: &[(NodeId, NodeId)]) -> LayoutGraph {
    let mut graph = LayoutGraph::new(1, "test");
    for &(a, b) in edges {
        graph.add_edge(a, b).unwrap();
    }
    let ids: Vec<NodeId> = graph.node_ids().collect();
    for id in ids {
        graph.node_mut(id).unwrap().template_group = ROOMS.to_string();
    }
    graph
}

pub fn geek_graph() -> LayoutGraph {
    let mut graph = graph_from(&GEEK_EDGES);
    graph.name = "geek".to_string();
    graph
}

/// Rectangle with a two-way door on every outer side of every cell
pub fn walled(id: u32, name: &str, rows: usize, columns: usize) -> RoomTemplate {
    let mut template = RoomTemplate::rectangle(id, name, rows, columns);
    for position in template.footprint() {
        let outer: Vec<DoorDirection> = DoorDirection::ALL[..4]
            .iter()
            .copied()
            .filter(|d| template.cell(position + d.step().0).is_none())
            .collect();
        template.update_cell(position, |cell: Cell| {
            outer
                .iter()
                .fold(cell, |c, &d| c.with_door(d, Door::two_way()))
        });
    }
    template
}

/// Square, bar and block rooms, all in the "rooms" group
pub fn room_templates() -> TemplateGroups {
    let mut groups = TemplateGroups::new();
    groups.add(ROOMS, walled(1, "square", 1, 1)).unwrap();
    groups.add(ROOMS, walled(2, "bar", 1, 2)).unwrap();
    groups.add(ROOMS, walled(3, "block", 2, 2)).unwrap();
    groups
}

/// Like [`room_templates`], with one "loot" spot in every room's first cell
pub fn looted_templates(capacity: u32) -> TemplateGroups {
    let mut groups = TemplateGroups::new();
    for (id, name, rows, columns) in [(1, "square", 1, 1), (2, "bar", 1, 2), (3, "block", 2, 2)] {
        let mut template = walled(id, name, rows, columns);
        template.update_cell(rg_core::room::Vec2::ZERO, |cell: Cell| {
            cell.with_spot(CollectableSpot::new("loot").with_capacity(capacity))
        });
        groups.add(ROOMS, template).unwrap();
    }
    groups
}
