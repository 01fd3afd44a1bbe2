mod common;

use std::collections::BTreeSet;

use rg_core::graph::{NodeId, dead_end_nodes, find_branches, find_chains, find_cycles};

use common::{GEEK_EDGES, geek_graph};

fn as_sets(groups: Vec<Vec<NodeId>>) -> BTreeSet<BTreeSet<NodeId>> {
    groups.into_iter().map(|g| g.into_iter().collect()).collect()
}

#[test]
fn test_geek_cycles() {
    let cycles = find_cycles(&geek_graph());
    assert_eq!(cycles.len(), 2);
    assert_eq!(
        as_sets(cycles),
        BTreeSet::from([BTreeSet::from([3, 4, 5, 6]), BTreeSet::from([11, 12, 13])])
    );
}

#[test]
fn test_geek_branches() {
    let branches = find_branches(&geek_graph());
    assert_eq!(branches.len(), 4);
    assert_eq!(
        as_sets(branches),
        BTreeSet::from([
            BTreeSet::from([9, 5]),
            BTreeSet::from([1, 2, 3]),
            BTreeSet::from([8, 7, 4]),
            BTreeSet::from([11, 10, 6]),
        ])
    );
}

#[test]
fn test_geek_branches_start_on_cycles() {
    let cycle_nodes: BTreeSet<NodeId> = [3, 4, 5, 6, 11, 12, 13].into();
    for branch in find_branches(&geek_graph()) {
        assert!(cycle_nodes.contains(&branch[0]), "branch {:?}", branch);
    }
}

#[test]
fn test_geek_dead_ends() {
    assert_eq!(
        dead_end_nodes(&geek_graph()),
        BTreeSet::from([1, 2, 7, 8, 9])
    );
}

#[test]
fn test_geek_chains_cover_every_edge_once() {
    let graph = geek_graph();
    for max_length in [None, Some(1), Some(2), Some(3)] {
        let chains = find_chains(&graph, max_length);
        let mut covered: Vec<(NodeId, NodeId)> = chains
            .iter()
            .flat_map(|c| c.links().iter().map(|l| l.normalized()))
            .collect();
        covered.sort();
        let mut expected: Vec<(NodeId, NodeId)> =
            GEEK_EDGES.iter().map(|&(a, b)| (a.min(b), a.max(b))).collect();
        expected.sort();
        assert_eq!(covered, expected, "max length {:?}", max_length);

        if let Some(max) = max_length {
            assert!(chains.iter().all(|c| c.len() <= max));
        }
    }
}

#[test]
fn test_geek_chains_are_connected_runs() {
    for chain in find_chains(&geek_graph(), None) {
        for pair in chain.links().windows(2) {
            assert_eq!(pair[0].to, pair[1].from, "chain {:?}", chain);
        }
    }
}
