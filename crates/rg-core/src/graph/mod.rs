//! Layout graph and its decompositions
//!
//! The decomposers only look at the adjacency index; they know nothing
//! about templates or positions.

mod branch;
mod chain;
mod cluster;
mod cycle;
mod layout_graph;

pub use branch::{dead_end_nodes, find_branches};
pub use chain::{Chain, ChainLink, find_chains};
pub use cluster::{find_cluster, find_clusters, find_distances};
pub use cycle::{cycle_edges, cycle_nodes, find_cycles};
pub use layout_graph::{
    Color, DEFAULT_COLOR, EdgeDirection, EdgeKey, LayoutEdge, LayoutGraph, LayoutNode, NodeId,
};
