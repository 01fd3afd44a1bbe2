//! rg-core: room graph layout generation
//!
//! Turns a connectivity graph of rooms plus a library of room templates into
//! a concrete, non-overlapping arrangement of rooms whose doors line up.
//!
//! The crate is split the same way the work flows:
//! - [`graph`]: the layout graph and its decompositions (branches, chains,
//!   cycles, clusters)
//! - [`room`]: cell-grid templates, template groups and configuration spaces
//! - [`layout`]: placed rooms, door connections and the occupancy store
//! - [`generator`]: the backtracking placement engine
//! - [`collectables`]: distance-weighted item distribution over a layout
//! - [`pipeline`]: the generation steps run in sequence over a shared context
//!
//! All randomness comes from [`rg_rng::SeedTree`], so a given graph, template
//! library and seed always produce the same layout.

pub mod collectables;
pub mod generator;
pub mod graph;
pub mod layout;
pub mod pipeline;
pub mod room;

mod cancel;
mod error;
mod logging;
mod settings;

pub use cancel::CancelToken;
pub use error::{LayoutError, Result};
pub use logging::GenerationLog;
pub use settings::{CollectableSettings, GeneratorSettings};

pub use rg_rng::{RandomStream, SeedTree, StreamLabel};
