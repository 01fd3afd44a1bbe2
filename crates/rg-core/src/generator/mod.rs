//! Backtracking placement engine
//!
//! A [`LayoutGenerator`] owns the template library and the configuration
//! space cache; both are read-only during generation, so one generator can
//! serve any number of runs, including concurrent ones. Everything a run
//! changes (occupancy, decision stack, usage counts, random streams) lives in
//! the run itself.
//!
//! Placement failure and cancellation are ordinary outcomes, not errors:
//! [`LayoutGenerator::generate`] only returns `Err` for invalid input.

mod decision;
mod plan;
mod run;

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::graph::LayoutGraph;
use crate::layout::Layout;
use crate::logging::GenerationLog;
use crate::room::{ConfigurationSpaceCache, TemplateGroups, TemplateLibrary};
use crate::settings::GeneratorSettings;

/// Stage of a generation run, as reported in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, Serialize, Deserialize)]
pub enum GeneratorState {
    Init,
    GraphValidated,
    ChainOrdering,
    PlacingChain(usize),
    Placed,
    Success,
    Cancelled,
    Failed,
}

impl fmt::Display for GeneratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorState::PlacingChain(chain) => write!(f, "PlacingChain({})", chain),
            other => {
                let name: &'static str = other.into();
                f.write_str(name)
            }
        }
    }
}

/// How a generation run ended
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Success(Layout),
    /// Placement ran out of candidates or rebases; carries the reason
    Failed(String),
    Cancelled,
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Success(_))
    }

    pub fn layout(&self) -> Option<&Layout> {
        match self {
            GenerationOutcome::Success(layout) => Some(layout),
            _ => None,
        }
    }

    pub fn into_layout(self) -> Option<Layout> {
        match self {
            GenerationOutcome::Success(layout) => Some(layout),
            _ => None,
        }
    }
}

/// Layout generator for one set of template groups
#[derive(Debug)]
pub struct LayoutGenerator {
    library: TemplateLibrary,
    spaces: ConfigurationSpaceCache,
    settings: GeneratorSettings,
}

impl LayoutGenerator {
    /// Build the variation library for `groups`
    ///
    /// Configuration spaces are computed lazily, the first time a run needs
    /// a given template pair.
    pub fn new(groups: &TemplateGroups, settings: GeneratorSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            library: TemplateLibrary::build(groups),
            spaces: ConfigurationSpaceCache::new(),
            settings,
        })
    }

    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Number of template pairs whose configuration space is cached
    pub fn cached_spaces(&self) -> usize {
        self.spaces.len()
    }

    /// Generate a layout for `graph`
    ///
    /// The same graph, template groups and seed always give the same
    /// outcome. `cancel` is polled before every placement attempt.
    pub fn generate(
        &self,
        graph: &LayoutGraph,
        seed: u64,
        log: &GenerationLog,
        cancel: Option<&CancelToken>,
    ) -> Result<GenerationOutcome> {
        run::Run::prepare(self, graph, seed, log)?.execute(cancel)
    }
}
