//! Generation pipeline
//!
//! A fixed set of steps run in order over a shared [`PipelineContext`]. Each
//! step reads its inputs from the context's named outputs and writes its
//! result back under a well-known name. A step that cannot proceed for an
//! expected reason (placement failure, cancellation) returns a
//! [`StepOutcome`] rather than an error, and the pipeline stops there.

use std::collections::BTreeMap;

use rg_rng::{SeedTree, StreamLabel};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::cancel::CancelToken;
use crate::collectables::{CollectableGroups, distribute_collectables};
use crate::error::{LayoutError, Result};
use crate::generator::{GenerationOutcome, LayoutGenerator};
use crate::graph::LayoutGraph;
use crate::layout::Layout;
use crate::logging::GenerationLog;
use crate::room::TemplateGroups;
use crate::settings::{CollectableSettings, GeneratorSettings};

/// Output name of the layout graph
pub const GRAPH: &str = "LayoutGraph";
/// Output name of the template groups
pub const TEMPLATE_GROUPS: &str = "TemplateGroups";
/// Output name of the collectable groups
pub const COLLECTABLE_GROUPS: &str = "CollectableGroups";
/// Output name of the generated layout
pub const LAYOUT: &str = "Layout";

/// A value stored in the pipeline context
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineValue {
    Graph(LayoutGraph),
    Templates(TemplateGroups),
    Collectables(CollectableGroups),
    Layout(Layout),
}

/// Seed, settings and named outputs shared by the pipeline steps
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineContext {
    pub seed: u64,
    pub settings: GeneratorSettings,
    pub collectable_settings: CollectableSettings,
    outputs: BTreeMap<String, PipelineValue>,
}

impl PipelineContext {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            settings: GeneratorSettings::default(),
            collectable_settings: CollectableSettings::default(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn with_graph(mut self, graph: LayoutGraph) -> Self {
        self.insert(GRAPH, PipelineValue::Graph(graph));
        self
    }

    pub fn with_templates(mut self, templates: TemplateGroups) -> Self {
        self.insert(TEMPLATE_GROUPS, PipelineValue::Templates(templates));
        self
    }

    pub fn with_collectables(mut self, collectables: CollectableGroups) -> Self {
        self.insert(COLLECTABLE_GROUPS, PipelineValue::Collectables(collectables));
        self
    }

    /// Store a value, returning the one it replaces
    pub fn insert(&mut self, name: impl Into<String>, value: PipelineValue) -> Option<PipelineValue> {
        self.outputs.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&PipelineValue> {
        self.outputs.get(name)
    }

    /// Output names in ascending order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(|k| k.as_str())
    }

    pub fn graph(&self) -> Option<&LayoutGraph> {
        match self.outputs.get(GRAPH) {
            Some(PipelineValue::Graph(graph)) => Some(graph),
            _ => None,
        }
    }

    pub fn templates(&self) -> Option<&TemplateGroups> {
        match self.outputs.get(TEMPLATE_GROUPS) {
            Some(PipelineValue::Templates(templates)) => Some(templates),
            _ => None,
        }
    }

    pub fn collectables(&self) -> Option<&CollectableGroups> {
        match self.outputs.get(COLLECTABLE_GROUPS) {
            Some(PipelineValue::Collectables(collectables)) => Some(collectables),
            _ => None,
        }
    }

    pub fn layout(&self) -> Option<&Layout> {
        match self.outputs.get(LAYOUT) {
            Some(PipelineValue::Layout(layout)) => Some(layout),
            _ => None,
        }
    }

    fn layout_mut(&mut self) -> Option<&mut Layout> {
        match self.outputs.get_mut(LAYOUT) {
            Some(PipelineValue::Layout(layout)) => Some(layout),
            _ => None,
        }
    }

    /// Remove and return the generated layout
    pub fn take_layout(&mut self) -> Option<Layout> {
        match self.outputs.remove(LAYOUT) {
            Some(PipelineValue::Layout(layout)) => Some(layout),
            Some(other) => {
                self.outputs.insert(LAYOUT.to_string(), other);
                None
            }
            None => None,
        }
    }
}

/// How a step ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    /// The step could not produce its output; carries the reason
    Failed(String),
    Cancelled,
}

/// The generation steps
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize,
)]
pub enum GenerationStep {
    /// Permute interchangeable nodes of the graph
    RandomizeGraph,
    /// Place rooms for the graph
    GenerateLayout,
    /// Assign collectables to the layout's spots; skipped without collectables
    DistributeCollectables,
}

fn missing(name: &str) -> LayoutError {
    LayoutError::MissingInput(name.to_string())
}

impl GenerationStep {
    pub fn run(
        self,
        context: &mut PipelineContext,
        log: &GenerationLog,
        cancel: Option<&CancelToken>,
    ) -> Result<StepOutcome> {
        log.debug(format!("pipeline step {}", self));
        match self {
            GenerationStep::RandomizeGraph => {
                let graph = context.graph().ok_or_else(|| missing(GRAPH))?;
                let mut rng = SeedTree::new(context.seed).stream(StreamLabel::GraphVariation);
                let variation = graph.create_variation(&mut rng)?;
                context.insert(GRAPH, PipelineValue::Graph(variation));
                Ok(StepOutcome::Continue)
            }
            GenerationStep::GenerateLayout => {
                let graph = context.graph().ok_or_else(|| missing(GRAPH))?;
                let templates = context
                    .templates()
                    .ok_or_else(|| missing(TEMPLATE_GROUPS))?;
                let generator = LayoutGenerator::new(templates, context.settings.clone())?;
                match generator.generate(graph, context.seed, log, cancel)? {
                    GenerationOutcome::Success(layout) => {
                        context.insert(LAYOUT, PipelineValue::Layout(layout));
                        Ok(StepOutcome::Continue)
                    }
                    GenerationOutcome::Failed(reason) => Ok(StepOutcome::Failed(reason)),
                    GenerationOutcome::Cancelled => Ok(StepOutcome::Cancelled),
                }
            }
            GenerationStep::DistributeCollectables => {
                let Some(groups) = context.collectables().cloned() else {
                    log.debug("no collectables to distribute");
                    return Ok(StepOutcome::Continue);
                };
                let settings = context.collectable_settings.clone();
                let layout = context.layout_mut().ok_or_else(|| missing(LAYOUT))?;
                distribute_collectables(layout, &groups, &settings)?;
                log.info(format!("distributed {} collectables", groups.len()));
                Ok(StepOutcome::Continue)
            }
        }
    }
}

/// An ordered list of steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    steps: Vec<GenerationStep>,
}

impl Default for Pipeline {
    /// Randomize the graph, generate the layout, distribute collectables
    fn default() -> Self {
        Self::new(vec![
            GenerationStep::RandomizeGraph,
            GenerationStep::GenerateLayout,
            GenerationStep::DistributeCollectables,
        ])
    }
}

impl Pipeline {
    pub fn new(steps: Vec<GenerationStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[GenerationStep] {
        &self.steps
    }

    /// Run every step in order, stopping at the first that does not continue
    pub fn run(
        &self,
        context: &mut PipelineContext,
        log: &GenerationLog,
        cancel: Option<&CancelToken>,
    ) -> Result<StepOutcome> {
        for step in &self.steps {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                log.info("generation cancelled");
                return Ok(StepOutcome::Cancelled);
            }
            match step.run(context, log, cancel)? {
                StepOutcome::Continue => {}
                stopped => {
                    log.warn(format!("pipeline stopped at {}", step));
                    return Ok(stopped);
                }
            }
        }
        Ok(StepOutcome::Continue)
    }
}
