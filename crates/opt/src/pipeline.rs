//! Pass pipeline over a single graph.
//!
//! [`Pipeline`] holds an ordered sequence of [`Pass`]es and runs them one
//! after another, stopping at the first pass that fails.
use tracing::debug;
use trellis_ir::Graph;

use crate::{
    loop_condition::{LoopConditionConfig, LoopConditionInliner},
    TransformError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    /// Move loop condition blocks into the loop operands and body returns.
    InlineLoopCondition,
    /// Recompute use lists from layout-inserted nodes only.
    RebuildUsers,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    passes: Vec<Pass>,
    /// Configuration for all [`Pass::InlineLoopCondition`] runs.
    pub loop_condition_config: LoopConditionConfig,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            loop_condition_config: LoopConditionConfig::default(),
        }
    }

    /// Canonicalize every loop.
    pub fn default_pipeline() -> Self {
        let mut p = Self::new();
        p.add_pass(Pass::InlineLoopCondition);
        p
    }

    /// Append a pass to the pipeline. Returns `&mut Self` for chaining.
    pub fn add_pass(&mut self, pass: Pass) -> &mut Self {
        self.passes.push(pass);
        self
    }

    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    pub fn run(&self, graph: &mut Graph) -> Result<(), TransformError> {
        for &pass in &self.passes {
            run_pass(pass, graph, self.loop_condition_config)?;
        }
        Ok(())
    }
}

impl Default for Pipeline {
    /// Returns [`Pipeline::default_pipeline`], not an empty pipeline.
    fn default() -> Self {
        Self::default_pipeline()
    }
}

/// Run `passes` on `graph` with default pass configurations.
pub fn run_passes(passes: &[Pass], graph: &mut Graph) -> Result<(), TransformError> {
    for &pass in passes {
        run_pass(pass, graph, LoopConditionConfig::default())?;
    }
    Ok(())
}

fn run_pass(
    pass: Pass,
    graph: &mut Graph,
    loop_condition_config: LoopConditionConfig,
) -> Result<(), TransformError> {
    debug!(?pass, "running pass");
    match pass {
        Pass::InlineLoopCondition => {
            LoopConditionInliner::new(loop_condition_config).run(graph)?;
        }
        Pass::RebuildUsers => {
            graph.rebuild_users();
        }
    }
    Ok(())
}
