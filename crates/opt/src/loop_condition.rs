//! Loop condition inlining.
//!
//! Frontends emit loops whose continue condition lives in a separate
//! condition block evaluated once before the first iteration and once after
//! every iteration. This pass rewrites such loops into the canonical shape,
//! where the initial condition is an operand of the loop and the continue
//! condition is the first return value of the body.
use smallvec::SmallVec;
use tracing::{debug, trace};
use trellis_ir::{
    clone_block,
    loops::{CONDITION_ARG, CONTINUE_CONDITION_SLOT},
    BlockId, Graph, LoopShape, LoopShapeError, LoopView, NodeId, Type, ValueId,
};

use crate::{inline_block::splice, TransformError};

#[derive(Debug, Clone, Copy)]
pub struct LoopConditionConfig {
    /// Check that every value a condition block reads is in scope at the
    /// splice site, panicking otherwise. Costs a dominance walk per use.
    /// Enabled by default in all build profiles.
    pub check_splice_sites: bool,
}

impl Default for LoopConditionConfig {
    fn default() -> Self {
        Self {
            check_splice_sites: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineStats {
    pub loops_visited: usize,
    pub loops_rewritten: usize,
    /// Nodes moved out of condition blocks, counting both splice sites.
    pub nodes_inlined: usize,
}

/// Rewrites every loop of `graph` into canonical shape with the default
/// configuration.
pub fn inline_loop_condition(graph: &mut Graph) -> Result<InlineStats, TransformError> {
    LoopConditionInliner::new(LoopConditionConfig::default()).run(graph)
}

#[derive(Debug, Default)]
pub struct LoopConditionInliner {
    config: LoopConditionConfig,
    stats: InlineStats,
}

impl LoopConditionInliner {
    pub fn new(config: LoopConditionConfig) -> Self {
        Self {
            config,
            stats: InlineStats::default(),
        }
    }

    pub fn run(&mut self, graph: &mut Graph) -> Result<InlineStats, TransformError> {
        self.stats = InlineStats::default();
        self.visit_block(graph, graph.root())?;

        debug!(
            visited = self.stats.loops_visited,
            rewritten = self.stats.loops_rewritten,
            inlined = self.stats.nodes_inlined,
            "loop condition inlining done"
        );
        Ok(self.stats)
    }

    fn visit_block(&mut self, graph: &mut Graph, block: BlockId) -> Result<(), TransformError> {
        let mut next = graph.layout.first_node_of(block);
        while let Some(node) = next {
            let blocks: SmallVec<[BlockId; 2]> = graph.dfg.node_blocks(node).into();
            for sub in blocks {
                self.visit_block(graph, sub)?;
            }

            if graph.is_loop(node) {
                self.canonicalize(graph, node)?;
            }

            // Splicing only ever inserts before `node`.
            next = graph.layout.next_node_of(node);
        }

        Ok(())
    }

    fn canonicalize(&mut self, graph: &mut Graph, node: NodeId) -> Result<(), TransformError> {
        self.stats.loops_visited += 1;

        let unsupported = |reason| TransformError::UnsupportedLoopShape { node, reason };
        let view = LoopView::new(graph, node).ok_or(unsupported(LoopShapeError::NotALoop))?;
        let (body, cond) = match view.shape().map_err(unsupported)? {
            LoopShape::Canonical { .. } => {
                trace!(%node, "loop is already canonical");
                return Ok(());
            }
            LoopShape::WithConditionBlock { body, cond } => (body, cond),
        };

        let cond_value = graph.block_returns(cond)[0];
        let ty = graph.dfg.value_ty(cond_value);
        if ty != Type::I1 {
            return Err(TransformError::NonBooleanCondition { node, ty });
        }
        let term = graph
            .terminator(body)
            .ok_or(unsupported(LoopShapeError::MissingTerminator(body)))?;

        let inits: SmallVec<[ValueId; 4]> = view.carried_inits().into();
        let check = self.config.check_splice_sites;
        let num_nodes = graph.layout.iter_node(cond).count() - 1;

        // Evaluated once before the first iteration.
        let copy = clone_block(graph, cond, node);
        let initial = splice(graph, node, copy, &inits, check)[0];
        graph.dfg.insert_arg(node, CONDITION_ARG, initial);

        // Evaluated after every iteration.
        let updates: SmallVec<[ValueId; 4]> = graph.block_returns(body).into();
        let continue_cond = splice(graph, term, cond, &updates, check)[0];
        graph.dfg.insert_arg(term, CONTINUE_CONDITION_SLOT, continue_cond);

        self.stats.loops_rewritten += 1;
        self.stats.nodes_inlined += num_nodes * 2;
        debug!(%node, %body, %cond, nodes = num_nodes, "inlined loop condition");
        Ok(())
    }
}
