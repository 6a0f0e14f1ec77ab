//! Structured loop shapes.
use std::fmt;

use crate::{BlockId, Graph, NodeId, ValueId};

/// Operand index of the maximum trip count.
pub const TRIP_COUNT_ARG: usize = 0;

/// Operand index of the initial condition in a canonical loop.
pub const CONDITION_ARG: usize = 1;

/// Return slot of the continue condition in a canonical loop body.
pub const CONTINUE_CONDITION_SLOT: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopShape {
    /// The condition is an operand of the loop and a return of the body.
    Canonical { body: BlockId },

    /// The condition is computed by a separate block owned by the loop.
    WithConditionBlock { body: BlockId, cond: BlockId },
}

impl LoopShape {
    pub fn body(self) -> BlockId {
        match self {
            Self::Canonical { body } | Self::WithConditionBlock { body, .. } => body,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopShapeError {
    NotALoop,
    BlockCount(usize),
    MissingOperands,
    BodyParamCount { expected: usize, found: usize },
    BodyReturnCount { expected: usize, found: usize },
    ResultCount { expected: usize, found: usize },
    ConditionParamCount { expected: usize, found: usize },
    ConditionReturnCount(usize),
    MissingTerminator(BlockId),
}

impl fmt::Display for LoopShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotALoop => write!(f, "node is not a loop"),
            Self::BlockCount(n) => write!(f, "loop owns {n} blocks, expected 1 or 2"),
            Self::MissingOperands => write!(f, "loop is missing its trip count or condition"),
            Self::BodyParamCount { expected, found } => {
                write!(f, "body takes {found} parameters, expected {expected}")
            }
            Self::BodyReturnCount { expected, found } => {
                write!(f, "body returns {found} values, expected {expected}")
            }
            Self::ResultCount { expected, found } => {
                write!(f, "loop has {found} results, expected {expected}")
            }
            Self::ConditionParamCount { expected, found } => {
                write!(f, "condition block takes {found} parameters, expected {expected}")
            }
            Self::ConditionReturnCount(n) => {
                write!(f, "condition block returns {n} values, expected exactly 1")
            }
            Self::MissingTerminator(block) => write!(f, "{block} has no return terminator"),
        }
    }
}

impl std::error::Error for LoopShapeError {}

/// A read-only view over a loop node.
#[derive(Clone, Copy)]
pub struct LoopView<'a> {
    graph: &'a Graph,
    node: NodeId,
}

impl<'a> LoopView<'a> {
    pub fn new(graph: &'a Graph, node: NodeId) -> Option<Self> {
        graph.is_loop(node).then_some(Self { graph, node })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn max_trip_count(&self) -> ValueId {
        self.graph.dfg.node_args(self.node)[TRIP_COUNT_ARG]
    }

    /// Number of loop-carried values.
    pub fn num_carried(&self) -> usize {
        self.graph.dfg.node_results(self.node).len()
    }

    /// Initial condition operand; `None` when the condition lives in a
    /// separate block.
    pub fn initial_condition(&self) -> Option<ValueId> {
        match self.graph.dfg.node_blocks(self.node).len() {
            1 => self.graph.dfg.node_args(self.node).get(CONDITION_ARG).copied(),
            _ => None,
        }
    }

    /// Initial values of the loop-carried variables.
    pub fn carried_inits(&self) -> &'a [ValueId] {
        let args = self.graph.dfg.node_args(self.node);
        let skip = match self.graph.dfg.node_blocks(self.node).len() {
            1 => 2,
            _ => 1,
        };
        args.get(skip..).unwrap_or(&[])
    }

    /// Body returns that become the next iteration's carried values.
    pub fn carried_updates(&self) -> &'a [ValueId] {
        let body = self.graph.dfg.node_blocks(self.node)[0];
        let returns = self.graph.block_returns(body);
        let skip = match self.graph.dfg.node_blocks(self.node).len() {
            1 => 1,
            _ => 0,
        };
        returns.get(skip..).unwrap_or(&[])
    }

    /// Classifies the loop, checking the arity of its operands, blocks and
    /// results.
    pub fn shape(&self) -> Result<LoopShape, LoopShapeError> {
        let dfg = &self.graph.dfg;
        let blocks = dfg.node_blocks(self.node);
        let num_args = dfg.node_args(self.node).len();
        let num_results = dfg.node_results(self.node).len();

        let (shape, num_carried) = match *blocks {
            [body] => {
                if num_args < 2 {
                    return Err(LoopShapeError::MissingOperands);
                }
                (LoopShape::Canonical { body }, num_args - 2)
            }
            [body, cond] => {
                if num_args < 1 {
                    return Err(LoopShapeError::MissingOperands);
                }
                (LoopShape::WithConditionBlock { body, cond }, num_args - 1)
            }
            _ => return Err(LoopShapeError::BlockCount(blocks.len())),
        };

        if num_results != num_carried {
            return Err(LoopShapeError::ResultCount {
                expected: num_carried,
                found: num_results,
            });
        }

        let body = shape.body();
        let body_params = dfg.block_params(body).len();
        if body_params != num_carried + 1 {
            return Err(LoopShapeError::BodyParamCount {
                expected: num_carried + 1,
                found: body_params,
            });
        }

        if self.graph.terminator(body).is_none() {
            return Err(LoopShapeError::MissingTerminator(body));
        }
        let expected_returns = match shape {
            LoopShape::Canonical { .. } => num_carried + 1,
            LoopShape::WithConditionBlock { .. } => num_carried,
        };
        let body_returns = self.graph.block_returns(body).len();
        if body_returns != expected_returns {
            return Err(LoopShapeError::BodyReturnCount {
                expected: expected_returns,
                found: body_returns,
            });
        }

        if let LoopShape::WithConditionBlock { cond, .. } = shape {
            let cond_params = dfg.block_params(cond).len();
            if cond_params != num_carried {
                return Err(LoopShapeError::ConditionParamCount {
                    expected: num_carried,
                    found: cond_params,
                });
            }
            if self.graph.terminator(cond).is_none() {
                return Err(LoopShapeError::MissingTerminator(cond));
            }
            let cond_returns = self.graph.block_returns(cond).len();
            if cond_returns != 1 {
                return Err(LoopShapeError::ConditionReturnCount(cond_returns));
            }
        }

        Ok(shape)
    }
}

/// Classifies `node` as a loop.
pub fn loop_shape(graph: &Graph, node: NodeId) -> Result<LoopShape, LoopShapeError> {
    match LoopView::new(graph, node) {
        Some(view) => view.shape(),
        None => Err(LoopShapeError::NotALoop),
    }
}
