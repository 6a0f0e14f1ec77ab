use thiserror::Error;
use trellis_ir::{BlockId, LoopShapeError, NodeId, Type, ValueId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("graph takes {expected} arguments, {found} given")]
    ArgumentCount { expected: usize, found: usize },

    #[error("{node}: expected {expected} operand, found {found}")]
    TypeMismatch {
        node: NodeId,
        expected: Type,
        found: Type,
    },

    #[error("{node}: cannot evaluate malformed loop")]
    MalformedLoop {
        node: NodeId,
        #[source]
        reason: LoopShapeError,
    },

    #[error("{node}: malformed node: {reason}")]
    MalformedNode { node: NodeId, reason: &'static str },

    #[error("{0} is read before it is defined")]
    UndefinedValue(ValueId),

    #[error("{0} has no terminator")]
    MissingTerminator(BlockId),

    #[error("fuel of {0} nodes exhausted")]
    FuelExhausted(u64),
}
