use thiserror::Error;
use trellis_ir::{LoopShapeError, NodeId, Type};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("{node}: unsupported loop shape")]
    UnsupportedLoopShape {
        node: NodeId,
        #[source]
        reason: LoopShapeError,
    },

    #[error("{node}: loop condition has type {ty}, expected i1")]
    NonBooleanCondition { node: NodeId, ty: Type },
}
