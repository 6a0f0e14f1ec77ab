//! This module contains Trellis IR value definition.
use std::fmt;

use cranelift_entity::entity_impl;

use super::{BlockId, NodeId, Type};

/// An opaque reference to [`Value`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Copy, Hash)]
pub struct ValueId(pub u32);
entity_impl!(ValueId, "v");

/// An value data definition.
///
/// Every value has exactly one definition site: the result slot of a node, a
/// parameter slot of a block, or an interned immediate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// The value is the `idx`-th result of a node.
    Result { node: NodeId, idx: usize, ty: Type },

    /// The value is the `idx`-th parameter of a block.
    Param { block: BlockId, idx: usize, ty: Type },

    /// The value is immediate value. Immediates are in scope everywhere.
    Immediate { imm: Immediate, ty: Type },
}

impl Value {
    pub fn ty(&self) -> Type {
        match self {
            Self::Result { ty, .. } | Self::Param { ty, .. } | Self::Immediate { ty, .. } => *ty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Immediate {
    I1(bool),
    I64(i64),
}

impl Immediate {
    pub fn ty(&self) -> Type {
        match self {
            Self::I1(..) => Type::I1,
            Self::I64(..) => Type::I64,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::I1(v) => Some(v),
            Self::I64(..) => None,
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        match self {
            Self::I64(v) => Some(v),
            Self::I1(..) => None,
        }
    }
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::I1(v) => {
                if *v {
                    write!(f, "1")
                } else {
                    write!(f, "0")
                }
            }
            Self::I64(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for Immediate {
    fn from(imm: bool) -> Self {
        Self::I1(imm)
    }
}

impl From<i64> for Immediate {
    fn from(imm: i64) -> Self {
        Self::I64(imm)
    }
}

impl From<i32> for Immediate {
    fn from(imm: i32) -> Self {
        Self::I64(imm as i64)
    }
}
