//! Node (instruction) definitions.
use std::fmt;

use cranelift_entity::entity_impl;
use smallvec::SmallVec;

use crate::{BlockId, Type, ValueId};

/// An opaque reference to [`NodeData`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);
entity_impl!(NodeId, "node");

/// The closed set of node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A plain instruction with a single result.
    Op(Opcode),

    /// Two-way branch. Operands are `[cond]`, blocks are `[then, else]` and
    /// both branches return one value per node result.
    If,

    /// Structured loop.
    ///
    /// Canonical shape: operands `[max_trip_count, initial_cond, carried..]`,
    /// a single `body(iter, carried..)` block returning
    /// `[continue_cond, carried'..]`.
    ///
    /// Frontend shape: operands `[max_trip_count, carried..]`, blocks
    /// `[body, cond]` where `body(iter, carried..)` returns `[carried'..]` and
    /// `cond(carried..)` returns the condition.
    ///
    /// In both shapes the node results are the final carried values.
    Loop,

    /// Block terminator; its operands are the block's return values.
    Return,
}

impl NodeKind {
    pub fn is_terminator(self) -> bool {
        matches!(self, Self::Return)
    }

    pub fn as_text(self) -> &'static str {
        match self {
            Self::Op(op) => op.as_text(),
            Self::If => "if",
            Self::Loop => "loop",
            Self::Return => "return",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Add,
    Sub,
    Mul,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    Not,
    /// Passes its operand through and makes it observable.
    Trace,
}

impl Opcode {
    pub fn arity(self) -> usize {
        match self {
            Self::Not | Self::Trace => 1,
            _ => 2,
        }
    }

    /// Result type of the operation given its operand types.
    ///
    /// Operand types are not validated here; that is the verifier's job.
    pub fn result_ty(self, args: &[Type]) -> Type {
        match self {
            Self::Add | Self::Sub | Self::Mul => Type::I64,
            Self::Lt | Self::Le | Self::Gt | Self::Ge | Self::Eq | Self::Ne => Type::I1,
            Self::And | Self::Or | Self::Not | Self::Trace => {
                args.first().copied().unwrap_or(Type::I1)
            }
        }
    }

    /// Operand types the operation accepts, or `None` when the operation is
    /// polymorphic over a single operand type.
    pub fn operand_ty(self) -> Option<Type> {
        match self {
            Self::Add | Self::Sub | Self::Mul => Some(Type::I64),
            Self::Lt | Self::Le | Self::Gt | Self::Ge => Some(Type::I64),
            Self::Eq | Self::Ne | Self::And | Self::Or | Self::Not | Self::Trace => None,
        }
    }

    pub fn as_text(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_text())
    }
}

/// A node data definition.
///
/// A node doesn't hold its position in a block; that is managed by
/// [`crate::Layout`].
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    pub(crate) args: SmallVec<[ValueId; 4]>,
    pub(crate) results: SmallVec<[ValueId; 2]>,
    pub(crate) blocks: SmallVec<[BlockId; 2]>,
}

impl NodeData {
    pub fn new(kind: NodeKind, args: &[ValueId]) -> Self {
        Self {
            kind,
            args: args.into(),
            results: SmallVec::new(),
            blocks: SmallVec::new(),
        }
    }

    pub fn args(&self) -> &[ValueId] {
        &self.args
    }

    pub fn results(&self) -> &[ValueId] {
        &self.results
    }

    /// Blocks owned by this node, in order.
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    pub fn is_terminator(&self) -> bool {
        self.kind.is_terminator()
    }

    pub fn for_each_value(&self, f: &mut dyn FnMut(ValueId)) {
        for &arg in &self.args {
            f(arg)
        }
    }

    pub fn for_each_value_mut(&mut self, f: &mut dyn FnMut(&mut ValueId)) {
        for arg in &mut self.args {
            f(arg)
        }
    }
}
