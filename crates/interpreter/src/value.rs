use std::fmt;

use trellis_ir::{Immediate, Type};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum EvalValue {
    I1(bool),
    I64(i64),
}

impl EvalValue {
    pub fn ty(self) -> Type {
        match self {
            Self::I1(_) => Type::I1,
            Self::I64(_) => Type::I64,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::I1(v) => Some(v),
            Self::I64(_) => None,
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        match self {
            Self::I64(v) => Some(v),
            Self::I1(_) => None,
        }
    }
}

impl From<Immediate> for EvalValue {
    fn from(imm: Immediate) -> Self {
        match imm {
            Immediate::I1(v) => Self::I1(v),
            Immediate::I64(v) => Self::I64(v),
        }
    }
}

impl From<bool> for EvalValue {
    fn from(v: bool) -> Self {
        Self::I1(v)
    }
}

impl From<i64> for EvalValue {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl fmt::Display for EvalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I1(v) => write!(f, "{}.i1", *v as u8),
            Self::I64(v) => write!(f, "{v}.i64"),
        }
    }
}
