//! This module contains Trellis IR type definitions.
use std::fmt;

/// Scalar types of IR values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    I1,
    I64,
}

impl Type {
    pub fn is_bool(self) -> bool {
        self == Self::I1
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I1 => write!(f, "i1"),
            Self::I64 => write!(f, "i64"),
        }
    }
}
