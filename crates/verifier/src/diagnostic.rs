use std::fmt;

use trellis_ir::{BlockId, NodeId, ValueId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    InvalidValueRef,
    InvalidBlockRef,
    InvalidNodeRef,
    LayoutNodeCycle,
    NodeInMultipleBlocks,
    BlockOwnerMismatch,
    BlockListedTwice,
    DetachedBlockRef,
    MissingRootBlock,
    MissingTerminator,
    TerminatorNotLast,
    DefDoesNotDominateUse,
    OperandCountMismatch,
    OperandTypeMismatch,
    ResultCountMismatch,
    ResultTypeMismatch,
    UnexpectedBlocks,
    IfShapeViolation,
    LoopShapeViolation,
    NonCanonicalLoop,
    UsersSetMismatch,
    ResultMapBroken,
    LoopNeverRuns,
}

impl DiagnosticCode {
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::InvalidValueRef => 1,
            Self::InvalidBlockRef => 2,
            Self::InvalidNodeRef => 3,
            Self::LayoutNodeCycle => 100,
            Self::NodeInMultipleBlocks => 101,
            Self::BlockOwnerMismatch => 102,
            Self::BlockListedTwice => 103,
            Self::DetachedBlockRef => 104,
            Self::MissingRootBlock => 105,
            Self::MissingTerminator => 201,
            Self::TerminatorNotLast => 202,
            Self::DefDoesNotDominateUse => 501,
            Self::OperandCountMismatch => 600,
            Self::OperandTypeMismatch => 601,
            Self::ResultCountMismatch => 602,
            Self::ResultTypeMismatch => 603,
            Self::UnexpectedBlocks => 604,
            Self::IfShapeViolation => 605,
            Self::LoopShapeViolation => 606,
            Self::NonCanonicalLoop => 607,
            Self::UsersSetMismatch => 700,
            Self::ResultMapBroken => 701,
            Self::LoopNeverRuns => 800,
        }
    }
}

/// Renders as `IR` followed by the zero-padded number, e.g. `IR0607`.
impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IR{:04}", self.as_u16())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Graph,
    Block(BlockId),
    Node {
        block: Option<BlockId>,
        node: NodeId,
    },
    Value(ValueId),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Graph => "graph".fmt(f),
            Self::Block(block) => write!(f, "{block}"),
            Self::Node {
                block: Some(block),
                node,
            } => write!(f, "{block}:{node}"),
            Self::Node { block: None, node } => write!(f, "{node}"),
            Self::Value(value) => write!(f, "{value}"),
        }
    }
}

/// A single verifier finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    pub primary: Location,
    /// Kind of the node at `primary`, when it names one.
    pub node_kind: Option<&'static str>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(
        code: DiagnosticCode,
        severity: Severity,
        message: impl Into<String>,
        primary: Location,
    ) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            primary,
            node_kind: None,
            notes: Vec::new(),
        }
    }

    pub fn error(code: DiagnosticCode, message: impl Into<String>, primary: Location) -> Self {
        Self::new(code, Severity::Error, message, primary)
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>, primary: Location) -> Self {
        Self::new(code, Severity::Warning, message, primary)
    }


    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} @ {}",
            self.severity, self.code, self.message, self.primary
        )?;
        if let Some(kind) = self.node_kind {
            write!(f, " ({kind})")?;
        }
        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_render_zero_padded() {
        assert_eq!(DiagnosticCode::InvalidValueRef.to_string(), "IR0001");
        assert_eq!(DiagnosticCode::NonCanonicalLoop.to_string(), "IR0607");
    }

    #[test]
    fn notes_follow_the_headline() {
        let diag = Diagnostic::error(
            DiagnosticCode::MissingRootBlock,
            "root block is not attached",
            Location::Graph,
        )
        .with_note("first")
        .with_note("second");
        assert_eq!(
            diag.to_string(),
            "error [IR0105] root block is not attached @ graph\n  note: first\n  note: second"
        );
    }
}
