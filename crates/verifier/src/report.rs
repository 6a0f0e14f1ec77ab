use std::fmt;

use crate::diagnostic::{Diagnostic, DiagnosticCode, Severity};

/// Everything the verifier found, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub diagnostics: Vec<Diagnostic>,
    /// Number of diagnostics dropped after `max_diagnostics` was reached.
    pub truncated: usize,
}

impl VerificationReport {
    /// `true` when there are no errors. Warnings do not fail verification.
    pub fn is_ok(&self) -> bool {
        !self.has_errors()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.with_severity(Severity::Warning)
    }

    pub fn has_code(&self, code: DiagnosticCode) -> bool {
        self.diagnostics.iter().any(|diag| diag.code == code)
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |diag| diag.severity == severity)
    }

    pub(crate) fn push(&mut self, diagnostic: Diagnostic, max_diagnostics: usize) {
        if max_diagnostics == 0 || self.diagnostics.len() < max_diagnostics {
            self.diagnostics.push(diagnostic);
        } else {
            self.truncated += 1;
        }
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.diagnostics.is_empty() {
            return f.write_str("graph is well formed");
        }

        for diagnostic in &self.diagnostics {
            writeln!(f, "{diagnostic}")?;
        }
        write!(
            f,
            "{} error(s), {} warning(s)",
            self.errors().count(),
            self.warnings().count()
        )?;
        if self.truncated > 0 {
            write!(f, ", {} more not shown", self.truncated)?;
        }
        Ok(())
    }
}
