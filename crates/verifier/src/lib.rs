mod config;
mod diagnostic;
mod report;
mod verify;

pub use config::{VerificationLevel, VerifierConfig};
pub use diagnostic::{Diagnostic, DiagnosticCode, Location, Severity};
pub use report::VerificationReport;
pub use verify::{verify_graph, verify_graph_or_panic};

/// Verifies `$graph` at [`VerificationLevel::Full`] in debug builds and panics
/// with the report on errors.
#[macro_export]
macro_rules! debug_verify_graph {
    ($graph:expr) => {{
        if cfg!(debug_assertions) {
            let cfg = $crate::VerifierConfig::for_level($crate::VerificationLevel::Full);
            $crate::verify_graph_or_panic($graph, &cfg);
        }
    }};
}
