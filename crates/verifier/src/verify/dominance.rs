use crate::diagnostic::{Diagnostic, DiagnosticCode};

use super::GraphVerifier;

impl GraphVerifier<'_> {
    pub(super) fn check_dominance_rules(&mut self) {
        for node in self.scanned_nodes() {
            let args = self.graph.dfg.node_args(node).to_vec();
            for arg in args {
                if self.graph.dfg.is_imm(arg) || self.graph.is_available_at(arg, node) {
                    continue;
                }

                self.emit(
                    Diagnostic::error(
                        DiagnosticCode::DefDoesNotDominateUse,
                        "operand is not available at its use",
                        self.node_location(node),
                    )
                    .with_note(format!("definition of {arg} does not dominate {node}")),
                );
            }
        }
    }
}
