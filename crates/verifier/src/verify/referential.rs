use trellis_ir::{NodeId, Value, ValueId};

use crate::diagnostic::{Diagnostic, DiagnosticCode};

use super::GraphVerifier;

impl GraphVerifier<'_> {
    pub(super) fn check_referential_integrity(&mut self) {
        for node in self.scanned_nodes() {
            let args = self.graph.dfg.node_args(node).to_vec();
            for arg in args {
                self.check_value_ref(node, arg);
            }
        }
    }

    fn check_value_ref(&mut self, user: NodeId, value: ValueId) {
        let problem = match self.graph.dfg.get_value(value) {
            None => "operand refers to a missing value",
            Some(Value::Param { block, .. }) if !self.block_to_nodes.contains_key(block) => {
                "operand is a parameter of a block outside the graph"
            }
            Some(Value::Result { node, .. }) if !self.node_to_block.contains_key(node) => {
                "operand is defined by a node outside the graph"
            }
            _ => return,
        };

        self.emit(
            Diagnostic::error(
                DiagnosticCode::InvalidValueRef,
                problem,
                self.node_location(user),
            )
            .with_note(format!("operand {value}")),
        );
    }
}
