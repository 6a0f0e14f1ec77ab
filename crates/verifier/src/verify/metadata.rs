use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use trellis_ir::{NodeId, Value, ValueId};

use crate::diagnostic::{Diagnostic, DiagnosticCode, Location};

use super::GraphVerifier;

impl GraphVerifier<'_> {
    pub(super) fn check_metadata_consistency(&mut self) {
        let nodes = self.scanned_nodes();

        for &node in &nodes {
            let results = self.graph.dfg.node_results(node).to_vec();
            for (idx, result) in results.into_iter().enumerate() {
                let maps_back = matches!(
                    self.graph.dfg.get_value(result),
                    Some(Value::Result {
                        node: owner,
                        idx: slot,
                        ..
                    }) if *owner == node && *slot == idx
                );
                if !maps_back {
                    self.emit(
                        Diagnostic::error(
                            DiagnosticCode::ResultMapBroken,
                            "node result does not map back to its node",
                            self.node_location(node),
                        )
                        .with_note(format!("result {idx} is {result}")),
                    );
                }
            }
        }

        let mut expected: FxHashMap<ValueId, BTreeSet<NodeId>> = FxHashMap::default();
        for &node in &nodes {
            self.graph.dfg.node(node).for_each_value(&mut |value| {
                expected.entry(value).or_default().insert(node);
            });
        }

        let values: Vec<_> = self.graph.dfg.values.keys().collect();
        for value in values {
            let actual: BTreeSet<NodeId> = self.graph.dfg.users(value).copied().collect();
            let expected = expected.remove(&value).unwrap_or_default();
            if actual != expected {
                self.emit(
                    Diagnostic::error(
                        DiagnosticCode::UsersSetMismatch,
                        "use list does not match the nodes using the value",
                        Location::Value(value),
                    )
                    .with_note(format!("expected {expected:?}, found {actual:?}")),
                );
            }
        }
    }
}
