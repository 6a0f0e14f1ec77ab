use trellis_ir::{Immediate, LoopShape, LoopView, NodeId, NodeKind, Opcode, Type, ValueId};

use crate::diagnostic::{Diagnostic, DiagnosticCode};

use super::{display_tys, GraphVerifier};

impl GraphVerifier<'_> {
    pub(super) fn check_type_rules(&mut self) {
        for node in self.scanned_nodes() {
            match self.graph.dfg.node_kind(node) {
                NodeKind::Op(op) => self.check_op(node, op),
                NodeKind::If => self.check_if(node),
                NodeKind::Loop => self.check_loop(node),
                NodeKind::Return => self.check_return(node),
            }
        }
    }

    pub(super) fn check_canonical_loops(&mut self) {
        let graph = self.graph;
        for node in self.scanned_nodes() {
            let Some(view) = LoopView::new(graph, node) else {
                continue;
            };
            if let Ok(LoopShape::WithConditionBlock { cond, .. }) = view.shape() {
                self.emit(
                    Diagnostic::error(
                        DiagnosticCode::NonCanonicalLoop,
                        "loop still owns a condition block",
                        self.node_location(node),
                    )
                    .with_note(format!("condition block {cond}")),
                );
            }
        }
    }

    fn check_op(&mut self, node: NodeId, op: Opcode) {
        let graph = self.graph;
        let data = graph.dfg.node(node);
        if !data.blocks().is_empty() {
            self.emit(Diagnostic::error(
                DiagnosticCode::UnexpectedBlocks,
                "plain instruction owns blocks",
                self.node_location(node),
            ));
        }

        let args = data.args();
        if args.len() != op.arity() {
            self.emit(
                Diagnostic::error(
                    DiagnosticCode::OperandCountMismatch,
                    "wrong number of operands",
                    self.node_location(node),
                )
                .with_note(format!("expected {}, found {}", op.arity(), args.len())),
            );
            return;
        }

        let tys = self.value_tys(args);
        match op.operand_ty() {
            Some(expected) => {
                for (idx, &ty) in tys.iter().enumerate() {
                    if ty != expected {
                        self.emit(
                            Diagnostic::error(
                                DiagnosticCode::OperandTypeMismatch,
                                "operand type does not match instruction",
                                self.node_location(node),
                            )
                            .with_note(format!("operand {idx}: expected {expected}, found {ty}")),
                        );
                    }
                }
            }
            None => {
                if tys.windows(2).any(|pair| pair[0] != pair[1]) {
                    self.emit(
                        Diagnostic::error(
                            DiagnosticCode::OperandTypeMismatch,
                            "operands must have the same type",
                            self.node_location(node),
                        )
                        .with_note(format!("found {}", display_tys(&tys))),
                    );
                }
            }
        }

        self.expect_result_tys(node, &[op.result_ty(&tys)]);
    }

    fn check_if(&mut self, node: NodeId) {
        let graph = self.graph;
        let data = graph.dfg.node(node);

        match data.args() {
            [cond] => {
                let ty = graph.dfg.value_ty(*cond);
                if ty != Type::I1 {
                    self.emit(
                        Diagnostic::error(
                            DiagnosticCode::OperandTypeMismatch,
                            "if condition must be i1",
                            self.node_location(node),
                        )
                        .with_note(format!("found {ty}")),
                    );
                }
            }
            args => {
                self.emit(
                    Diagnostic::error(
                        DiagnosticCode::OperandCountMismatch,
                        "if takes exactly one operand",
                        self.node_location(node),
                    )
                    .with_note(format!("found {}", args.len())),
                );
            }
        }

        if data.blocks().len() != 2 {
            self.emit(
                Diagnostic::error(
                    DiagnosticCode::IfShapeViolation,
                    "if must own a then and an else block",
                    self.node_location(node),
                )
                .with_note(format!("found {} blocks", data.blocks().len())),
            );
            return;
        }

        let result_tys = self.value_tys(data.results());
        for &branch in data.blocks() {
            if !graph.dfg.block_params(branch).is_empty() {
                self.emit(
                    Diagnostic::error(
                        DiagnosticCode::IfShapeViolation,
                        "if branch takes parameters",
                        self.node_location(node),
                    )
                    .with_note(format!("{branch}")),
                );
            }

            let returned = self.value_tys(graph.block_returns(branch));
            if returned != result_tys {
                self.emit(
                    Diagnostic::error(
                        DiagnosticCode::IfShapeViolation,
                        "if branch returns do not match the node results",
                        self.node_location(node),
                    )
                    .with_note(format!(
                        "{branch} returns {}, node produces {}",
                        display_tys(&returned),
                        display_tys(&result_tys)
                    )),
                );
            }
        }
    }

    fn check_loop(&mut self, node: NodeId) {
        let graph = self.graph;
        let Some(view) = LoopView::new(graph, node) else {
            return;
        };
        let shape = match view.shape() {
            Ok(shape) => shape,
            Err(reason) => {
                self.emit(
                    Diagnostic::error(
                        DiagnosticCode::LoopShapeViolation,
                        "malformed loop",
                        self.node_location(node),
                    )
                    .with_note(reason.to_string()),
                );
                return;
            }
        };

        let trip_ty = graph.dfg.value_ty(view.max_trip_count());
        if trip_ty != Type::I64 {
            self.emit(
                Diagnostic::error(
                    DiagnosticCode::OperandTypeMismatch,
                    "loop trip count must be i64",
                    self.node_location(node),
                )
                .with_note(format!("found {trip_ty}")),
            );
        }

        let carried = self.value_tys(view.carried_inits());
        let results = self.value_tys(graph.dfg.node_results(node));
        if results != carried {
            self.emit(
                Diagnostic::error(
                    DiagnosticCode::ResultTypeMismatch,
                    "loop results do not match its carried values",
                    self.node_location(node),
                )
                .with_note(format!(
                    "carried {}, results {}",
                    display_tys(&carried),
                    display_tys(&results)
                )),
            );
        }

        let body = shape.body();
        let body_params = self.value_tys(graph.dfg.block_params(body));
        if body_params[0] != Type::I64 || body_params[1..] != carried[..] {
            self.emit(
                Diagnostic::error(
                    DiagnosticCode::LoopShapeViolation,
                    "loop body parameters must be the iteration index and the carried values",
                    self.node_location(node),
                )
                .with_note(format!("{body} takes {}", display_tys(&body_params))),
            );
        }

        let returned = self.value_tys(view.carried_updates());
        if returned != carried {
            self.emit(
                Diagnostic::error(
                    DiagnosticCode::LoopShapeViolation,
                    "loop body must return updated carried values",
                    self.node_location(node),
                )
                .with_note(format!(
                    "{body} returns {}, carried {}",
                    display_tys(&returned),
                    display_tys(&carried)
                )),
            );
        }

        match shape {
            LoopShape::Canonical { .. } => {
                let initial = view.initial_condition();
                let continue_cond = graph.block_returns(body).first().copied();
                for cond in initial.into_iter().chain(continue_cond) {
                    self.expect_condition(node, cond);
                }

                let trip = graph.dfg.value_imm(view.max_trip_count());
                let never_enters = initial.and_then(|c| graph.dfg.value_imm(c))
                    == Some(Immediate::I1(false))
                    || trip.and_then(|t| t.as_i64()).map_or(false, |t| t <= 0);
                if never_enters {
                    self.emit(Diagnostic::warning(
                        DiagnosticCode::LoopNeverRuns,
                        "loop body never executes",
                        self.node_location(node),
                    ));
                }
            }

            LoopShape::WithConditionBlock { cond, .. } => {
                let params = self.value_tys(graph.dfg.block_params(cond));
                if params != carried {
                    self.emit(
                        Diagnostic::error(
                            DiagnosticCode::LoopShapeViolation,
                            "condition block parameters must be the carried values",
                            self.node_location(node),
                        )
                        .with_note(format!("{cond} takes {}", display_tys(&params))),
                    );
                }
                if let Some(&value) = graph.block_returns(cond).first() {
                    self.expect_condition(node, value);
                }
            }
        }
    }

    fn check_return(&mut self, node: NodeId) {
        let graph = self.graph;
        let data = graph.dfg.node(node);
        if !data.results().is_empty() {
            self.emit(Diagnostic::error(
                DiagnosticCode::ResultCountMismatch,
                "return must not produce results",
                self.node_location(node),
            ));
        }
        if !data.blocks().is_empty() {
            self.emit(Diagnostic::error(
                DiagnosticCode::UnexpectedBlocks,
                "return owns blocks",
                self.node_location(node),
            ));
        }
    }

    fn expect_condition(&mut self, node: NodeId, cond: ValueId) {
        let ty = self.graph.dfg.value_ty(cond);
        if ty != Type::I1 {
            self.emit(
                Diagnostic::error(
                    DiagnosticCode::OperandTypeMismatch,
                    "loop condition must be i1",
                    self.node_location(node),
                )
                .with_note(format!("{cond} has type {ty}")),
            );
        }
    }

    fn expect_result_tys(&mut self, node: NodeId, expected: &[Type]) {
        let found = self.value_tys(self.graph.dfg.node_results(node));
        if found.len() != expected.len() {
            self.emit(
                Diagnostic::error(
                    DiagnosticCode::ResultCountMismatch,
                    "wrong number of results",
                    self.node_location(node),
                )
                .with_note(format!("expected {}, found {}", expected.len(), found.len())),
            );
        } else if found[..] != expected[..] {
            self.emit(
                Diagnostic::error(
                    DiagnosticCode::ResultTypeMismatch,
                    "result type does not match instruction",
                    self.node_location(node),
                )
                .with_note(format!(
                    "expected {}, found {}",
                    display_tys(expected),
                    display_tys(&found)
                )),
            );
        }
    }
}
