use cranelift_entity::SecondaryMap;
use smallvec::SmallVec;
use trellis_ir::{loop_shape, BlockId, Graph, LoopShape, NodeId, NodeKind, Opcode, Type, ValueId};

use crate::{EvalError, EvalValue};

type Values = SmallVec<[EvalValue; 4]>;

#[derive(Debug, Clone, Copy)]
pub struct MachineConfig {
    /// Maximum number of nodes to execute before giving up.
    pub fuel: u64,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self { fuel: 1_000_000 }
    }
}

/// Result of a complete evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub outputs: Vec<EvalValue>,
    /// Operands of every executed `trace`, in execution order.
    pub trace: Vec<EvalValue>,
}

/// Tree-walking evaluator over a [`Graph`].
pub struct Machine {
    config: MachineConfig,
    locals: SecondaryMap<ValueId, Option<EvalValue>>,
    trace: Vec<EvalValue>,
    fuel: u64,
}

impl Machine {
    pub fn new(config: MachineConfig) -> Self {
        Self {
            config,
            locals: SecondaryMap::new(),
            trace: Vec::new(),
            fuel: config.fuel,
        }
    }

    /// Evaluates `graph` on `args` with the default configuration.
    pub fn run(graph: &Graph, args: &[EvalValue]) -> Result<Outcome, EvalError> {
        Self::new(MachineConfig::default()).eval(graph, args)
    }

    pub fn eval(&mut self, graph: &Graph, args: &[EvalValue]) -> Result<Outcome, EvalError> {
        self.locals.clear();
        self.trace.clear();
        self.fuel = self.config.fuel;

        let params = graph.params();
        if params.len() != args.len() {
            return Err(EvalError::ArgumentCount {
                expected: params.len(),
                found: args.len(),
            });
        }

        let outputs = self.eval_block(graph, graph.root(), args)?;
        Ok(Outcome {
            outputs: outputs.into_vec(),
            trace: std::mem::take(&mut self.trace),
        })
    }

    fn eval_block(
        &mut self,
        graph: &Graph,
        block: BlockId,
        args: &[EvalValue],
    ) -> Result<Values, EvalError> {
        for (&param, &arg) in graph.dfg.block_params(block).iter().zip(args) {
            self.locals[param] = Some(arg);
        }

        for node in graph.layout.iter_node(block) {
            if self.fuel == 0 {
                return Err(EvalError::FuelExhausted(self.config.fuel));
            }
            self.fuel -= 1;

            let values = match graph.dfg.node_kind(node) {
                NodeKind::Op(op) => {
                    let value = self.eval_op(graph, node, op)?;
                    SmallVec::from_elem(value, 1)
                }
                NodeKind::If => self.eval_if(graph, node)?,
                NodeKind::Loop => self.eval_loop(graph, node)?,
                NodeKind::Return => return self.load_all(graph, graph.dfg.node_args(node)),
            };

            let results = graph.dfg.node_results(node);
            if results.len() != values.len() {
                return Err(EvalError::MalformedNode {
                    node,
                    reason: "result count does not match evaluated values",
                });
            }
            for (&result, value) in results.iter().zip(values) {
                self.locals[result] = Some(value);
            }
        }

        Err(EvalError::MissingTerminator(block))
    }

    fn eval_op(&mut self, graph: &Graph, node: NodeId, op: Opcode) -> Result<EvalValue, EvalError> {
        let args = self.load_all(graph, graph.dfg.node_args(node))?;
        if args.len() != op.arity() {
            return Err(EvalError::MalformedNode {
                node,
                reason: "wrong number of operands",
            });
        }

        let int = |value: EvalValue| {
            value.as_i64().ok_or(EvalError::TypeMismatch {
                node,
                expected: Type::I64,
                found: value.ty(),
            })
        };
        let same_ty = |lhs: EvalValue, rhs: EvalValue| {
            if lhs.ty() == rhs.ty() {
                Ok(())
            } else {
                Err(EvalError::TypeMismatch {
                    node,
                    expected: lhs.ty(),
                    found: rhs.ty(),
                })
            }
        };

        let value: EvalValue = match op {
            Opcode::Add => int(args[0])?.wrapping_add(int(args[1])?).into(),
            Opcode::Sub => int(args[0])?.wrapping_sub(int(args[1])?).into(),
            Opcode::Mul => int(args[0])?.wrapping_mul(int(args[1])?).into(),
            Opcode::Lt => (int(args[0])? < int(args[1])?).into(),
            Opcode::Le => (int(args[0])? <= int(args[1])?).into(),
            Opcode::Gt => (int(args[0])? > int(args[1])?).into(),
            Opcode::Ge => (int(args[0])? >= int(args[1])?).into(),
            Opcode::Eq => {
                same_ty(args[0], args[1])?;
                (args[0] == args[1]).into()
            }
            Opcode::Ne => {
                same_ty(args[0], args[1])?;
                (args[0] != args[1]).into()
            }
            Opcode::And | Opcode::Or => {
                let is_and = op == Opcode::And;
                match (args[0], args[1]) {
                    (EvalValue::I1(l), EvalValue::I1(r)) => {
                        EvalValue::from(if is_and { l & r } else { l | r })
                    }
                    (EvalValue::I64(l), EvalValue::I64(r)) => {
                        EvalValue::from(if is_and { l & r } else { l | r })
                    }
                    (lhs, rhs) => {
                        return Err(EvalError::TypeMismatch {
                            node,
                            expected: lhs.ty(),
                            found: rhs.ty(),
                        })
                    }
                }
            }
            Opcode::Not => match args[0] {
                EvalValue::I1(v) => (!v).into(),
                EvalValue::I64(v) => (!v).into(),
            },
            Opcode::Trace => {
                self.trace.push(args[0]);
                args[0]
            }
        };

        Ok(value)
    }

    fn eval_if(&mut self, graph: &Graph, node: NodeId) -> Result<Values, EvalError> {
        let (&[cond], &[then_block, else_block]) =
            (graph.dfg.node_args(node), graph.dfg.node_blocks(node))
        else {
            return Err(EvalError::MalformedNode {
                node,
                reason: "if takes one operand and owns two blocks",
            });
        };

        let block = if self.load_bool(graph, node, cond)? {
            then_block
        } else {
            else_block
        };
        self.eval_block(graph, block, &[])
    }

    fn eval_loop(&mut self, graph: &Graph, node: NodeId) -> Result<Values, EvalError> {
        let shape =
            loop_shape(graph, node).map_err(|reason| EvalError::MalformedLoop { node, reason })?;

        let args = graph.dfg.node_args(node);
        let trip_count = self.load_int(graph, node, args[0])?;
        let (mut running, mut carried) = match shape {
            LoopShape::Canonical { .. } => {
                let running = self.load_bool(graph, node, args[1])?;
                (running, self.load_all(graph, &args[2..])?)
            }
            LoopShape::WithConditionBlock { cond, .. } => {
                let carried = self.load_all(graph, &args[1..])?;
                (self.eval_condition(graph, node, cond, &carried)?, carried)
            }
        };

        let body = shape.body();
        let mut iter = 0;
        while iter < trip_count && running {
            let mut body_args: Values = SmallVec::new();
            body_args.push(iter.into());
            body_args.extend_from_slice(&carried);
            let returned = self.eval_block(graph, body, &body_args)?;

            match shape {
                LoopShape::Canonical { .. } => {
                    running = returned[0].as_bool().ok_or(EvalError::TypeMismatch {
                        node,
                        expected: Type::I1,
                        found: returned[0].ty(),
                    })?;
                    carried = returned[1..].into();
                }
                LoopShape::WithConditionBlock { cond, .. } => {
                    carried = returned;
                    running = self.eval_condition(graph, node, cond, &carried)?;
                }
            }
            iter += 1;
        }

        Ok(carried)
    }

    fn eval_condition(
        &mut self,
        graph: &Graph,
        node: NodeId,
        block: BlockId,
        carried: &[EvalValue],
    ) -> Result<bool, EvalError> {
        let returned = self.eval_block(graph, block, carried)?;
        returned[0].as_bool().ok_or(EvalError::TypeMismatch {
            node,
            expected: Type::I1,
            found: returned[0].ty(),
        })
    }

    fn load(&self, graph: &Graph, value: ValueId) -> Result<EvalValue, EvalError> {
        if let Some(imm) = graph.dfg.value_imm(value) {
            return Ok(imm.into());
        }
        self.locals[value].ok_or(EvalError::UndefinedValue(value))
    }

    fn load_all(&self, graph: &Graph, values: &[ValueId]) -> Result<Values, EvalError> {
        values.iter().map(|value| self.load(graph, *value)).collect()
    }

    fn load_bool(&self, graph: &Graph, node: NodeId, value: ValueId) -> Result<bool, EvalError> {
        let value = self.load(graph, value)?;
        value.as_bool().ok_or(EvalError::TypeMismatch {
            node,
            expected: Type::I1,
            found: value.ty(),
        })
    }

    fn load_int(&self, graph: &Graph, node: NodeId, value: ValueId) -> Result<i64, EvalError> {
        let value = self.load(graph, value)?;
        value.as_i64().ok_or(EvalError::TypeMismatch {
            node,
            expected: Type::I64,
            found: value.ty(),
        })
    }
}
