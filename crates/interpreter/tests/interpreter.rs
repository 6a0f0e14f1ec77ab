use trellis_interpreter::{EvalError, EvalValue, Machine, MachineConfig};
use trellis_ir::{builder::GraphBuilder, Graph, Opcode, Type};

/// Adds `step` to `x` while `x < limit`, tracing every visited value.
fn count_up(step: i64, limit: i64, max_trip: i64) -> Graph {
    let mut builder = GraphBuilder::new(&[Type::I64]);
    let x = builder.params()[0];
    let trip = builder.make_imm_value(max_trip);
    let lp = builder.make_loop(trip, None, &[x]);

    builder.switch_to_block(lp.body);
    let step = builder.make_imm_value(step);
    let traced = builder.insert_op(Opcode::Trace, &[lp.body_params[1]]);
    let next = builder.insert_op(Opcode::Add, &[traced, step]);
    builder.ret(&[next]);

    let cond = builder.add_condition_block(lp.node);
    builder.switch_to_block(cond);
    let limit = builder.make_imm_value(limit);
    let param = builder.dfg().block_params(cond)[0];
    let lt = builder.insert_op(Opcode::Lt, &[param, limit]);
    builder.ret(&[lt]);

    let root = builder.root();
    builder.switch_to_block(root);
    builder.ret(&lp.results);
    builder.finish()
}

#[test]
fn loop_with_condition_block() {
    let graph = count_up(3, 10, 100);
    let outcome = Machine::run(&graph, &[EvalValue::I64(1)]).unwrap();

    assert_eq!(outcome.outputs, vec![EvalValue::I64(10)]);
    assert_eq!(
        outcome.trace,
        vec![EvalValue::I64(1), EvalValue::I64(4), EvalValue::I64(7)]
    );
}

#[test]
fn condition_false_on_entry_skips_body() {
    let graph = count_up(1, 10, 100);
    let outcome = Machine::run(&graph, &[EvalValue::I64(42)]).unwrap();

    assert_eq!(outcome.outputs, vec![EvalValue::I64(42)]);
    assert!(outcome.trace.is_empty());
}

#[test]
fn trip_count_bounds_iterations() {
    let graph = count_up(1, 1000, 3);
    let outcome = Machine::run(&graph, &[EvalValue::I64(0)]).unwrap();
    assert_eq!(outcome.outputs, vec![EvalValue::I64(3)]);
}

#[test]
fn canonical_loop_uses_iteration_index() {
    // sum = 0; for i in 0..5 { sum += i }, exits early once sum > 5.
    let mut builder = GraphBuilder::new(&[]);
    let trip = builder.make_imm_value(5i64);
    let yes = builder.make_imm_value(true);
    let zero = builder.make_imm_value(0i64);
    let lp = builder.make_loop(trip, Some(yes), &[zero]);

    builder.switch_to_block(lp.body);
    let sum = builder.insert_op(Opcode::Add, &[lp.body_params[1], lp.body_params[0]]);
    let five = builder.make_imm_value(5i64);
    let small = builder.insert_op(Opcode::Le, &[sum, five]);
    builder.ret(&[small, sum]);

    let root = builder.root();
    builder.switch_to_block(root);
    builder.ret(&lp.results);
    let graph = builder.finish();

    // 0, 1, 3, 6 -> stops after the fourth iteration.
    let outcome = Machine::run(&graph, &[]).unwrap();
    assert_eq!(outcome.outputs, vec![EvalValue::I64(6)]);
}

#[test]
fn if_selects_branch() {
    let mut builder = GraphBuilder::new(&[Type::I1, Type::I64]);
    let c = builder.params()[0];
    let x = builder.params()[1];
    let branch = builder.make_if(c, &[Type::I64]);

    builder.switch_to_block(branch.then_block);
    let two = builder.make_imm_value(2i64);
    let doubled = builder.insert_op(Opcode::Mul, &[x, two]);
    builder.ret(&[doubled]);
    builder.switch_to_block(branch.else_block);
    let negated = builder.insert_op(Opcode::Not, &[x]);
    builder.ret(&[negated]);

    let root = builder.root();
    builder.switch_to_block(root);
    builder.ret(&branch.results);
    let graph = builder.finish();

    let taken = Machine::run(&graph, &[true.into(), EvalValue::I64(21)]).unwrap();
    assert_eq!(taken.outputs, vec![EvalValue::I64(42)]);
    let not_taken = Machine::run(&graph, &[false.into(), EvalValue::I64(0)]).unwrap();
    assert_eq!(not_taken.outputs, vec![EvalValue::I64(-1)]);
}

#[test]
fn fuel_is_limited() {
    let graph = count_up(0, 10, i64::MAX);
    let mut machine = Machine::new(MachineConfig { fuel: 1_000 });
    let err = machine.eval(&graph, &[EvalValue::I64(0)]).unwrap_err();
    assert_eq!(err, EvalError::FuelExhausted(1_000));
}

#[test]
fn argument_count_is_checked() {
    let graph = count_up(1, 10, 100);
    let err = Machine::run(&graph, &[]).unwrap_err();
    assert_eq!(
        err,
        EvalError::ArgumentCount {
            expected: 1,
            found: 0
        }
    );
}

#[test]
fn operand_types_are_checked() {
    let mut builder = GraphBuilder::new(&[Type::I1]);
    let flag = builder.params()[0];
    let one = builder.make_imm_value(1i64);
    let bad = builder.insert_op(Opcode::Add, &[flag, one]);
    builder.ret(&[bad]);
    let graph = builder.finish();

    let err = Machine::run(&graph, &[true.into()]).unwrap_err();
    assert!(matches!(
        err,
        EvalError::TypeMismatch {
            expected: Type::I64,
            found: Type::I1,
            ..
        }
    ));
}
