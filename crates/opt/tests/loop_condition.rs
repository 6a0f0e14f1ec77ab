mod common;

use common::{i64s, inline_and_check, nodes_where};
use trellis_interpreter::{EvalValue, Machine};
use trellis_ir::{
    builder::{test_util::dump_graph, GraphBuilder},
    Graph, LoopShapeError, NodeKind, Opcode, Type,
};
use trellis_opt::{inline_block_replacing_node, inline_loop_condition, TransformError};
use trellis_verifier::{verify_graph, VerificationLevel, VerifierConfig};

/// `i` counts up by one while `i < 10`.
fn while_lt_ten() -> Graph {
    let mut builder = GraphBuilder::new(&[Type::I64]);
    let i = builder.params()[0];
    let trip = builder.make_imm_value(1000i64);
    let lp = builder.make_loop(trip, None, &[i]);

    builder.switch_to_block(lp.body);
    let one = builder.make_imm_value(1i64);
    let next = builder.insert_op(Opcode::Add, &[lp.body_params[1], one]);
    builder.ret(&[next]);

    let cond = builder.add_condition_block(lp.node);
    builder.switch_to_block(cond);
    let ten = builder.make_imm_value(10i64);
    let param = builder.dfg().block_params(cond)[0];
    let lt = builder.insert_op(Opcode::Lt, &[param, ten]);
    builder.ret(&[lt]);

    let root = builder.root();
    builder.switch_to_block(root);
    builder.ret(&lp.results);
    builder.finish()
}

#[test]
fn condition_is_evaluated_before_loop_and_at_end_of_body() {
    let mut graph = while_lt_ten();
    let stats = inline_and_check(&mut graph, &[i64s(&[0]), i64s(&[9]), i64s(&[10]), i64s(&[-5])]);
    assert_eq!(stats.loops_rewritten, 1);

    let lp = nodes_where(&graph, |node| graph.is_loop(node))[0];
    let compares = nodes_where(&graph, |node| {
        graph.dfg.node_kind(node) == NodeKind::Op(Opcode::Lt)
    });
    assert_eq!(compares.len(), 2);

    // Pre-loop copy reads the initial value and feeds operand 1.
    let pre = compares[0];
    assert_eq!(graph.layout.next_node_of(pre), Some(lp));
    assert_eq!(graph.dfg.node_args(pre)[0], graph.params()[0]);
    assert_eq!(graph.dfg.node_args(lp)[1], graph.dfg.node_results(pre)[0]);

    // Body copy reads the updated value and feeds return slot 0.
    let body = graph.dfg.node_blocks(lp)[0];
    let Some(term) = graph.terminator(body) else {
        panic!("body is terminated");
    };
    let post = compares[1];
    assert_eq!(graph.layout.next_node_of(post), Some(term));
    let updated = graph.block_returns(body)[1];
    assert_eq!(graph.dfg.node_args(post)[0], updated);
    assert_eq!(graph.block_returns(body)[0], graph.dfg.node_results(post)[0]);
}

#[test]
fn canonical_literal_loop_is_unchanged() {
    let mut builder = GraphBuilder::new(&[Type::I64]);
    let x = builder.params()[0];
    let trip = builder.make_imm_value(4i64);
    let yes = builder.make_imm_value(true);
    let lp = builder.make_loop(trip, Some(yes), &[x]);

    builder.switch_to_block(lp.body);
    let traced = builder.insert_op(Opcode::Trace, &[lp.body_params[1]]);
    let next = builder.insert_op(Opcode::Sub, &[traced, lp.body_params[0]]);
    builder.ret(&[yes, next]);

    let root = builder.root();
    builder.switch_to_block(root);
    builder.ret(&lp.results);
    let mut graph = builder.finish();

    let before = dump_graph(&graph);
    let stats = inline_and_check(&mut graph, &[i64s(&[100])]);
    assert_eq!(stats.loops_visited, 1);
    assert_eq!(stats.loops_rewritten, 0);
    assert_eq!(dump_graph(&graph), before);
}

/// Outer loop grows `a` while `a < n`; the inner loop counts `b` up to `a`,
/// so its condition reads the outer body's carried value.
fn nested_loops() -> Graph {
    let mut builder = GraphBuilder::new(&[Type::I64]);
    let n = builder.params()[0];
    let trip = builder.make_imm_value(10i64);
    let zero = builder.make_imm_value(0i64);
    let outer = builder.make_loop(trip, None, &[zero]);

    builder.switch_to_block(outer.body);
    let a = outer.body_params[1];
    let inner_trip = builder.make_imm_value(100i64);
    let inner = builder.make_loop(inner_trip, None, &[zero]);

    builder.switch_to_block(inner.body);
    let one = builder.make_imm_value(1i64);
    let b = builder.insert_op(Opcode::Add, &[inner.body_params[1], one]);
    builder.ret(&[b]);

    let inner_cond = builder.add_condition_block(inner.node);
    builder.switch_to_block(inner_cond);
    let param = builder.dfg().block_params(inner_cond)[0];
    let lt = builder.insert_op(Opcode::Lt, &[param, a]);
    builder.ret(&[lt]);

    builder.switch_to_block(outer.body);
    let sum = builder.insert_op(Opcode::Add, &[a, inner.results[0]]);
    let next = builder.insert_op(Opcode::Add, &[sum, one]);
    builder.ret(&[next]);

    let outer_cond = builder.add_condition_block(outer.node);
    builder.switch_to_block(outer_cond);
    let param = builder.dfg().block_params(outer_cond)[0];
    let lt = builder.insert_op(Opcode::Lt, &[param, n]);
    builder.ret(&[lt]);

    let root = builder.root();
    builder.switch_to_block(root);
    builder.ret(&outer.results);
    builder.finish()
}

#[test]
fn nested_condition_reads_outer_body_parameter() {
    let mut graph = nested_loops();
    assert_eq!(
        Machine::run(&graph, &i64s(&[20])).unwrap().outputs,
        i64s(&[31])
    );

    let stats = inline_and_check(&mut graph, &[i64s(&[0]), i64s(&[5]), i64s(&[20])]);
    assert_eq!(stats.loops_visited, 2);
    assert_eq!(stats.loops_rewritten, 2);
    assert_eq!(stats.nodes_inlined, 4);

    let loops = nodes_where(&graph, |node| graph.is_loop(node));
    let (outer, inner) = (loops[0], loops[1]);
    let outer_body = graph.dfg.node_blocks(outer)[0];
    let a = graph.dfg.block_params(outer_body)[1];

    // The hoisted inner condition sits in the outer body right before the
    // inner loop and compares against the outer body's parameter.
    let Some(pre) = graph.layout.prev_node_of(inner) else {
        panic!("inner condition was not hoisted");
    };
    assert_eq!(graph.layout.node_block(pre), outer_body);
    assert_eq!(graph.dfg.node_kind(pre), NodeKind::Op(Opcode::Lt));
    assert_eq!(graph.dfg.node_args(pre)[1], a);
    assert!(graph.dfg.is_imm(graph.dfg.node_args(pre)[0]));
}

#[test]
fn spliced_output_with_two_users() {
    let mut builder = GraphBuilder::new(&[Type::I64]);
    let x = builder.params()[0];
    let yes = builder.make_imm_value(true);
    let branch = builder.make_if(yes, &[Type::I64]);

    builder.switch_to_block(branch.then_block);
    let three = builder.make_imm_value(3i64);
    let tripled = builder.insert_op(Opcode::Mul, &[x, three]);
    builder.ret(&[tripled]);
    builder.switch_to_block(branch.else_block);
    builder.ret(&[x]);

    let root = builder.root();
    builder.switch_to_block(root);
    let out = branch.results[0];
    let traced = builder.insert_op(Opcode::Trace, &[out]);
    let total = builder.insert_op(Opcode::Add, &[out, traced]);
    builder.ret(&[total]);
    let mut graph = builder.finish();

    let args = i64s(&[7]);
    let before = Machine::run(&graph, &args).unwrap();
    inline_block_replacing_node(&mut graph, branch.node, 0, &[]);

    let report = verify_graph(&graph, &VerifierConfig::for_level(VerificationLevel::Full));
    assert!(report.is_ok(), "{report}");
    assert_eq!(Machine::run(&graph, &args).unwrap(), before);
    assert_eq!(before.outputs, i64s(&[42]));

    assert_eq!(graph.dfg.users_num(out), 0);
    assert_eq!(graph.dfg.node_args(traced_node(&graph)), &[tripled]);
    assert_eq!(graph.dfg.users_num(tripled), 2);
    assert!(!graph.layout.is_block_attached(branch.then_block));
    assert!(!graph.layout.is_block_attached(branch.else_block));
    assert!(nodes_where(&graph, |node| graph.dfg.node_kind(node) == NodeKind::If).is_empty());
}

fn traced_node(graph: &Graph) -> trellis_ir::NodeId {
    nodes_where(graph, |node| {
        graph.dfg.node_kind(node) == NodeKind::Op(Opcode::Trace)
    })[0]
}

#[test]
fn running_twice_changes_nothing() {
    let mut graph = nested_loops();
    inline_loop_condition(&mut graph).unwrap();
    let once = dump_graph(&graph);

    let stats = inline_loop_condition(&mut graph).unwrap();
    assert_eq!(stats.loops_visited, 2);
    assert_eq!(stats.loops_rewritten, 0);
    assert_eq!(dump_graph(&graph), once);
}

#[test]
fn side_effects_are_duplicated_per_site() {
    let mut builder = GraphBuilder::new(&[Type::I64]);
    let x = builder.params()[0];
    let trip = builder.make_imm_value(50i64);
    let lp = builder.make_loop(trip, None, &[x]);

    builder.switch_to_block(lp.body);
    let two = builder.make_imm_value(2i64);
    let next = builder.insert_op(Opcode::Mul, &[lp.body_params[1], two]);
    builder.ret(&[next]);

    let cond = builder.add_condition_block(lp.node);
    builder.switch_to_block(cond);
    let param = builder.dfg().block_params(cond)[0];
    let seen = builder.insert_op(Opcode::Trace, &[param]);
    let hundred = builder.make_imm_value(100i64);
    let lt = builder.insert_op(Opcode::Lt, &[seen, hundred]);
    builder.ret(&[lt]);

    let root = builder.root();
    builder.switch_to_block(root);
    builder.ret(&lp.results);
    let mut graph = builder.finish();

    let before = Machine::run(&graph, &i64s(&[3])).unwrap();
    assert_eq!(before.trace, i64s(&[3, 6, 12, 24, 48, 96, 192]));

    inline_and_check(&mut graph, &[i64s(&[3]), i64s(&[500]), i64s(&[0])]);
    let traces = nodes_where(&graph, |node| {
        graph.dfg.node_kind(node) == NodeKind::Op(Opcode::Trace)
    });
    assert_eq!(traces.len(), 2);
    assert_ne!(
        graph.layout.node_block(traces[0]),
        graph.layout.node_block(traces[1])
    );
}

#[test]
fn loops_inside_if_branches_are_rewritten() {
    let mut builder = GraphBuilder::new(&[Type::I1, Type::I64]);
    let c = builder.params()[0];
    let x = builder.params()[1];
    let branch = builder.make_if(c, &[Type::I64]);

    builder.switch_to_block(branch.then_block);
    let trip = builder.make_imm_value(64i64);
    let lp = builder.make_loop(trip, None, &[x]);
    builder.switch_to_block(lp.body);
    let three = builder.make_imm_value(3i64);
    let next = builder.insert_op(Opcode::Sub, &[lp.body_params[1], three]);
    builder.ret(&[next]);
    let cond = builder.add_condition_block(lp.node);
    builder.switch_to_block(cond);
    let param = builder.dfg().block_params(cond)[0];
    let zero = builder.make_imm_value(0i64);
    let gt = builder.insert_op(Opcode::Gt, &[param, zero]);
    builder.ret(&[gt]);
    builder.switch_to_block(branch.then_block);
    builder.ret(&lp.results);

    builder.switch_to_block(branch.else_block);
    builder.ret(&[x]);

    let root = builder.root();
    builder.switch_to_block(root);
    builder.ret(&branch.results);
    let mut graph = builder.finish();

    let inputs = [
        vec![EvalValue::I1(true), EvalValue::I64(10)],
        vec![EvalValue::I1(true), EvalValue::I64(-1)],
        vec![EvalValue::I1(false), EvalValue::I64(10)],
    ];
    let stats = inline_and_check(&mut graph, &inputs);
    assert_eq!(stats.loops_rewritten, 1);
    assert_eq!(
        Machine::run(&graph, &inputs[0]).unwrap().outputs,
        i64s(&[-2])
    );
}

#[test]
fn loop_in_condition_block_is_cloned_deeply() {
    // cond(a): sum of 0..a computed by an inner loop, compared with 20.
    let mut builder = GraphBuilder::new(&[Type::I64]);
    let x = builder.params()[0];
    let trip = builder.make_imm_value(32i64);
    let lp = builder.make_loop(trip, None, &[x]);

    builder.switch_to_block(lp.body);
    let one = builder.make_imm_value(1i64);
    let next = builder.insert_op(Opcode::Add, &[lp.body_params[1], one]);
    builder.ret(&[next]);

    let cond = builder.add_condition_block(lp.node);
    builder.switch_to_block(cond);
    let a = builder.dfg().block_params(cond)[0];
    let zero = builder.make_imm_value(0i64);
    let sum_loop = builder.make_loop(a, None, &[zero]);
    builder.switch_to_block(sum_loop.body);
    let acc = builder.insert_op(Opcode::Add, &[sum_loop.body_params[1], sum_loop.body_params[0]]);
    builder.ret(&[acc]);
    let sum_cond = builder.add_condition_block(sum_loop.node);
    builder.switch_to_block(sum_cond);
    let yes = builder.make_imm_value(true);
    builder.ret(&[yes]);
    builder.switch_to_block(cond);
    let twenty = builder.make_imm_value(20i64);
    let lt = builder.insert_op(Opcode::Lt, &[sum_loop.results[0], twenty]);
    builder.ret(&[lt]);

    let root = builder.root();
    builder.switch_to_block(root);
    builder.ret(&lp.results);
    let mut graph = builder.finish();

    let stats = inline_and_check(&mut graph, &[i64s(&[0]), i64s(&[3]), i64s(&[7])]);
    assert_eq!(stats.loops_rewritten, 2);

    let loops = nodes_where(&graph, |node| graph.is_loop(node));
    assert_eq!(loops.len(), 3);
    let sum_loops: Vec<_> = loops.into_iter().filter(|node| *node != lp.node).collect();
    assert_ne!(
        graph.layout.node_block(sum_loops[0]),
        graph.layout.node_block(sum_loops[1])
    );
    // 0+1+..+6 = 21 is the first sum reaching 20.
    assert_eq!(
        Machine::run(&graph, &i64s(&[0])).unwrap().outputs,
        i64s(&[7])
    );
}

#[test]
fn condition_returning_two_values_is_rejected() {
    let mut builder = GraphBuilder::new(&[Type::I64]);
    let x = builder.params()[0];
    let trip = builder.make_imm_value(3i64);
    let lp = builder.make_loop(trip, None, &[x]);

    builder.switch_to_block(lp.body);
    builder.ret(&[lp.body_params[1]]);

    let cond = builder.add_condition_block(lp.node);
    builder.switch_to_block(cond);
    let param = builder.dfg().block_params(cond)[0];
    let ten = builder.make_imm_value(10i64);
    let lt = builder.insert_op(Opcode::Lt, &[param, ten]);
    builder.ret(&[lt, lt]);

    let root = builder.root();
    builder.switch_to_block(root);
    builder.ret(&lp.results);
    let mut graph = builder.finish();

    let before = dump_graph(&graph);
    let err = inline_loop_condition(&mut graph).unwrap_err();
    assert_eq!(
        err,
        TransformError::UnsupportedLoopShape {
            node: lp.node,
            reason: LoopShapeError::ConditionReturnCount(2),
        }
    );
    assert_eq!(err.to_string(), format!("{}: unsupported loop shape", lp.node));
    assert_eq!(dump_graph(&graph), before);
}
