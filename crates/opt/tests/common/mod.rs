use trellis_interpreter::{EvalValue, Machine};
use trellis_ir::{builder::test_util::dump_graph, Graph, NodeId};
use trellis_opt::{inline_loop_condition, InlineStats};
use trellis_verifier::{verify_graph, VerificationLevel, VerifierConfig};

pub fn i64s(values: &[i64]) -> Vec<EvalValue> {
    values.iter().map(|v| EvalValue::I64(*v)).collect()
}

/// Runs the pass on `graph` and checks that the result is well formed,
/// canonical, and evaluates like the original on every input.
pub fn inline_and_check(graph: &mut Graph, inputs: &[Vec<EvalValue>]) -> InlineStats {
    let before: Vec<_> = inputs.iter().map(|args| Machine::run(graph, args)).collect();

    let stats = inline_loop_condition(graph).unwrap();

    let cfg = VerifierConfig::for_level(VerificationLevel::Full).with_canonical_loops();
    let report = verify_graph(graph, &cfg);
    assert!(report.is_ok(), "{report}\n{}", dump_graph(graph));

    for (args, expected) in inputs.iter().zip(before) {
        let actual = Machine::run(graph, args);
        assert_eq!(actual, expected, "diverged on {args:?}\n{}", dump_graph(graph));
    }

    stats
}

pub fn nodes_where(graph: &Graph, pred: impl Fn(NodeId) -> bool) -> Vec<NodeId> {
    graph
        .collect_nodes_recursive(graph.root())
        .into_iter()
        .filter(|node| pred(*node))
        .collect()
}
