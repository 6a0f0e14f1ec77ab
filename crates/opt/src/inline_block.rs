//! Block splicing.
//!
//! Splicing moves the nodes of a block in front of an anchor node, binds the
//! block's parameters to caller-supplied values and hands the block's return
//! values back to the caller. The block itself is left empty and detached.
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::trace;
use trellis_ir::{BlockId, Graph, NodeId, ValueId};

/// Splices `block` right before `anchor`, substituting its parameters with
/// `args`, and returns the block's outputs after substitution.
///
/// # Panics
/// Panics if `args` doesn't match the block's parameters, if `anchor` is not
/// inserted or lives inside `block`, or if an argument or a value used inside
/// `block` is not available at `anchor`.
pub fn inline_block_before_node(
    graph: &mut Graph,
    anchor: NodeId,
    block: BlockId,
    args: &[ValueId],
) -> SmallVec<[ValueId; 4]> {
    splice(graph, anchor, block, args, true)
}

/// Splices the `block_index`-th block of `node` before `node`, redirects
/// every use of `node`'s results to the spliced outputs and removes `node`
/// together with its remaining blocks.
pub fn inline_block_replacing_node(
    graph: &mut Graph,
    node: NodeId,
    block_index: usize,
    args: &[ValueId],
) {
    let blocks = graph.dfg.node_blocks(node);
    assert!(
        block_index < blocks.len(),
        "{node} owns {} blocks, no block at index {block_index}",
        blocks.len()
    );
    let block = blocks[block_index];

    let outputs = inline_block_before_node(graph, node, block, args);
    let results: SmallVec<[ValueId; 2]> = graph.dfg.node_results(node).into();
    assert_eq!(
        results.len(),
        outputs.len(),
        "{node} has {} results but {block} returns {} values",
        results.len(),
        outputs.len()
    );

    for (result, output) in results.into_iter().zip(outputs) {
        graph.dfg.change_to_alias(result, output);
    }
    graph.remove_node(node);
}

pub(crate) fn splice(
    graph: &mut Graph,
    anchor: NodeId,
    block: BlockId,
    args: &[ValueId],
    check_availability: bool,
) -> SmallVec<[ValueId; 4]> {
    let params: SmallVec<[ValueId; 4]> = graph.dfg.block_params(block).into();
    assert_eq!(
        params.len(),
        args.len(),
        "{block} takes {} parameters but {} arguments were supplied",
        params.len(),
        args.len()
    );
    assert!(
        graph.layout.is_node_inserted(anchor),
        "anchor {anchor} is not inserted"
    );
    assert!(
        !graph.is_node_within(anchor, block),
        "anchor {anchor} lives inside {block}"
    );
    let Some(term) = graph.terminator(block) else {
        panic!("{block} has no terminator");
    };

    if check_availability {
        for &arg in args {
            assert!(
                graph.is_available_at(arg, anchor),
                "argument {arg} is not available at {anchor}"
            );
        }
        for value in free_values(graph, block) {
            assert!(
                graph.is_available_at(value, anchor),
                "{value} used in {block} is not available at {anchor}"
            );
        }
    }

    let nodes: SmallVec<[NodeId; 8]> = graph
        .layout
        .iter_node(block)
        .filter(|node| *node != term)
        .collect();
    for &node in &nodes {
        graph.layout.remove_node(node);
        graph.layout.insert_node_before(node, anchor);
    }

    for (&param, &arg) in params.iter().zip(args) {
        graph.dfg.change_to_alias(param, arg);
    }

    let outputs: SmallVec<[ValueId; 4]> = graph.dfg.node_args(term).into();
    graph.dfg.untrack_node(term);
    graph.layout.remove_node(term);
    graph.discard_block(block);

    trace!(%block, %anchor, moved = nodes.len(), "spliced block");
    outputs
}

/// Values used inside `block` (nested blocks included) but defined outside
/// of it. Immediates are skipped.
fn free_values(graph: &Graph, block: BlockId) -> Vec<ValueId> {
    let nodes = graph.collect_nodes_recursive(block);

    let mut defined: FxHashSet<ValueId> =
        graph.dfg.block_params(block).iter().copied().collect();
    for &node in &nodes {
        defined.extend(graph.dfg.node_results(node));
        for &sub in graph.dfg.node_blocks(node) {
            defined.extend(graph.dfg.block_params(sub));
        }
    }

    let mut seen = FxHashSet::default();
    let mut free = Vec::new();
    for &node in &nodes {
        for &arg in graph.dfg.node_args(node) {
            if !graph.dfg.is_imm(arg) && !defined.contains(&arg) && seen.insert(arg) {
                free.push(arg);
            }
        }
    }
    free
}
