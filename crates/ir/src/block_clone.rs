//! Deep copies of blocks.
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{BlockId, Graph, NodeData, NodeId, Type, ValueId};

/// Clones `block`, including every node and every nested block, and appends
/// the copy to the blocks owned by `owner`.
///
/// Values defined inside `block` are remapped to their copies; values
/// defined outside of it are referenced unchanged.
pub fn clone_block(graph: &mut Graph, block: BlockId, owner: NodeId) -> BlockId {
    let mut value_map = FxHashMap::default();
    clone_block_with_map(graph, block, owner, &mut value_map)
}

/// Same as [`clone_block`], seeding the value remapping with `value_map`.
/// On return, `value_map` maps every value defined inside `block` to its
/// copy.
pub fn clone_block_with_map(
    graph: &mut Graph,
    block: BlockId,
    owner: NodeId,
    value_map: &mut FxHashMap<ValueId, ValueId>,
) -> BlockId {
    let param_tys: SmallVec<[Type; 4]> = graph
        .dfg
        .block_params(block)
        .iter()
        .map(|param| graph.dfg.value_ty(*param))
        .collect();
    let new_block = graph.make_owned_block(owner, &param_tys);
    for (old, new) in graph
        .dfg
        .block_params(block)
        .iter()
        .zip(graph.dfg.block_params(new_block))
    {
        value_map.insert(*old, *new);
    }

    let nodes: Vec<_> = graph.layout.iter_node(block).collect();
    for node in nodes {
        let new_node = clone_node(graph, node, value_map);
        graph.layout.append_node(new_node, new_block);

        let sub_blocks: SmallVec<[BlockId; 2]> = graph.dfg.node_blocks(node).into();
        for sub in sub_blocks {
            clone_block_with_map(graph, sub, new_node, value_map);
        }
    }

    new_block
}

fn clone_node(
    graph: &mut Graph,
    node: NodeId,
    value_map: &mut FxHashMap<ValueId, ValueId>,
) -> NodeId {
    let data = graph.dfg.node(node);
    let args: SmallVec<[ValueId; 4]> = data
        .args()
        .iter()
        .map(|arg| value_map.get(arg).copied().unwrap_or(*arg))
        .collect();
    let result_tys: SmallVec<[Type; 2]> = data
        .results()
        .iter()
        .map(|res| graph.dfg.value_ty(*res))
        .collect();
    let kind = data.kind;

    let new_node = graph.dfg.make_node(NodeData::new(kind, &args));
    let new_results = graph.dfg.make_results(new_node, &result_tys);
    for (old, new) in graph.dfg.node_results(node).iter().zip(new_results) {
        value_map.insert(*old, new);
    }

    new_node
}
