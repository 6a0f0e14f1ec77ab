//! This module contains Trellis IR data flow graph.
use std::collections::BTreeSet;

use cranelift_entity::{entity_impl, PrimaryMap, SecondaryMap};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{Immediate, NodeData, NodeId, NodeKind, Type, Value, ValueId};

#[derive(Debug, Default)]
pub struct DataFlowGraph {
    #[doc(hidden)]
    pub blocks: PrimaryMap<BlockId, Block>,
    #[doc(hidden)]
    pub values: PrimaryMap<ValueId, Value>,
    nodes: PrimaryMap<NodeId, NodeData>,
    immediates: FxHashMap<Immediate, ValueId>,
    users: SecondaryMap<ValueId, BTreeSet<NodeId>>,
}

impl DataFlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make_block(&mut self) -> BlockId {
        self.blocks.push(Block::new())
    }

    pub fn make_value(&mut self, value: Value) -> ValueId {
        self.values.push(value)
    }

    pub fn make_imm_value<Imm>(&mut self, imm: Imm) -> ValueId
    where
        Imm: Into<Immediate>,
    {
        let imm: Immediate = imm.into();
        if let Some(&value) = self.immediates.get(&imm) {
            return value;
        }

        let ty = imm.ty();
        let value = self.make_value(Value::Immediate { imm, ty });
        self.immediates.insert(imm, value);
        value
    }

    /// Appends a new parameter of type `ty` to `block`.
    pub fn append_block_param(&mut self, block: BlockId, ty: Type) -> ValueId {
        let idx = self.blocks[block].params.len();
        let value = self.make_value(Value::Param { block, idx, ty });
        self.blocks[block].params.push(value);
        value
    }

    pub fn block_params(&self, block: BlockId) -> &[ValueId] {
        &self.blocks[block].params
    }

    pub fn make_node(&mut self, node: NodeData) -> NodeId {
        let node_id = self.nodes.push(node);
        self.attach_user(node_id);
        node_id
    }

    /// Creates one result value per type in `tys` and attaches them to `node`.
    pub fn make_results(&mut self, node: NodeId, tys: &[Type]) -> SmallVec<[ValueId; 2]> {
        debug_assert!(self.nodes[node].results.is_empty());
        let results: SmallVec<[ValueId; 2]> = tys
            .iter()
            .enumerate()
            .map(|(idx, &ty)| self.make_value(Value::Result { node, idx, ty }))
            .collect();
        self.nodes[node].results = results.clone();
        results
    }

    pub fn node(&self, node: NodeId) -> &NodeData {
        &self.nodes[node]
    }

    pub fn get_node(&self, node: NodeId) -> Option<&NodeData> {
        self.nodes.get(node)
    }

    pub fn node_kind(&self, node: NodeId) -> NodeKind {
        self.nodes[node].kind
    }

    pub fn node_args(&self, node: NodeId) -> &[ValueId] {
        &self.nodes[node].args
    }

    pub fn node_results(&self, node: NodeId) -> &[ValueId] {
        &self.nodes[node].results
    }

    pub fn node_blocks(&self, node: NodeId) -> &[BlockId] {
        &self.nodes[node].blocks
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        self.nodes.keys()
    }

    pub fn value(&self, value_id: ValueId) -> &Value {
        &self.values[value_id]
    }

    pub fn get_value(&self, value_id: ValueId) -> Option<&Value> {
        self.values.get(value_id)
    }

    pub fn value_ty(&self, value_id: ValueId) -> Type {
        self.values[value_id].ty()
    }

    pub fn value_imm(&self, value: ValueId) -> Option<Immediate> {
        match self.values[value] {
            Value::Immediate { imm, .. } => Some(imm),
            _ => None,
        }
    }

    pub fn is_imm(&self, value: ValueId) -> bool {
        self.value_imm(value).is_some()
    }

    /// Replaces the `idx`-th operand of `node` with `value`.
    pub fn set_arg(&mut self, node: NodeId, idx: usize, value: ValueId) {
        let old = std::mem::replace(&mut self.nodes[node].args[idx], value);
        if !self.nodes[node].args.contains(&old) {
            self.remove_user(old, node);
        }
        self.users[value].insert(node);
    }

    /// Inserts `value` as the `idx`-th operand of `node`, shifting later
    /// operands right.
    pub fn insert_arg(&mut self, node: NodeId, idx: usize, value: ValueId) {
        self.nodes[node].args.insert(idx, value);
        self.users[value].insert(node);
    }

    /// Appends `block` to the blocks owned by `node`.
    ///
    /// Layout ownership is managed separately by [`crate::Layout`].
    pub fn push_node_block(&mut self, node: NodeId, block: BlockId) {
        self.nodes[node].blocks.push(block);
    }

    /// Removes `block` from the blocks owned by `node`.
    pub fn remove_node_block(&mut self, node: NodeId, block: BlockId) {
        self.nodes[node].blocks.retain(|b| *b != block);
    }

    pub fn attach_user(&mut self, node: NodeId) {
        let node_data = &self.nodes[node];
        node_data.for_each_value(&mut |value| {
            self.users[value].insert(node);
        })
    }

    pub fn untrack_node(&mut self, node: NodeId) {
        let node_data = &self.nodes[node];
        node_data.for_each_value(&mut |value| {
            self.users[value].remove(&node);
        })
    }

    pub fn remove_user(&mut self, value: ValueId, user: NodeId) {
        self.users[value].remove(&user);
    }

    pub fn clear_users(&mut self) {
        self.users.clear();
    }

    /// Returns the all nodes that use the `value_id`.
    pub fn users(&self, value_id: ValueId) -> impl Iterator<Item = &NodeId> {
        self.users[value_id].iter()
    }

    /// Returns the number of nodes that use the `value_id`.
    pub fn users_num(&self, value_id: ValueId) -> usize {
        self.users[value_id].len()
    }

    /// Rewrites every use of `value` to `alias`.
    pub fn change_to_alias(&mut self, value: ValueId, alias: ValueId) {
        if value == alias {
            return;
        }

        let mut users = std::mem::take(&mut self.users[value]);
        for node in &users {
            self.nodes[*node].for_each_value_mut(&mut |user_value| {
                if *user_value == value {
                    *user_value = alias;
                }
            });
        }
        self.users[alias].append(&mut users);
    }
}

/// An opaque reference to [`Block`]
#[derive(Clone, PartialEq, Eq, Copy, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);
entity_impl!(BlockId, "block");

/// A block data definition.
/// A Block data doesn't hold its nodes or its owner. They are managed by
/// [`super::layout::Layout`].
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub(crate) params: SmallVec<[ValueId; 4]>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn params(&self) -> &[ValueId] {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_render_with_prefix() {
        let mut dfg = DataFlowGraph::new();
        let block = dfg.make_block();
        let param = dfg.append_block_param(block, Type::I64);
        let node = dfg.make_node(NodeData::new(NodeKind::Return, &[param]));

        assert_eq!(format!("{block} {param} {node}"), "block0 v0 node0");
        assert_eq!(format!("{block:?} {param:?} {node:?}"), "block0 v0 node0");
    }
}
