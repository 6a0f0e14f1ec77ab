use smallvec::SmallVec;

use super::{BlockId, DataFlowGraph, Layout, NodeId, NodeKind, Type, Value, ValueId};

/// A structured IR graph: a root block whose nodes may own nested blocks.
///
/// The root block's parameters are the graph inputs and its return values
/// are the graph outputs.
#[derive(Debug)]
pub struct Graph {
    pub dfg: DataFlowGraph,
    pub layout: Layout,
    root: BlockId,
}

impl Graph {
    pub fn new(param_tys: &[Type]) -> Self {
        let mut dfg = DataFlowGraph::new();
        let mut layout = Layout::new();
        let root = dfg.make_block();
        layout.attach_block(root, None);
        for &ty in param_tys {
            dfg.append_block_param(root, ty);
        }

        Self { dfg, layout, root }
    }

    pub fn root(&self) -> BlockId {
        self.root
    }

    pub fn params(&self) -> &[ValueId] {
        self.dfg.block_params(self.root)
    }

    pub fn outputs(&self) -> &[ValueId] {
        self.block_returns(self.root)
    }

    /// Returns the `return` node terminating `block`, if any.
    pub fn terminator(&self, block: BlockId) -> Option<NodeId> {
        let last = self.layout.last_node_of(block)?;
        self.dfg.node(last).is_terminator().then_some(last)
    }

    /// Returns the values declared as `block`'s outputs.
    pub fn block_returns(&self, block: BlockId) -> &[ValueId] {
        match self.terminator(block) {
            Some(term) => self.dfg.node_args(term),
            None => &[],
        }
    }

    /// Returns the block enclosing `block`, i.e. the block of its
    /// owner, or `None` for the root block.
    pub fn parent_block(&self, block: BlockId) -> Option<BlockId> {
        let owner = self.layout.block_owner(block)?;
        self.layout.try_node_block(owner)
    }

    /// Returns `true` if `node` is inside `block`, directly or through any
    /// number of nested blocks.
    pub fn is_node_within(&self, node: NodeId, block: BlockId) -> bool {
        let Some(mut current) = self.layout.try_node_block(node) else {
            return false;
        };
        loop {
            if current == block {
                return true;
            }
            match self.parent_block(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Returns `true` if `value` is defined at the program point right
    /// before `at`, i.e. its definition dominates `at`.
    pub fn is_available_at(&self, value: ValueId, at: NodeId) -> bool {
        if !self.layout.is_node_inserted(at) {
            return false;
        }

        match *self.dfg.value(value) {
            Value::Immediate { .. } => true,
            Value::Param { block, .. } => {
                self.layout.is_block_attached(block) && self.is_node_within(at, block)
            }
            Value::Result { node: def, .. } => {
                if !self.layout.is_node_inserted(def) {
                    return false;
                }
                let def_block = self.layout.node_block(def);

                let mut current = at;
                loop {
                    let block = self.layout.node_block(current);
                    if block == def_block {
                        return self.layout.precedes(def, current);
                    }
                    match self.layout.block_owner(block) {
                        Some(owner) => current = owner,
                        None => return false,
                    }
                }
            }
        }
    }

    /// Collects every node inside `block` in pre-order, descending into
    /// nested blocks right after their owner.
    pub fn collect_nodes_recursive(&self, block: BlockId) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        self.collect_nodes_into(block, &mut nodes);
        nodes
    }

    fn collect_nodes_into(&self, block: BlockId, nodes: &mut Vec<NodeId>) {
        for node in self.layout.iter_node(block) {
            nodes.push(node);
            for &sub in self.dfg.node_blocks(node) {
                self.collect_nodes_into(sub, nodes);
            }
        }
    }

    /// Creates a new empty block with parameters of `param_tys`, owned by
    /// `owner`.
    pub fn make_owned_block(&mut self, owner: NodeId, param_tys: &[Type]) -> BlockId {
        let block = self.dfg.make_block();
        for &ty in param_tys {
            self.dfg.append_block_param(block, ty);
        }
        self.layout.attach_block(block, Some(owner));
        self.dfg.push_node_block(owner, block);
        block
    }

    /// Removes `node` from the layout and stops tracking its operands. Every
    /// block owned by `node` is discarded as well.
    ///
    /// Results of `node` must be unused.
    pub fn remove_node(&mut self, node: NodeId) {
        debug_assert!(
            self.dfg
                .node_results(node)
                .iter()
                .all(|res| self.dfg.users_num(*res) == 0),
            "{node} still has users"
        );

        let blocks: SmallVec<[BlockId; 2]> = self.dfg.node_blocks(node).into();
        for block in blocks {
            self.discard_block(block);
        }

        self.dfg.untrack_node(node);
        self.layout.remove_node(node);
    }

    /// Removes every node of `block`, detaches it from the layout and from
    /// its owner's block list.
    pub fn discard_block(&mut self, block: BlockId) {
        while let Some(last) = self.layout.last_node_of(block) {
            let blocks: SmallVec<[BlockId; 2]> = self.dfg.node_blocks(last).into();
            for sub in blocks {
                self.discard_block(sub);
            }
            self.dfg.untrack_node(last);
            self.layout.remove_node(last);
        }

        if let Some(owner) = self.layout.block_owner(block) {
            self.dfg.remove_node_block(owner, block);
        }
        self.layout.detach_block(block);
    }

    /// Recompute use lists from layout-inserted nodes only.
    pub fn rebuild_users(&mut self) {
        self.dfg.clear_users();
        for node in self.collect_nodes_recursive(self.root) {
            self.dfg.attach_user(node);
        }
    }

    pub fn is_loop(&self, node: NodeId) -> bool {
        self.dfg.node_kind(node) == NodeKind::Loop
    }
}
