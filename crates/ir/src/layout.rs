//! This module contains graph layout information: node order within blocks
//! and block ownership.
use cranelift_entity::SecondaryMap;

use super::{BlockId, NodeId};

#[derive(Debug, Clone, Default)]
pub struct Layout {
    blocks: SecondaryMap<BlockId, BlockNode>,
    nodes: SecondaryMap<NodeId, NodeNode>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_block_attached(&self, block: BlockId) -> bool {
        self.blocks[block].attached
    }

    /// Returns the node owning `block`. The root block has no owner.
    pub fn block_owner(&self, block: BlockId) -> Option<NodeId> {
        debug_assert!(self.is_block_attached(block));
        self.blocks[block].owner
    }

    pub fn is_block_empty(&self, block: BlockId) -> bool {
        self.first_node_of(block).is_none()
    }

    pub fn first_node_of(&self, block: BlockId) -> Option<NodeId> {
        debug_assert!(self.is_block_attached(block));
        self.blocks[block].first_node
    }

    pub fn last_node_of(&self, block: BlockId) -> Option<NodeId> {
        debug_assert!(self.is_block_attached(block));
        self.blocks[block].last_node
    }

    pub fn prev_node_of(&self, node: NodeId) -> Option<NodeId> {
        debug_assert!(self.is_node_inserted(node));
        self.nodes[node].prev
    }

    pub fn next_node_of(&self, node: NodeId) -> Option<NodeId> {
        debug_assert!(self.is_node_inserted(node));
        self.nodes[node].next
    }

    pub fn node_block(&self, node: NodeId) -> BlockId {
        debug_assert!(self.is_node_inserted(node));
        self.nodes[node].block.unwrap()
    }

    pub fn try_node_block(&self, node: NodeId) -> Option<BlockId> {
        self.nodes[node].block
    }

    pub fn is_node_inserted(&self, node: NodeId) -> bool {
        self.nodes[node] != NodeNode::default()
    }

    pub fn iter_node(&self, block: BlockId) -> impl Iterator<Item = NodeId> + '_ {
        debug_assert!(self.is_block_attached(block));
        NodeIter {
            next: self.blocks[block].first_node,
            nodes: &self.nodes,
        }
    }

    /// Returns `true` if `node` comes strictly before `other` in the same
    /// block.
    pub fn precedes(&self, node: NodeId, other: NodeId) -> bool {
        debug_assert_eq!(self.node_block(node), self.node_block(other));
        let mut next = self.next_node_of(node);
        while let Some(current) = next {
            if current == other {
                return true;
            }
            next = self.next_node_of(current);
        }
        false
    }

    /// Attaches an empty `block` to the layout, owned by `owner`.
    pub fn attach_block(&mut self, block: BlockId, owner: Option<NodeId>) {
        debug_assert!(!self.is_block_attached(block));

        self.blocks[block] = BlockNode {
            owner,
            attached: true,
            ..BlockNode::default()
        };
    }

    /// Detaches an empty `block` from the layout.
    pub fn detach_block(&mut self, block: BlockId) {
        debug_assert!(self.is_block_attached(block));
        debug_assert!(self.is_block_empty(block));

        self.blocks[block] = BlockNode::default();
    }

    pub fn append_node(&mut self, node: NodeId, block: BlockId) {
        debug_assert!(self.is_block_attached(block));
        debug_assert!(!self.is_node_inserted(node));

        let block_node = &mut self.blocks[block];
        let mut node_node = NodeNode::with_block(block);

        if let Some(last_node) = block_node.last_node {
            node_node.prev = Some(last_node);
            self.nodes[last_node].next = Some(node);
        } else {
            block_node.first_node = Some(node);
        }

        block_node.last_node = Some(node);
        self.nodes[node] = node_node;
    }

    pub fn prepend_node(&mut self, node: NodeId, block: BlockId) {
        debug_assert!(self.is_block_attached(block));
        debug_assert!(!self.is_node_inserted(node));

        let block_node = &mut self.blocks[block];
        let mut node_node = NodeNode::with_block(block);

        if let Some(first_node) = block_node.first_node {
            node_node.next = Some(first_node);
            self.nodes[first_node].prev = Some(node);
        } else {
            block_node.last_node = Some(node);
        }

        block_node.first_node = Some(node);
        self.nodes[node] = node_node;
    }

    pub fn insert_node_before(&mut self, node: NodeId, before: NodeId) {
        debug_assert!(self.is_node_inserted(before));
        debug_assert!(!self.is_node_inserted(node));

        let before_node = &self.nodes[before];
        let block = before_node.block.unwrap();
        let mut node_node = NodeNode::with_block(block);

        match before_node.prev {
            Some(prev) => {
                node_node.prev = Some(prev);
                self.nodes[prev].next = Some(node);
            }
            None => self.blocks[block].first_node = Some(node),
        }
        node_node.next = Some(before);
        self.nodes[before].prev = Some(node);
        self.nodes[node] = node_node;
    }

    pub fn insert_node_after(&mut self, node: NodeId, after: NodeId) {
        debug_assert!(self.is_node_inserted(after));
        debug_assert!(!self.is_node_inserted(node));

        let after_node = &self.nodes[after];
        let block = after_node.block.unwrap();
        let mut node_node = NodeNode::with_block(block);

        match after_node.next {
            Some(next) => {
                node_node.next = Some(next);
                self.nodes[next].prev = Some(node);
            }
            None => self.blocks[block].last_node = Some(node),
        }
        node_node.prev = Some(after);
        self.nodes[after].next = Some(node);
        self.nodes[node] = node_node;
    }

    /// Remove node from the layout.
    pub fn remove_node(&mut self, node: NodeId) {
        debug_assert!(self.is_node_inserted(node));

        let node_node = &self.nodes[node];
        let block_node = &mut self.blocks[node_node.block.unwrap()];
        let prev_node = node_node.prev;
        let next_node = node_node.next;
        match (prev_node, next_node) {
            (Some(prev), Some(next)) => {
                self.nodes[prev].next = Some(next);
                self.nodes[next].prev = Some(prev);
            }
            (Some(prev), None) => {
                self.nodes[prev].next = None;
                block_node.last_node = Some(prev);
            }
            (None, Some(next)) => {
                self.nodes[next].prev = None;
                block_node.first_node = Some(next);
            }
            (None, None) => {
                block_node.first_node = None;
                block_node.last_node = None;
            }
        }

        self.nodes[node] = NodeNode::default();
    }
}

struct NodeIter<'a> {
    next: Option<NodeId>,
    nodes: &'a SecondaryMap<NodeId, NodeNode>,
}

impl Iterator for NodeIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let next = self.next?;
        self.next = self.nodes[next].next;
        Some(next)
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
struct BlockNode {
    /// The node owning the block, `None` for the root block.
    owner: Option<NodeId>,
    attached: bool,
    first_node: Option<NodeId>,
    last_node: Option<NodeId>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
struct NodeNode {
    /// A block in which the node exists.
    block: Option<BlockId>,
    /// A previous node.
    prev: Option<NodeId>,
    /// A next node.
    next: Option<NodeId>,
}

impl NodeNode {
    fn with_block(block: BlockId) -> Self {
        Self {
            block: Some(block),
            prev: None,
            next: None,
        }
    }
}
