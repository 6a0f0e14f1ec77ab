use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use trellis_ir::{BlockId, NodeId};

use crate::diagnostic::{Diagnostic, DiagnosticCode, Location};

use super::GraphVerifier;

impl GraphVerifier<'_> {
    pub(super) fn scan_layout(&mut self) {
        let root = self.graph.root();
        let layout = &self.graph.layout;
        if !layout.is_block_attached(root) || layout.block_owner(root).is_some() {
            self.emit(Diagnostic::error(
                DiagnosticCode::MissingRootBlock,
                "root block is not attached as a top-level block",
                Location::Block(root),
            ));
            return;
        }

        let mut visited = FxHashSet::default();
        self.scan_block(root, None, &mut visited);
    }

    fn scan_block(
        &mut self,
        block: BlockId,
        owner: Option<NodeId>,
        visited: &mut FxHashSet<BlockId>,
    ) {
        let graph = self.graph;
        let layout = &graph.layout;
        let listed_at = owner.map_or(Location::Block(block), |owner| self.node_location(owner));

        if graph.dfg.blocks.get(block).is_none() {
            self.emit(
                Diagnostic::error(
                    DiagnosticCode::InvalidBlockRef,
                    "node owns a block that does not exist",
                    listed_at,
                )
                .with_note(format!("missing {block}")),
            );
            return;
        }

        if !visited.insert(block) {
            self.emit(
                Diagnostic::error(
                    DiagnosticCode::BlockListedTwice,
                    "block is owned more than once",
                    listed_at,
                )
                .with_note(format!("{block} was already reached")),
            );
            return;
        }

        if !layout.is_block_attached(block) {
            self.emit(
                Diagnostic::error(
                    DiagnosticCode::DetachedBlockRef,
                    "node references a detached block",
                    listed_at,
                )
                .with_note(format!("{block} is detached")),
            );
            return;
        }

        let layout_owner = layout.block_owner(block);
        if layout_owner != owner {
            let owner_text =
                |owner: Option<NodeId>| owner.map_or("none".to_string(), |n| n.to_string());
            self.emit(
                Diagnostic::error(
                    DiagnosticCode::BlockOwnerMismatch,
                    "layout owner of block differs from the node listing it",
                    Location::Block(block),
                )
                .with_note(format!(
                    "layout owner {}, listed by {}",
                    owner_text(layout_owner),
                    owner_text(owner)
                )),
            );
        }

        let limit = graph.dfg.num_nodes();
        let mut nodes = Vec::new();
        for node in layout.iter_node(block) {
            if nodes.len() >= limit {
                self.emit(Diagnostic::error(
                    DiagnosticCode::LayoutNodeCycle,
                    "node list of block does not terminate",
                    Location::Block(block),
                ));
                break;
            }
            nodes.push(node);
        }

        self.block_order.push(block);
        let mut terminated = false;
        for (idx, &node) in nodes.iter().enumerate() {
            let Some(data) = graph.dfg.get_node(node) else {
                self.emit(Diagnostic::error(
                    DiagnosticCode::InvalidNodeRef,
                    "layout lists a node that does not exist",
                    Location::Block(block),
                ));
                continue;
            };

            if let Some(prev) = self.node_to_block.insert(node, block) {
                self.emit(
                    Diagnostic::error(
                        DiagnosticCode::NodeInMultipleBlocks,
                        "node is listed in more than one block",
                        self.node_location(node),
                    )
                    .with_note(format!("also listed in {prev}")),
                );
            } else if graph.layout.try_node_block(node) != Some(block) {
                self.emit(Diagnostic::error(
                    DiagnosticCode::NodeInMultipleBlocks,
                    "layout records a different block for node",
                    self.node_location(node),
                ));
            }

            let is_last = idx + 1 == nodes.len();
            if data.is_terminator() {
                if is_last {
                    terminated = true;
                } else {
                    self.emit(Diagnostic::error(
                        DiagnosticCode::TerminatorNotLast,
                        "terminator is followed by other nodes",
                        self.node_location(node),
                    ));
                }
            }
        }

        if !terminated {
            self.emit(Diagnostic::error(
                DiagnosticCode::MissingTerminator,
                "block does not end with a return",
                Location::Block(block),
            ));
        }

        self.block_to_nodes.insert(block, nodes.clone());
        for node in nodes {
            let Some(data) = graph.dfg.get_node(node) else {
                continue;
            };
            let subs: SmallVec<[BlockId; 2]> = data.blocks().into();
            for sub in subs {
                self.scan_block(sub, Some(node), visited);
            }
        }
    }
}
