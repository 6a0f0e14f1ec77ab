use super::{BlockId, Graph, NodeData, NodeId};

/// Where the next inserted node goes.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorLocation {
    /// Right after this node.
    At(NodeId),
    BlockTop(BlockId),
    BlockBottom(BlockId),
    #[default]
    NoWhere,
}

pub trait GraphCursor {
    fn at_location(loc: CursorLocation) -> Self;
    fn set_location(&mut self, loc: CursorLocation);
    fn loc(&self) -> CursorLocation;

    fn insert_node(&mut self, graph: &mut Graph, node: NodeId) {
        match self.loc() {
            CursorLocation::At(at) => graph.layout.insert_node_after(node, at),
            CursorLocation::BlockTop(block) => graph.layout.prepend_node(node, block),
            CursorLocation::BlockBottom(block) => graph.layout.append_node(node, block),
            CursorLocation::NoWhere => panic!("cursor loc points to `NoWhere`"),
        }
    }

    /// Creates a node from `data`, inserts it at the cursor and moves the
    /// cursor onto it.
    fn insert_node_data(&mut self, graph: &mut Graph, data: NodeData) -> NodeId {
        let node = graph.dfg.make_node(data);
        self.insert_node(graph, node);
        self.set_location(CursorLocation::At(node));
        node
    }

    fn block(&self, graph: &Graph) -> Option<BlockId> {
        match self.loc() {
            CursorLocation::At(node) => Some(graph.layout.node_block(node)),
            CursorLocation::BlockTop(block) | CursorLocation::BlockBottom(block) => Some(block),
            CursorLocation::NoWhere => None,
        }
    }
}

#[derive(Debug)]
pub struct NodeInserter {
    loc: CursorLocation,
}

impl GraphCursor for NodeInserter {
    fn at_location(loc: CursorLocation) -> Self {
        Self { loc }
    }

    fn set_location(&mut self, loc: CursorLocation) {
        self.loc = loc;
    }

    fn loc(&self) -> CursorLocation {
        self.loc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NodeKind, Opcode, Type};

    #[test]
    fn insertion_follows_cursor() {
        let mut graph = Graph::new(&[Type::I64]);
        let root = graph.root();
        let x = graph.params()[0];

        let mut cursor = NodeInserter::at_location(CursorLocation::BlockBottom(root));
        let ret = cursor.insert_node_data(&mut graph, NodeData::new(NodeKind::Return, &[x]));
        assert_eq!(cursor.loc(), CursorLocation::At(ret));

        cursor.set_location(CursorLocation::BlockTop(root));
        let first = cursor.insert_node_data(
            &mut graph,
            NodeData::new(NodeKind::Op(Opcode::Trace), &[x]),
        );
        let second = cursor.insert_node_data(
            &mut graph,
            NodeData::new(NodeKind::Op(Opcode::Trace), &[x]),
        );

        let order: Vec<_> = graph.layout.iter_node(root).collect();
        assert_eq!(order, vec![first, second, ret]);
        assert_eq!(cursor.block(&graph), Some(root));
        assert_eq!(
            NodeInserter::at_location(CursorLocation::NoWhere).block(&graph),
            None
        );
    }
}
