use smallvec::SmallVec;

use crate::{
    graph_cursor::{CursorLocation, GraphCursor, NodeInserter},
    BlockId, DataFlowGraph, Graph, Immediate, NodeData, NodeId, NodeKind, Opcode, Type, ValueId,
};

/// Handle to a loop node created by [`GraphBuilder::make_loop`].
#[derive(Debug, Clone)]
pub struct LoopHandle {
    pub node: NodeId,
    pub body: BlockId,
    /// `[iter, carried..]`.
    pub body_params: SmallVec<[ValueId; 4]>,
    /// Final carried values.
    pub results: SmallVec<[ValueId; 2]>,
}

/// Handle to an `if` node created by [`GraphBuilder::make_if`].
#[derive(Debug, Clone)]
pub struct IfHandle {
    pub node: NodeId,
    pub then_block: BlockId,
    pub else_block: BlockId,
    pub results: SmallVec<[ValueId; 2]>,
}

pub struct GraphBuilder {
    pub graph: Graph,
    pub cursor: NodeInserter,
}

impl GraphBuilder {
    pub fn new(param_tys: &[Type]) -> Self {
        let graph = Graph::new(param_tys);
        let cursor = NodeInserter::at_location(CursorLocation::BlockBottom(graph.root()));
        Self { graph, cursor }
    }

    pub fn finish(self) -> Graph {
        self.graph
    }

    pub fn root(&self) -> BlockId {
        self.graph.root()
    }

    pub fn params(&self) -> &[ValueId] {
        self.graph.params()
    }

    pub fn dfg(&self) -> &DataFlowGraph {
        &self.graph.dfg
    }

    pub fn switch_to_block(&mut self, block: BlockId) {
        self.cursor.set_location(CursorLocation::BlockBottom(block));
    }

    pub fn make_imm_value<Imm>(&mut self, imm: Imm) -> ValueId
    where
        Imm: Into<Immediate>,
    {
        self.graph.dfg.make_imm_value(imm)
    }

    /// Inserts a plain instruction at the current position and returns its
    /// result.
    pub fn insert_op(&mut self, op: Opcode, args: &[ValueId]) -> ValueId {
        let arg_tys: SmallVec<[Type; 2]> = args
            .iter()
            .map(|arg| self.graph.dfg.value_ty(*arg))
            .collect();
        let ty = op.result_ty(&arg_tys);

        let node = self.insert_node(NodeData::new(NodeKind::Op(op), args));
        self.graph.dfg.make_results(node, &[ty])[0]
    }

    /// Terminates the current block, declaring `values` as its outputs.
    pub fn ret(&mut self, values: &[ValueId]) -> NodeId {
        self.insert_node(NodeData::new(NodeKind::Return, values))
    }

    /// Inserts an `if` node producing values of `result_tys`. Both branches
    /// are left empty and must be terminated by the caller.
    pub fn make_if(&mut self, cond: ValueId, result_tys: &[Type]) -> IfHandle {
        let node = self.insert_node(NodeData::new(NodeKind::If, &[cond]));
        let results = self.graph.dfg.make_results(node, result_tys);
        let then_block = self.graph.make_owned_block(node, &[]);
        let else_block = self.graph.make_owned_block(node, &[]);

        IfHandle {
            node,
            then_block,
            else_block,
            results,
        }
    }

    /// Inserts a loop node carrying `carried` values.
    ///
    /// With `initial_cond` the loop is built in canonical shape and its body
    /// must return `[continue_cond, carried'..]`. Without it, the body must
    /// return `[carried'..]` and a condition block has to be added with
    /// [`Self::add_condition_block`].
    pub fn make_loop(
        &mut self,
        max_trip_count: ValueId,
        initial_cond: Option<ValueId>,
        carried: &[ValueId],
    ) -> LoopHandle {
        let mut args: SmallVec<[ValueId; 4]> = SmallVec::new();
        args.push(max_trip_count);
        args.extend(initial_cond);
        args.extend_from_slice(carried);

        let carried_tys = self.value_tys(carried);
        let node = self.insert_node(NodeData::new(NodeKind::Loop, &args));
        let results = self.graph.dfg.make_results(node, &carried_tys);

        let mut body_tys: SmallVec<[Type; 4]> = SmallVec::new();
        body_tys.push(Type::I64);
        body_tys.extend_from_slice(&carried_tys);
        let body = self.graph.make_owned_block(node, &body_tys);
        let body_params = self.graph.dfg.block_params(body).into();

        LoopHandle {
            node,
            body,
            body_params,
            results,
        }
    }

    /// Adds a condition block to `loop_node`, taking the loop-carried values
    /// as parameters. The block must be terminated with a single `i1`.
    pub fn add_condition_block(&mut self, loop_node: NodeId) -> BlockId {
        let carried: SmallVec<[ValueId; 2]> = self.graph.dfg.node_results(loop_node).into();
        let carried_tys = self.value_tys(&carried);
        self.graph.make_owned_block(loop_node, &carried_tys)
    }

    fn value_tys(&self, values: &[ValueId]) -> SmallVec<[Type; 4]> {
        values
            .iter()
            .map(|value| self.graph.dfg.value_ty(*value))
            .collect()
    }

    fn insert_node(&mut self, data: NodeData) -> NodeId {
        self.cursor.insert_node_data(&mut self.graph, data)
    }
}
