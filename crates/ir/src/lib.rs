pub mod block_clone;
pub mod builder;
pub mod dfg;
pub mod graph;
pub mod graph_cursor;
pub mod ir_writer;
pub mod layout;
pub mod loops;
pub mod node;
pub mod types;
pub mod value;

pub use block_clone::{clone_block, clone_block_with_map};
pub use dfg::{Block, BlockId, DataFlowGraph};
pub use graph::Graph;
pub use graph_cursor::{CursorLocation, GraphCursor, NodeInserter};
pub use ir_writer::GraphWriter;
pub use layout::Layout;
pub use loops::{loop_shape, LoopShape, LoopShapeError, LoopView};
pub use node::{NodeData, NodeId, NodeKind, Opcode};
pub use types::Type;
pub use value::{Immediate, Value, ValueId};
