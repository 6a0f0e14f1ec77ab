mod graph_builder;

pub use graph_builder::{GraphBuilder, IfHandle, LoopHandle};

pub mod test_util {
    use crate::{ir_writer::GraphWriter, Graph};

    pub fn dump_graph(graph: &Graph) -> String {
        let mut writer = GraphWriter::new(graph);
        writer.dump_string().unwrap()
    }
}
