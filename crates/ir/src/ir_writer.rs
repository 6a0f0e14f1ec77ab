//! Textual dump of a [`Graph`].
use std::io;

use crate::{BlockId, Graph, NodeId, Value, ValueId};

pub struct GraphWriter<'a> {
    graph: &'a Graph,
    level: u8,
}

impl<'a> GraphWriter<'a> {
    pub fn new(graph: &'a Graph) -> Self {
        Self { graph, level: 0 }
    }

    pub fn write(&mut self, mut w: impl io::Write) -> io::Result<()> {
        self.write_graph(&mut w)
    }

    pub fn dump_string(&mut self) -> io::Result<String> {
        let mut s = Vec::new();
        self.write(&mut s)?;
        String::from_utf8(s).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    fn write_graph(&mut self, w: &mut dyn io::Write) -> io::Result<()> {
        write!(w, "graph(")?;
        self.write_typed_values(self.graph.params(), ", ", w)?;
        writeln!(w, ") {{")?;

        self.level += 1;
        for node in self.graph.layout.iter_node(self.graph.root()) {
            self.write_node(node, w)?;
        }
        self.level -= 1;

        writeln!(w, "}}")
    }

    fn write_node(&mut self, node: NodeId, w: &mut dyn io::Write) -> io::Result<()> {
        let data = self.graph.dfg.node(node);
        self.indent(w)?;

        if !data.results().is_empty() {
            self.write_typed_values(data.results(), ", ", w)?;
            write!(w, " = ")?;
        }
        write!(w, "{}", data.kind.as_text())?;
        for &arg in data.args() {
            write!(w, " ")?;
            self.write_value(arg, w)?;
        }

        if data.blocks().is_empty() {
            return writeln!(w, ";");
        }

        writeln!(w, " {{")?;
        self.level += 1;
        for &block in data.blocks() {
            self.write_block(block, w)?;
        }
        self.level -= 1;
        self.indent(w)?;
        writeln!(w, "}};")
    }

    fn write_block(&mut self, block: BlockId, w: &mut dyn io::Write) -> io::Result<()> {
        self.indent(w)?;
        write!(w, "{block}")?;
        let params = self.graph.dfg.block_params(block);
        if !params.is_empty() {
            write!(w, "(")?;
            self.write_typed_values(params, ", ", w)?;
            write!(w, ")")?;
        }
        writeln!(w, ":")?;

        self.level += 1;
        for node in self.graph.layout.iter_node(block) {
            self.write_node(node, w)?;
        }
        self.level -= 1;
        Ok(())
    }

    fn write_value(&self, value: ValueId, w: &mut dyn io::Write) -> io::Result<()> {
        match self.graph.dfg.value(value) {
            Value::Immediate { imm, ty } => write!(w, "{imm}.{ty}"),
            _ => write!(w, "{value}"),
        }
    }

    fn write_typed_values(
        &self,
        values: &[ValueId],
        delim: &str,
        w: &mut dyn io::Write,
    ) -> io::Result<()> {
        let mut iter = values.iter().peekable();
        while let Some(&value) = iter.next() {
            write!(w, "{value}.{}", self.graph.dfg.value_ty(value))?;
            if iter.peek().is_some() {
                w.write_all(delim.as_bytes())?;
            }
        }
        Ok(())
    }

    fn indent(&self, w: &mut dyn io::Write) -> io::Result<()> {
        w.write_all(" ".repeat(self.level as usize * 4).as_bytes())
    }
}
