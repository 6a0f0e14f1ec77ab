use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use trellis_ir::{BlockId, Graph, NodeId, Type, ValueId};

use crate::{
    diagnostic::{Diagnostic, Location},
    report::VerificationReport,
    VerifierConfig,
};

mod dominance;
mod layout;
mod metadata;
mod referential;
mod type_rules;

pub fn verify_graph(graph: &Graph, cfg: &VerifierConfig) -> VerificationReport {
    let mut verifier = GraphVerifier::new(graph, cfg);
    verifier.run();
    verifier.report
}

pub fn verify_graph_or_panic(graph: &Graph, cfg: &VerifierConfig) {
    let report = verify_graph(graph, cfg);
    if report.has_errors() {
        panic!("TRELLIS_IR_VERIFY_FAILURE\n{report}");
    }
}

pub(super) struct GraphVerifier<'a> {
    pub(super) graph: &'a Graph,
    pub(super) cfg: &'a VerifierConfig,
    pub(super) report: VerificationReport,

    /// Attached blocks in pre-order, starting from the root.
    pub(super) block_order: Vec<BlockId>,
    pub(super) block_to_nodes: FxHashMap<BlockId, Vec<NodeId>>,
    pub(super) node_to_block: FxHashMap<NodeId, BlockId>,
}

trait GraphPass {
    fn enabled(_cfg: &VerifierConfig) -> bool {
        true
    }

    fn run(verifier: &mut GraphVerifier<'_>);
}

struct LayoutPass;
struct ReferentialPass;
struct TypePass;
struct CanonicalLoopPass;
struct DominancePass;
struct MetadataPass;

impl GraphPass for LayoutPass {
    fn run(verifier: &mut GraphVerifier<'_>) {
        verifier.scan_layout();
    }
}

impl GraphPass for ReferentialPass {
    fn run(verifier: &mut GraphVerifier<'_>) {
        verifier.check_referential_integrity();
    }
}

impl GraphPass for TypePass {
    fn enabled(cfg: &VerifierConfig) -> bool {
        cfg.should_check_types()
    }

    fn run(verifier: &mut GraphVerifier<'_>) {
        verifier.check_type_rules();
    }
}

impl GraphPass for CanonicalLoopPass {
    fn enabled(cfg: &VerifierConfig) -> bool {
        cfg.require_canonical_loops
    }

    fn run(verifier: &mut GraphVerifier<'_>) {
        verifier.check_canonical_loops();
    }
}

impl GraphPass for DominancePass {
    fn enabled(cfg: &VerifierConfig) -> bool {
        cfg.should_check_dominance()
    }

    fn run(verifier: &mut GraphVerifier<'_>) {
        verifier.check_dominance_rules();
    }
}

impl GraphPass for MetadataPass {
    fn enabled(cfg: &VerifierConfig) -> bool {
        cfg.should_check_users()
    }

    fn run(verifier: &mut GraphVerifier<'_>) {
        verifier.check_metadata_consistency();
    }
}

impl<'a> GraphVerifier<'a> {
    fn new(graph: &'a Graph, cfg: &'a VerifierConfig) -> Self {
        Self {
            graph,
            cfg,
            report: VerificationReport::default(),
            block_order: Vec::new(),
            block_to_nodes: FxHashMap::default(),
            node_to_block: FxHashMap::default(),
        }
    }

    fn run(&mut self) {
        self.run_pass::<LayoutPass>();
        self.run_pass::<ReferentialPass>();
        // The remaining passes walk values and blocks through the graph API,
        // which assumes sound layout and references.
        if self.report.has_errors() {
            return;
        }

        self.run_pass::<TypePass>();
        self.run_pass::<CanonicalLoopPass>();
        self.run_pass::<DominancePass>();
        self.run_pass::<MetadataPass>();
    }

    fn run_pass<P: GraphPass>(&mut self) {
        if P::enabled(self.cfg) {
            P::run(self);
        }
    }

    pub(super) fn emit(&mut self, mut diagnostic: Diagnostic) {
        if let Location::Node { node, .. } = diagnostic.primary {
            if diagnostic.node_kind.is_none() {
                diagnostic.node_kind =
                    self.graph.dfg.get_node(node).map(|data| data.kind.as_text());
            }
        }
        self.report.push(diagnostic, self.cfg.max_diagnostics);
    }

    pub(super) fn node_location(&self, node: NodeId) -> Location {
        Location::Node {
            block: self.node_to_block.get(&node).copied(),
            node,
        }
    }

    /// Every node reached by the layout scan, in pre-order.
    pub(super) fn scanned_nodes(&self) -> Vec<NodeId> {
        self.block_order
            .iter()
            .flat_map(|block| self.block_to_nodes[block].iter().copied())
            .filter(|node| self.graph.dfg.get_node(*node).is_some())
            .collect()
    }

    pub(super) fn value_tys(&self, values: &[ValueId]) -> SmallVec<[Type; 4]> {
        values
            .iter()
            .map(|value| self.graph.dfg.value_ty(*value))
            .collect()
    }
}

pub(super) fn display_tys(tys: &[Type]) -> String {
    let tys: Vec<_> = tys.iter().map(Type::to_string).collect();
    format!("({})", tys.join(", "))
}
