//! A `petgraph::graph::DiGraph` view over a built `Cfg`, per `SPEC_FULL.md`
//! §3.7. The plain `BTreeMap`s in `cfg::Cfg` are what `build_cfg` itself
//! needs to answer partitioning/edge questions; this graph is what a caller
//! reaches for when it wants an actual graph algorithm (dominance,
//! reachability, topological order) rather than another linear scan.

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::BTreeMap;

use super::Cfg;

/// `node_for[block]` gives the `NodeIndex` of basic block `block` (1-based)
/// in the returned graph; node weights are the block numbers themselves.
pub fn to_digraph(cfg: &Cfg) -> (DiGraph<usize, ()>, BTreeMap<usize, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut node_for = BTreeMap::new();

    for block in 1..=cfg.block_count {
        node_for.insert(block, graph.add_node(block));
    }
    for (&block, succs) in &cfg.successors {
        for &succ in succs {
            graph.add_edge(node_for[&block], node_for[&succ], ());
        }
    }

    (graph, node_for)
}
