//! Optional graph export (`viz` feature), spec.md §6 non-core convenience.
//!
//! Grounded in the teacher's `genome/visualization.rs::generate_graph`,
//! which builds a `petgraph::stable_graph::StableGraph` from a genome's
//! nodes and connections; narrowed here to a dot-export helper since the
//! teacher's companion `eframe`/`egui_graphs` viewer is out of scope
//! (SPEC_FULL.md §10).

use std::collections::HashMap;

use petgraph::dot::{Config, Dot};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;

use crate::genome::Genome;

/// Build a `petgraph` graph mirroring `genome`'s node and enabled-connection
/// structure. Node and edge weights carry the ids and weights needed to
/// render a readable dot file.
pub fn to_graph(genome: &Genome) -> StableGraph<usize, f32> {
    let mut graph = StableGraph::new();
    let mut ids: HashMap<usize, NodeIndex> = HashMap::with_capacity(genome.nodes().len());

    for &node_id in genome.nodes().keys() {
        let graph_id = graph.add_node(node_id);
        ids.insert(node_id, graph_id);
    }

    for connection in genome.connections().values().filter(|c| c.enabled) {
        let source = ids[&connection.in_node];
        let target = ids[&connection.out_node];
        graph.add_edge(source, target, connection.weight);
    }

    graph
}

/// Render `genome` as Graphviz dot source.
pub fn to_dot(genome: &Genome) -> String {
    let graph = to_graph(genome);
    format!("{:?}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NeatConfig;
    use crate::innovation::InnovationRecord;
    use crate::rng::Rng;

    #[test]
    fn dot_export_contains_a_digraph_header() {
        let config = NeatConfig::default();
        let mut rng = Rng::from_seed(1);
        let mut reg = InnovationRecord::new(0);
        let genome = Genome::bootstrap(2, 1, &config, &mut rng, &mut reg);
        let dot = to_dot(&genome);
        assert!(dot.contains("digraph"));
    }
}
