//! In-process adjacency representation of the compiled station graph,
//! rebuilt from a [`static_store::GraphEdge`] snapshot. This is the form the
//! router's search actually walks; the flat edge list the graph compiler
//! commits is optimized for atomic replacement, not traversal.

use std::collections::{HashMap, HashSet};

use static_store::GraphEdge;

/// One outgoing edge from a node, with the graph-edge fields the search and
/// leg-construction steps need.
#[derive(Debug, Clone)]
pub struct AdjacentEdge {
    pub to_stop_id: String,
    pub route_id: String,
    pub travel_time_seconds: i64,
    pub transfer_penalty_seconds: i64,
    pub is_transfer: bool,
}

/// `node -> list of outgoing edges`, plus the full node set (a platform is a
/// node the moment it appears as either endpoint of some edge).
pub struct AdjacencyGraph {
    out_edges: HashMap<String, Vec<AdjacentEdge>>,
    nodes: HashSet<String>,
}

impl AdjacencyGraph {
    pub fn build(edges: &[GraphEdge]) -> Self {
        let mut out_edges: HashMap<String, Vec<AdjacentEdge>> = HashMap::new();
        let mut nodes: HashSet<String> = HashSet::new();

        for edge in edges {
            nodes.insert(edge.from_stop_id.clone());
            nodes.insert(edge.to_stop_id.clone());
            out_edges
                .entry(edge.from_stop_id.clone())
                .or_default()
                .push(AdjacentEdge {
                    to_stop_id: edge.to_stop_id.clone(),
                    route_id: edge.route_id.clone(),
                    travel_time_seconds: edge.travel_time_seconds,
                    transfer_penalty_seconds: edge.transfer_penalty_seconds,
                    is_transfer: edge.is_transfer,
                });
        }

        Self { out_edges, nodes }
    }

    pub fn contains_node(&self, stop_id: &str) -> bool {
        self.nodes.contains(stop_id)
    }

    pub fn edges_from(&self, stop_id: &str) -> &[AdjacentEdge] {
        self.out_edges
            .get(stop_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(from: &str, to: &str, is_transfer: bool) -> GraphEdge {
        GraphEdge {
            from_stop_id: from.to_owned(),
            to_stop_id: to.to_owned(),
            route_id: "R".to_owned(),
            travel_time_seconds: 300,
            transfer_penalty_seconds: if is_transfer { 180 } else { 0 },
            is_transfer,
        }
    }

    #[test]
    fn a_dangling_declared_transfer_target_is_a_node_but_has_no_outgoing_edges() {
        let graph = AdjacencyGraph::build(&[edge("AN", "BN", false), edge("BN", "CN", true)]);
        assert!(graph.contains_node("CN"));
        assert!(graph.edges_from("CN").is_empty());
    }

    #[test]
    fn edges_from_an_unknown_node_is_an_empty_slice_not_a_panic() {
        let graph = AdjacencyGraph::build(&[edge("AN", "BN", false)]);
        assert!(graph.edges_from("ZZ").is_empty());
    }
}
