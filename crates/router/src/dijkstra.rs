//! Shortest-path search over the transfer-budgeted state space
//! `(node, transfer_count)`.
//!
//! Edge costs are non-negative integers (seconds), so a plain
//! `BinaryHeap<Reverse<_>>` min-heap is sufficient; there is no need for the
//! float-keyed priority wrapper a general-purpose graph library would use.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::adjacency::AdjacencyGraph;

/// One edge of a reconstructed path, carrying everything leg construction
/// needs.
#[derive(Debug, Clone)]
pub struct PathEdge {
    pub from_stop_id: String,
    pub to_stop_id: String,
    pub route_id: String,
    pub travel_time_seconds: i64,
    pub is_transfer: bool,
}

type State = (String, u32);

/// Runs Dijkstra from `origin` to `destination` over `(node, transfer_count)`,
/// rejecting any relaxation that would push the transfer count above
/// `max_transfers`. Returns the edge-ordered path on success.
///
/// The first time a state with `node == destination` is popped off the heap
/// (at *any* transfer count), that is the minimum-cost path to `destination`
/// within the transfer budget, since the heap always extracts states in
/// non-decreasing cost order.
pub fn shortest_path(
    graph: &AdjacencyGraph,
    origin: &str,
    destination: &str,
    max_transfers: u32,
) -> Option<Vec<PathEdge>> {
    let start: State = (origin.to_owned(), 0);

    let mut best_cost: HashMap<State, i64> = HashMap::new();
    let mut predecessor: HashMap<State, (State, PathEdge)> = HashMap::new();
    let mut heap: BinaryHeap<Reverse<(i64, State)>> = BinaryHeap::new();

    best_cost.insert(start.clone(), 0);
    heap.push(Reverse((0, start.clone())));

    while let Some(Reverse((cost, state))) = heap.pop() {
        if state.0 == destination {
            return Some(reconstruct(&predecessor, state));
        }

        // Stale heap entry: a cheaper relaxation already superseded it.
        if cost > *best_cost.get(&state).unwrap_or(&i64::MAX) {
            continue;
        }

        for edge in graph.edges_from(&state.0) {
            let next_transfers = state.1 + u32::from(edge.is_transfer);
            if next_transfers > max_transfers {
                continue;
            }

            let next_state: State = (edge.to_stop_id.clone(), next_transfers);
            let next_cost = cost + edge.travel_time_seconds + edge.transfer_penalty_seconds;

            if next_cost < *best_cost.get(&next_state).unwrap_or(&i64::MAX) {
                best_cost.insert(next_state.clone(), next_cost);
                predecessor.insert(
                    next_state.clone(),
                    (
                        state.clone(),
                        PathEdge {
                            from_stop_id: state.0.clone(),
                            to_stop_id: edge.to_stop_id.clone(),
                            route_id: edge.route_id.clone(),
                            travel_time_seconds: edge.travel_time_seconds,
                            is_transfer: edge.is_transfer,
                        },
                    ),
                );
                heap.push(Reverse((next_cost, next_state)));
            }
        }
    }

    None
}

fn reconstruct(predecessor: &HashMap<State, (State, PathEdge)>, mut state: State) -> Vec<PathEdge> {
    let mut path = Vec::new();
    while let Some((prev_state, edge)) = predecessor.get(&state) {
        path.push(edge.clone());
        state = prev_state.clone();
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use static_store::GraphEdge;

    fn edge(from: &str, to: &str, route_id: &str, travel: i64, penalty: i64, is_transfer: bool) -> GraphEdge {
        GraphEdge {
            from_stop_id: from.to_owned(),
            to_stop_id: to.to_owned(),
            route_id: route_id.to_owned(),
            travel_time_seconds: travel,
            transfer_penalty_seconds: penalty,
            is_transfer,
        }
    }

    #[test]
    fn two_stop_single_line_trip() {
        let graph = AdjacencyGraph::build(&[edge("A", "B", "R", 300, 0, false)]);
        let path = shortest_path(&graph, "A", "B", 3).unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].travel_time_seconds, 300);
        assert!(!path[0].is_transfer);
    }

    #[test]
    fn two_line_trip_with_transfer() {
        let edges = vec![
            edge("A", "B", "R1", 300, 0, false),
            edge("B", "B", "TRANSFER", 0, 180, true),
            edge("B", "C", "R2", 240, 0, false),
        ];
        let graph = AdjacencyGraph::build(&edges);
        let path = shortest_path(&graph, "A", "C", 2).unwrap();
        let total: i64 = path.iter().map(|e| e.travel_time_seconds).sum();
        assert_eq!(total, 540);
        assert_eq!(path.len(), 3);
        assert!(path[1].is_transfer);
    }

    #[test]
    fn transfer_budget_of_zero_rejects_a_path_that_needs_a_transfer() {
        let edges = vec![
            edge("A", "B", "R1", 300, 0, false),
            edge("B", "B", "TRANSFER", 0, 180, true),
            edge("B", "C", "R2", 240, 0, false),
        ];
        let graph = AdjacencyGraph::build(&edges);
        assert!(shortest_path(&graph, "A", "C", 0).is_none());
    }

    #[test]
    fn transfer_budget_of_zero_still_finds_a_direct_path() {
        let graph = AdjacencyGraph::build(&[edge("A", "B", "R", 300, 0, false)]);
        assert!(shortest_path(&graph, "A", "B", 0).is_some());
    }

    #[test]
    fn no_path_between_disconnected_nodes() {
        let graph = AdjacencyGraph::build(&[edge("A", "B", "R", 300, 0, false)]);
        assert!(shortest_path(&graph, "A", "Z", 3).is_none());
    }

    #[test]
    fn prefers_the_cheaper_of_two_routes_between_the_same_pair() {
        let edges = vec![
            edge("A", "B", "R1", 600, 0, false),
            edge("A", "B", "R2", 300, 0, false),
        ];
        let graph = AdjacencyGraph::build(&edges);
        let path = shortest_path(&graph, "A", "B", 3).unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].route_id, "R2");
    }
}
