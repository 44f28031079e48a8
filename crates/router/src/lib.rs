//! Turns the compiled station graph plus the live arrivals cache into
//! point-to-point itineraries.
//!
//! A query expands each endpoint to the platform ids it could name, tries
//! every origin/destination platform pairing, keeps the cheapest, then
//! overlays a live boarding time onto the first leg where the cache has one.

mod adjacency;
mod dijkstra;

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::Serialize;

use adjacency::AdjacencyGraph;
use arrivals_cache::ArrivalsCache;
use dijkstra::PathEdge;
use static_store::{platform, StaticStore};

const DIRECTIONS: [char; 4] = ['N', 'S', 'E', 'W'];

#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub max_transfers: u32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self { max_transfers: 3 }
    }
}

/// A single scheduled (or live-overlaid) boarding in an itinerary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leg {
    pub from_stop_id: String,
    pub to_stop_id: String,
    pub route_id: String,
    /// Seconds until boarding: the live prediction where one was found for
    /// the first leg, otherwise the scheduled travel time.
    pub board_in_seconds: i64,
    pub travel_time_seconds: i64,
    /// True for every leg after the first, a property of position in the
    /// filtered leg list rather than of the underlying edge.
    pub is_transfer_leg: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Itinerary {
    pub legs: Vec<Leg>,
    pub transfers: usize,
    pub total_eta_seconds: i64,
    pub alerts: Vec<String>,
}

impl Itinerary {
    fn empty() -> Self {
        Self {
            legs: Vec::new(),
            transfers: 0,
            total_eta_seconds: 0,
            alerts: Vec::new(),
        }
    }
}

/// The distinguishable outcomes of a query: an actual itinerary, or the
/// same-endpoint short-circuit, which a caller can tell apart from a
/// genuinely empty-legs itinerary rather than having to infer it.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    SameEndpoint,
    Itinerary(Itinerary),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    OriginNotFound,
    DestinationNotFound,
    NoRoute,
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OriginNotFound => write!(f, "origin has no platform in the graph"),
            Self::DestinationNotFound => write!(f, "destination has no platform in the graph"),
            Self::NoRoute => write!(f, "no route found within the transfer budget"),
        }
    }
}

impl std::error::Error for RouteError {}

/// Answers `(origin, destination) -> itinerary` against a [`StaticStore`]'s
/// compiled graph and a shared [`ArrivalsCache`].
pub struct Router {
    store: Arc<StaticStore>,
    cache: Arc<ArrivalsCache>,
    config: RouterConfig,
    graph: ArcSwapOption<AdjacencyGraph>,
}

impl Router {
    pub fn new(store: Arc<StaticStore>, cache: Arc<ArrivalsCache>, config: RouterConfig) -> Self {
        Self {
            store,
            cache,
            config,
            graph: ArcSwapOption::empty(),
        }
    }

    /// Drops the cached adjacency graph. The next query rebuilds it from the
    /// static store's current snapshot.
    pub fn invalidate(&self) {
        self.graph.store(None);
    }

    fn loaded_graph(&self) -> Arc<AdjacencyGraph> {
        if let Some(graph) = self.graph.load_full() {
            return graph;
        }
        log::debug!("rebuilding router adjacency graph from the static store snapshot");
        let built = Arc::new(AdjacencyGraph::build(&self.store.graph.snapshot()));
        self.graph.store(Some(Arc::clone(&built)));
        built
    }

    pub fn query(&self, origin: &str, destination: &str) -> Result<QueryOutcome, RouteError> {
        if origin == destination {
            return Ok(QueryOutcome::SameEndpoint);
        }

        let graph = self.loaded_graph();

        let origin_candidates = expand_existing(&graph, origin);
        if origin_candidates.is_empty() {
            return Err(RouteError::OriginNotFound);
        }
        let destination_candidates = expand_existing(&graph, destination);
        if destination_candidates.is_empty() {
            return Err(RouteError::DestinationNotFound);
        }

        let path = outer_search(
            &graph,
            &origin_candidates,
            &destination_candidates,
            self.config.max_transfers,
        )
        .ok_or(RouteError::NoRoute)?;

        Ok(QueryOutcome::Itinerary(self.build_itinerary(path)))
    }

    fn build_itinerary(&self, path: Vec<PathEdge>) -> Itinerary {
        let revenue_edges: Vec<PathEdge> = path.into_iter().filter(|e| !e.is_transfer).collect();
        if revenue_edges.is_empty() {
            return Itinerary::empty();
        }

        let mut legs = Vec::with_capacity(revenue_edges.len());
        for (index, edge) in revenue_edges.iter().enumerate() {
            let is_transfer_leg = index > 0;
            let board_in_seconds = if index == 0 {
                self.first_leg_board_in_seconds(edge)
            } else {
                edge.travel_time_seconds
            };
            legs.push(Leg {
                from_stop_id: edge.from_stop_id.clone(),
                to_stop_id: edge.to_stop_id.clone(),
                route_id: edge.route_id.clone(),
                board_in_seconds,
                travel_time_seconds: edge.travel_time_seconds,
                is_transfer_leg,
            });
        }

        let transfers = legs.iter().filter(|leg| leg.is_transfer_leg).count();
        let total_eta_seconds = legs
            .iter()
            .map(|leg| leg.board_in_seconds + leg.travel_time_seconds)
            .sum();

        Itinerary {
            legs,
            transfers,
            total_eta_seconds,
            alerts: Vec::new(),
        }
    }

    /// Live overlay for the first leg: the minimum live `eta_seconds` across
    /// all four direction buckets for the leg's base stop, matching its
    /// route, falling back to the scheduled travel time.
    fn first_leg_board_in_seconds(&self, first_leg: &PathEdge) -> i64 {
        let base_stop_id = platform::base_stop_id(&first_leg.from_stop_id);

        let mut min_eta: Option<i64> = None;
        for direction in DIRECTIONS {
            let Some(predictions) = self.cache.get(base_stop_id, direction) else {
                continue;
            };
            for prediction in predictions {
                if prediction.route_id != first_leg.route_id {
                    continue;
                }
                min_eta = Some(match min_eta {
                    Some(current) => current.min(prediction.eta_seconds),
                    None => prediction.eta_seconds,
                });
            }
        }

        min_eta.unwrap_or(first_leg.travel_time_seconds)
    }
}

/// `expand(s)` filtered down to ids that actually exist as nodes in `graph`.
fn expand_existing(graph: &AdjacencyGraph, stop_id: &str) -> Vec<String> {
    platform::expand(stop_id)
        .into_iter()
        .filter(|candidate| graph.contains_node(candidate))
        .collect()
}

/// Tries every `(o, d)` pairing, keeping the path with the smallest sum of
/// non-penalty travel time across its non-transfer edges. Ties are broken by
/// the fixed iteration order of `origins`/`destinations` (both already in
/// N, S, E, W order via [`platform::expand`]), keeping the first minimum
/// found.
fn outer_search(
    graph: &AdjacencyGraph,
    origins: &[String],
    destinations: &[String],
    max_transfers: u32,
) -> Option<Vec<PathEdge>> {
    let mut best: Option<(i64, Vec<PathEdge>)> = None;

    for origin in origins {
        for destination in destinations {
            if origin == destination {
                continue;
            }
            let Some(path) = dijkstra::shortest_path(graph, origin, destination, max_transfers) else {
                continue;
            };
            let travel_time_sum: i64 = path
                .iter()
                .filter(|edge| !edge.is_transfer)
                .map(|edge| edge.travel_time_seconds)
                .sum();

            let is_better = match &best {
                Some((best_sum, _)) => travel_time_sum < *best_sum,
                None => true,
            };
            if is_better {
                best = Some((travel_time_sum, path));
            }
        }
    }

    best.map(|(_, path)| path)
}
