use std::fmt;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Sentinel `route_id` used for a declared (inter-station) transfer edge.
pub const TRANSFER_ROUTE_ID: &str = "TRANSFER";

/// Sentinel `route_id` used for a synthesized intra-station platform transfer.
pub const PLATFORM_TRANSFER_ROUTE_ID: &str = "PLATFORM_TRANSFER";

/// A single directed edge of the compiled station graph.
///
/// Two kinds of edge share this shape: a scheduled leg between two
/// consecutive stops on a trip (`route_id` names a real [`Route`], `is_transfer: false`),
/// and a transfer between platforms (`route_id` is one of the sentinels above,
/// `is_transfer: true`) whether declared in transfers.txt or synthesized
/// between a station's own directional platforms.
///
/// [`Route`]: gtfs::data_model::routes::Route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from_stop_id: String,
    pub to_stop_id: String,
    pub route_id: String,
    pub travel_time_seconds: i64,
    pub transfer_penalty_seconds: i64,
    pub is_transfer: bool,
}

/// Raised when the graph compiler attempts to commit a result that would
/// leave the store without a usable graph.
#[derive(Debug)]
pub enum GraphCommitError {
    EmptyGraph,
}

impl fmt::Display for GraphCommitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGraph => write!(f, "refusing to commit an empty graph"),
        }
    }
}

impl std::error::Error for GraphCommitError {}

/// The compiled station graph, held behind an `ArcSwap` so the router can
/// take a lock-free snapshot while the graph compiler commits a fresh one
/// out from under it. Readers that are mid-search keep working against their
/// own snapshot; a commit never blocks them and never observes a half
/// replaced table.
pub struct GraphTable {
    edges: ArcSwap<Vec<GraphEdge>>,
}

impl GraphTable {
    pub fn empty() -> Self {
        Self {
            edges: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Atomically replaces the entire edge set. Readers holding an older
    /// snapshot via [`GraphTable::snapshot`] are unaffected.
    pub fn replace(&self, edges: Vec<GraphEdge>) -> Result<(), GraphCommitError> {
        if edges.is_empty() {
            return Err(GraphCommitError::EmptyGraph);
        }
        self.edges.store(Arc::new(edges));
        Ok(())
    }

    /// A consistent point-in-time view of the graph.
    pub fn snapshot(&self) -> Arc<Vec<GraphEdge>> {
        self.edges.load_full()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.load().is_empty()
    }
}

impl Default for GraphTable {
    fn default() -> Self {
        Self::empty()
    }
}
