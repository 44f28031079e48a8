//! Durable, read-mostly view of a static schedule revision plus the
//! materialized station graph derived from it.
//!
//! The schedule tables ([`gtfs::database::GtfsDatabase`]) are loaded once per
//! feed revision and never mutated after that; the graph table is the one
//! part of this store with a regular writer (the graph compiler), which
//! replaces it wholesale via [`GraphTable::replace`].

pub mod graph;
pub mod loader;
pub mod platform;

use gtfs::database::GtfsDatabase;

pub use graph::{GraphCommitError, GraphEdge, GraphTable};

/// The collaborator the rest of the system talks to: schedule tables plus
/// the compiled graph, bundled so a caller only needs to hold one handle.
pub struct StaticStore {
    pub schedule: GtfsDatabase,
    pub graph: GraphTable,
}

impl StaticStore {
    pub fn new(schedule: GtfsDatabase) -> Self {
        Self {
            schedule,
            graph: GraphTable::empty(),
        }
    }
}
