//! Derives the weighted, transfer-penalized station graph from a loaded
//! static schedule and commits it to a [`StaticStore`]'s [`GraphTable`].
//!
//! Three edge families are built, in order, and concatenated into one commit:
//! consecutive-stop edges from stop_times (one per trip leg, duplicates
//! collapsed by averaging), declared-transfer edges from transfers.txt
//! (expanded across directional platforms), and synthesized intra-station
//! platform-transfer edges between a station's own directional siblings.

use std::collections::{HashMap, HashSet};

use chrono::Duration;

use gtfs::data_model::stop_times::StopTime;
use gtfs::data_model::transfers::TransferType;
use gtfs::data_model::trips::TripId;
use gtfs::database::GtfsDatabase;
use static_store::graph::{GraphEdge, PLATFORM_TRANSFER_ROUTE_ID, TRANSFER_ROUTE_ID};
use static_store::{platform, GraphCommitError, StaticStore};

const DIRECTIONS: [char; 4] = ['N', 'S', 'E', 'W'];

#[derive(Debug, Clone)]
pub struct GraphCompilerConfig {
    /// Minimum travel time assigned to a consecutive-stop edge, in seconds.
    pub minimum_edge_seconds: i64,
    /// Travel time assigned when a stop_time pair's times are missing or
    /// fail to parse, in seconds.
    pub default_edge_seconds: i64,
    /// Transfer penalty for declared transfers of type 0 (recommended) and
    /// 1 (timed), used when `min_transfer_time` is absent.
    pub transfer_penalty_min_seconds: i64,
    /// Transfer penalty for every other declared transfer type (besides
    /// `NotPossible`, which is skipped entirely), used when
    /// `min_transfer_time` is absent.
    pub transfer_penalty_max_seconds: i64,
    /// Penalty applied to synthesized intra-station platform transfers.
    pub platform_transfer_penalty_seconds: i64,
}

impl Default for GraphCompilerConfig {
    fn default() -> Self {
        Self {
            minimum_edge_seconds: 60,
            default_edge_seconds: 120,
            transfer_penalty_min_seconds: 180,
            transfer_penalty_max_seconds: 300,
            platform_transfer_penalty_seconds: 300,
        }
    }
}

/// Builds the full edge set for `schedule` without touching any store.
/// Exposed separately from [`compile_and_commit`] so tests (and callers that
/// want to inspect the graph before committing) don't need a [`StaticStore`].
pub fn build_edges(schedule: &GtfsDatabase, config: &GraphCompilerConfig) -> Vec<GraphEdge> {
    let mut edges = build_consecutive_stop_edges(schedule, config);
    let sources = edge_sources(&edges);
    edges.extend(build_declared_transfer_edges(schedule, config));
    edges.extend(build_platform_transfer_edges(&sources, config));
    edges
}

/// Runs [`build_edges`] and commits the result to `store`'s graph table.
/// All-or-nothing: a failure to commit leaves the previous graph in place.
pub fn compile_and_commit(
    store: &StaticStore,
    config: &GraphCompilerConfig,
) -> Result<usize, GraphCommitError> {
    let edges = build_edges(&store.schedule, config);
    let count = edges.len();
    store.graph.replace(edges)?;
    log::info!("graph compiler committed {count} edges");
    Ok(count)
}

fn parse_seconds(duration: Duration) -> i64 {
    duration.num_seconds()
}

fn build_consecutive_stop_edges(
    schedule: &GtfsDatabase,
    config: &GraphCompilerConfig,
) -> Vec<GraphEdge> {
    let route_by_trip: HashMap<TripId, String> = schedule
        .trips
        .get_all()
        .into_iter()
        .map(|trip| (trip.id.clone(), trip.route_id.raw()))
        .collect();

    let mut by_trip: HashMap<TripId, Vec<StopTime>> = HashMap::new();
    for stop_time in schedule.stop_times.get_all() {
        by_trip
            .entry(stop_time.trip_id.clone())
            .or_default()
            .push(stop_time);
    }

    // (from, to, route) -> observed travel times, collapsed by average below.
    let mut candidates: HashMap<(String, String, String), Vec<i64>> = HashMap::new();

    for (trip_id, mut stop_times) in by_trip {
        stop_times.sort_by_key(|st| st.stop_sequence);
        let Some(route_id) = route_by_trip.get(&trip_id) else {
            log::debug!("skipping trip {trip_id} with no matching route");
            continue;
        };

        for pair in stop_times.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            let (Some(from_stop), Some(to_stop)) = (prev.stop_id.as_ref(), next.stop_id.as_ref())
            else {
                continue;
            };

            let travel_time = match (prev.departure_time, next.arrival_time) {
                (Some(departure), Some(arrival)) => {
                    let raw = parse_seconds(arrival) - parse_seconds(departure);
                    raw.max(config.minimum_edge_seconds)
                }
                _ => config.default_edge_seconds,
            };

            candidates
                .entry((from_stop.raw(), to_stop.raw(), route_id.clone()))
                .or_default()
                .push(travel_time);
        }
    }

    candidates
        .into_iter()
        .map(|((from_stop_id, to_stop_id, route_id), times)| {
            let average = times.iter().sum::<i64>() / times.len() as i64;
            GraphEdge {
                from_stop_id,
                to_stop_id,
                route_id,
                travel_time_seconds: average,
                transfer_penalty_seconds: 0,
                is_transfer: false,
            }
        })
        .collect()
}

/// Every directional platform id that is the source of at least one
/// consecutive-stop edge, grouped by base station id.
fn edge_sources(edges: &[GraphEdge]) -> HashMap<String, HashSet<char>> {
    let mut sources: HashMap<String, HashSet<char>> = HashMap::new();
    for edge in edges {
        if let Some(direction) = platform::direction_suffix(&edge.from_stop_id) {
            sources
                .entry(platform::base_stop_id(&edge.from_stop_id).to_owned())
                .or_default()
                .insert(direction);
        }
    }
    sources
}

fn build_declared_transfer_edges(
    schedule: &GtfsDatabase,
    config: &GraphCompilerConfig,
) -> Vec<GraphEdge> {
    let mut edges = Vec::new();

    for transfer in schedule.transfers.get_all() {
        if transfer.kind == TransferType::NotPossible {
            continue;
        }
        let (Some(from_stop_id), Some(to_stop_id)) = (&transfer.from_stop_id, &transfer.to_stop_id)
        else {
            continue;
        };
        let (from_raw, to_raw) = (from_stop_id.raw(), to_stop_id.raw());
        if from_raw == to_raw {
            continue;
        }

        let penalty = transfer.minimum_transfer_time.map(i64::from).unwrap_or(
            match transfer.kind {
                TransferType::RecommendedTransferPoint | TransferType::TimedTransferPoint => {
                    config.transfer_penalty_min_seconds
                }
                _ => config.transfer_penalty_max_seconds,
            },
        );

        for from_dir in platform::expand(&from_raw) {
            for to_dir in platform::expand(&to_raw) {
                edges.push(GraphEdge {
                    from_stop_id: from_dir.clone(),
                    to_stop_id: to_dir,
                    route_id: TRANSFER_ROUTE_ID.to_owned(),
                    travel_time_seconds: 0,
                    transfer_penalty_seconds: penalty,
                    is_transfer: true,
                });
            }
        }
    }

    edges
}

fn build_platform_transfer_edges(
    sources: &HashMap<String, HashSet<char>>,
    config: &GraphCompilerConfig,
) -> Vec<GraphEdge> {
    let mut edges = Vec::new();

    for (base_stop_id, directions) in sources {
        for &from_dir in &DIRECTIONS {
            if !directions.contains(&from_dir) {
                continue;
            }
            for &to_dir in &DIRECTIONS {
                if to_dir == from_dir || !directions.contains(&to_dir) {
                    continue;
                }
                edges.push(GraphEdge {
                    from_stop_id: format!("{base_stop_id}{from_dir}"),
                    to_stop_id: format!("{base_stop_id}{to_dir}"),
                    route_id: PLATFORM_TRANSFER_ROUTE_ID.to_owned(),
                    travel_time_seconds: 0,
                    transfer_penalty_seconds: config.platform_transfer_penalty_seconds,
                    is_transfer: true,
                });
            }
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    use gtfs::data_model::agency::Agency;
    use gtfs::data_model::routes::{ContinuousDropOff, ContinuousPickup, Route, RouteType};
    use gtfs::data_model::stops::{LocationType, Stop, WheechairBoarding};
    use gtfs::data_model::transfers::TransfersRow;
    use gtfs::data_model::trips::{BikesAllowed, Trip, WheelchairAccessibility};
    use gtfs::database::{
        InMemoryAgencyTable, InMemoryRouteTable, InMemoryStopTable, InMemoryStopTimeTable,
        InMemoryTransferTable, InMemoryTripTable,
    };
    use utility::id::Id;

    fn stop(id: &str) -> Stop {
        Stop {
            id: Id::new(id.to_owned()),
            code: None,
            name: Some(id.to_owned()),
            tts_name: None,
            description: None,
            latitude: None,
            longitude: None,
            zone_id: None,
            url: None,
            location_type: Some(LocationType::StopOrPlatform),
            parent_station: None,
            timezone: None,
            wheelchair_boarding: WheechairBoarding::NoInformationOrInherit,
            level_id: None,
            platform_code: None,
        }
    }

    fn route(id: &str) -> Route {
        Route {
            id: Id::new(id.to_owned()),
            agency_id: None,
            short_name: Some(id.to_owned()),
            long_name: None,
            description: None,
            kind: RouteType::SubwayOrMetro,
            url: None,
            color: None,
            text_color: None,
            sort_order: None,
            continuous_pickup: ContinuousPickup::default(),
            continuous_drop_off: ContinuousDropOff::default(),
            network_id: None,
        }
    }

    fn trip(id: &str, route_id: &str) -> Trip {
        Trip {
            id: Id::new(id.to_owned()),
            route_id: Id::new(route_id.to_owned()),
            service_id: "weekday".to_owned(),
            headsign: None,
            short_name: None,
            direction: None,
            block_id: None,
            shape_id: None,
            wheelchair_accessible: WheelchairAccessibility::default(),
            bikes_allowed: BikesAllowed::default(),
        }
    }

    fn stop_time(
        trip_id: &str,
        sequence: u32,
        stop_id: &str,
        arrival: &str,
        departure: &str,
    ) -> StopTime {
        StopTime {
            trip_id: Id::new(trip_id.to_owned()),
            arrival_time: Some(parse_hms(arrival)),
            departure_time: Some(parse_hms(departure)),
            stop_id: Some(Id::new(stop_id.to_owned())),
            location_group_id: None,
            location_id: None,
            stop_sequence: sequence,
            stop_headsign: None,
            start_pickup_drop_off_window: None,
            end_pickup_drop_off_window: None,
            pickup_type: Default::default(),
            drop_off_type: Default::default(),
            continuous_pickup: None,
            continuous_drop_off: None,
            shape_distance_traveled: None,
            pickup_booking_rule_id: None,
            drop_off_booking_rule_id: None,
        }
    }

    fn parse_hms(s: &str) -> Duration {
        let parts: Vec<i64> = s.split(':').map(|p| p.parse().unwrap()).collect();
        Duration::hours(parts[0]) + Duration::minutes(parts[1]) + Duration::seconds(parts[2])
    }

    fn minimal_schedule() -> GtfsDatabase {
        GtfsDatabase {
            agency: Box::new(InMemoryAgencyTable::new()),
            stops: Box::new(InMemoryStopTable::from_rows(vec![
                stop("127N"),
                stop("127S"),
                stop("132N"),
            ])),
            routes: Box::new(InMemoryRouteTable::from_rows(vec![route("A")])),
            trips: Box::new(InMemoryTripTable::from_rows(vec![trip("A_1", "A")])),
            stop_times: Box::new(InMemoryStopTimeTable::from_rows(vec![
                stop_time("A_1", 0, "127N", "08:00:00", "08:00:00"),
                stop_time("A_1", 1, "132N", "08:05:00", "08:05:00"),
            ])),
            transfers: Box::new(InMemoryTransferTable::new()),
        }
    }

    #[test]
    fn consecutive_stop_edges_use_the_scheduled_travel_time() {
        let schedule = minimal_schedule();
        let edges = build_edges(&schedule, &GraphCompilerConfig::default());
        let leg = edges
            .iter()
            .find(|e| !e.is_transfer)
            .expect("one scheduled leg");
        assert_eq!(leg.from_stop_id, "127N");
        assert_eq!(leg.to_stop_id, "132N");
        assert_eq!(leg.route_id, "A");
        assert_eq!(leg.travel_time_seconds, 300);
    }

    #[test]
    fn overnight_times_parse_past_midnight_without_going_negative() {
        let mut schedule = minimal_schedule();
        schedule.stop_times = Box::new(InMemoryStopTimeTable::from_rows(vec![
            stop_time("A_1", 0, "127N", "23:59:30", "23:59:30"),
            stop_time("A_1", 1, "132N", "25:00:30", "25:00:30"),
        ]));
        let edges = build_edges(&schedule, &GraphCompilerConfig::default());
        let leg = edges.iter().find(|e| !e.is_transfer).unwrap();
        assert_eq!(leg.travel_time_seconds, 3660);
    }

    #[test]
    fn missing_times_fall_back_to_the_default_edge_seconds() {
        let mut schedule = minimal_schedule();
        let mut st = stop_time("A_1", 1, "132N", "08:05:00", "08:05:00");
        st.arrival_time = None;
        schedule.stop_times = Box::new(InMemoryStopTimeTable::from_rows(vec![
            stop_time("A_1", 0, "127N", "08:00:00", "08:00:00"),
            st,
        ]));
        let edges = build_edges(&schedule, &GraphCompilerConfig::default());
        let leg = edges.iter().find(|e| !e.is_transfer).unwrap();
        assert_eq!(leg.travel_time_seconds, 120);
    }

    #[test]
    fn duplicate_candidates_are_collapsed_by_floored_average() {
        let mut schedule = minimal_schedule();
        schedule.trips = Box::new(InMemoryTripTable::from_rows(vec![
            trip("A_1", "A"),
            trip("A_2", "A"),
        ]));
        schedule.stop_times = Box::new(InMemoryStopTimeTable::from_rows(vec![
            stop_time("A_1", 0, "127N", "08:00:00", "08:00:00"),
            stop_time("A_1", 1, "132N", "08:05:00", "08:05:00"),
            stop_time("A_2", 0, "127N", "09:00:00", "09:00:00"),
            stop_time("A_2", 1, "132N", "09:04:31", "09:04:31"),
        ]));
        let edges = build_edges(&schedule, &GraphCompilerConfig::default());
        let scheduled: Vec<_> = edges.iter().filter(|e| !e.is_transfer).collect();
        assert_eq!(scheduled.len(), 1, "duplicate trip legs collapse to one edge");
        // (300 + 271) / 2 = 285.5, floored to 285.
        assert_eq!(scheduled[0].travel_time_seconds, 285);
    }

    #[test]
    fn platform_transfers_only_connect_directions_with_outgoing_service() {
        let schedule = minimal_schedule();
        let edges = build_edges(&schedule, &GraphCompilerConfig::default());
        let platform_transfers: Vec<_> = edges
            .iter()
            .filter(|e| e.route_id == PLATFORM_TRANSFER_ROUTE_ID)
            .collect();
        // Only "127N" has outgoing service; "127S" never appears as a source,
        // so no platform transfer is synthesized for station "127".
        assert!(platform_transfers.is_empty());
    }

    #[test]
    fn platform_transfers_connect_sibling_platforms_that_both_have_service() {
        let mut schedule = minimal_schedule();
        schedule.trips = Box::new(InMemoryTripTable::from_rows(vec![
            trip("A_1", "A"),
            trip("A_2", "A"),
        ]));
        schedule.stop_times = Box::new(InMemoryStopTimeTable::from_rows(vec![
            stop_time("A_1", 0, "127N", "08:00:00", "08:00:00"),
            stop_time("A_1", 1, "132N", "08:05:00", "08:05:00"),
            stop_time("A_2", 0, "127S", "08:00:00", "08:00:00"),
            stop_time("A_2", 1, "132N", "08:05:00", "08:05:00"),
        ]));
        let edges = build_edges(&schedule, &GraphCompilerConfig::default());
        let platform_transfers: Vec<_> = edges
            .iter()
            .filter(|e| e.route_id == PLATFORM_TRANSFER_ROUTE_ID)
            .collect();
        assert_eq!(platform_transfers.len(), 2, "127N<->127S both directions");
        assert!(platform_transfers
            .iter()
            .any(|e| e.from_stop_id == "127N" && e.to_stop_id == "127S"));
        assert!(platform_transfers
            .iter()
            .any(|e| e.from_stop_id == "127S" && e.to_stop_id == "127N"));
    }

    #[test]
    fn declared_transfers_expand_across_all_directional_platform_pairs() {
        let mut schedule = minimal_schedule();
        schedule.transfers = Box::new(InMemoryTransferTable::from_rows(vec![TransfersRow {
            from_stop_id: Some(Id::new("127".to_owned())),
            to_stop_id: Some(Id::new("132".to_owned())),
            from_route_id: None,
            to_route_id: None,
            from_trip_id: None,
            to_trip_id: None,
            kind: TransferType::RecommendedTransferPoint,
            minimum_transfer_time: None,
        }]));
        let edges = build_edges(&schedule, &GraphCompilerConfig::default());
        let declared: Vec<_> = edges
            .iter()
            .filter(|e| e.route_id == TRANSFER_ROUTE_ID)
            .collect();
        assert_eq!(declared.len(), 16, "4 directions x 4 directions");
        assert!(declared.iter().all(|e| e.transfer_penalty_seconds == 180));
    }

    #[test]
    fn not_possible_transfers_are_skipped() {
        let mut schedule = minimal_schedule();
        schedule.transfers = Box::new(InMemoryTransferTable::from_rows(vec![TransfersRow {
            from_stop_id: Some(Id::new("127".to_owned())),
            to_stop_id: Some(Id::new("132".to_owned())),
            from_route_id: None,
            to_route_id: None,
            from_trip_id: None,
            to_trip_id: None,
            kind: TransferType::NotPossible,
            minimum_transfer_time: None,
        }]));
        let edges = build_edges(&schedule, &GraphCompilerConfig::default());
        assert!(edges.iter().all(|e| e.route_id != TRANSFER_ROUTE_ID));
    }

    #[test]
    fn compiling_twice_back_to_back_yields_an_identical_edge_count() {
        let schedule = minimal_schedule();
        let store = StaticStore::new(schedule);
        let config = GraphCompilerConfig::default();
        let first = compile_and_commit(&store, &config).unwrap();
        let second = compile_and_commit(&store, &config).unwrap();
        assert_eq!(first, second);
    }
}
