//! Turns one decoded transit-realtime feed message into the flat
//! [`RawPrediction`]s the poller groups and writes to the cache.
//!
//! Isolated from [`crate::FeedPoller`] so the one place that touches the
//! generated protobuf types stays small.

use prost::Message;

/// One emitted prediction before it has been grouped by
/// `(base_stop_id, direction)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    pub stop_id: String,
    pub route_id: String,
    pub predicted_epoch_seconds: i64,
}

#[derive(Debug)]
pub enum DecodeError {
    Protobuf(prost::DecodeError),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Protobuf(e) => write!(f, "failed to decode feed message: {e}"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<prost::DecodeError> for DecodeError {
    fn from(e: prost::DecodeError) -> Self {
        Self::Protobuf(e)
    }
}

/// Decodes one binary transit-realtime message and flattens every
/// trip_update's stop_time_updates into [`RawPrediction`]s. Only trip
/// updates are consumed; vehicle positions and alerts are ignored.
pub fn decode_feed(bytes: &[u8]) -> Result<Vec<RawPrediction>, DecodeError> {
    let message = gtfs_realtime::FeedMessage::decode(bytes)?;

    let mut predictions = Vec::new();
    for entity in message.entity {
        let Some(trip_update) = entity.trip_update else {
            continue;
        };
        let route_id = trip_update.trip.route_id.unwrap_or_default();

        for stop_time_update in trip_update.stop_time_update {
            let Some(stop_id) = stop_time_update.stop_id else {
                continue;
            };
            let predicted_epoch_seconds = stop_time_update
                .arrival
                .as_ref()
                .and_then(|event| event.time)
                .or_else(|| stop_time_update.departure.as_ref().and_then(|event| event.time));

            let Some(predicted_epoch_seconds) = predicted_epoch_seconds else {
                continue;
            };

            predictions.push(RawPrediction {
                stop_id,
                route_id: route_id.clone(),
                predicted_epoch_seconds,
            });
        }
    }

    Ok(predictions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtfs_realtime::trip_update::{StopTimeEvent, StopTimeUpdate};
    use gtfs_realtime::{FeedEntity, FeedHeader, FeedMessage, TripDescriptor, TripUpdate};

    fn encode(message: &FeedMessage) -> Vec<u8> {
        let mut buf = Vec::new();
        message.encode(&mut buf).unwrap();
        buf
    }

    #[test]
    fn flattens_stop_time_updates_preferring_arrival_over_departure() {
        let message = FeedMessage {
            header: FeedHeader {
                gtfs_realtime_version: "2.0".to_owned(),
                incrementality: None,
                timestamp: None,
            },
            entity: vec![FeedEntity {
                id: "1".to_owned(),
                is_deleted: None,
                trip_update: Some(TripUpdate {
                    trip: TripDescriptor {
                        trip_id: Some("A_1".to_owned()),
                        route_id: Some("A".to_owned()),
                        ..Default::default()
                    },
                    vehicle: None,
                    stop_time_update: vec![StopTimeUpdate {
                        stop_sequence: None,
                        stop_id: Some("127N".to_owned()),
                        arrival: Some(StopTimeEvent {
                            delay: None,
                            time: Some(1_700_000_090),
                            uncertainty: None,
                        }),
                        departure: Some(StopTimeEvent {
                            delay: None,
                            time: Some(1_700_000_120),
                            uncertainty: None,
                        }),
                        schedule_relationship: None,
                    }],
                    timestamp: None,
                    delay: None,
                }),
                vehicle: None,
                alert: None,
            }],
        };

        let predictions = decode_feed(&encode(&message)).unwrap();
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].stop_id, "127N");
        assert_eq!(predictions[0].route_id, "A");
        assert_eq!(predictions[0].predicted_epoch_seconds, 1_700_000_090);
    }

    #[test]
    fn falls_back_to_departure_when_arrival_is_absent() {
        let message = FeedMessage {
            header: FeedHeader {
                gtfs_realtime_version: "2.0".to_owned(),
                incrementality: None,
                timestamp: None,
            },
            entity: vec![FeedEntity {
                id: "1".to_owned(),
                is_deleted: None,
                trip_update: Some(TripUpdate {
                    trip: TripDescriptor {
                        trip_id: Some("A_1".to_owned()),
                        route_id: Some("A".to_owned()),
                        ..Default::default()
                    },
                    vehicle: None,
                    stop_time_update: vec![StopTimeUpdate {
                        stop_sequence: None,
                        stop_id: Some("127N".to_owned()),
                        arrival: None,
                        departure: Some(StopTimeEvent {
                            delay: None,
                            time: Some(1_700_000_120),
                            uncertainty: None,
                        }),
                        schedule_relationship: None,
                    }],
                    timestamp: None,
                    delay: None,
                }),
                vehicle: None,
                alert: None,
            }],
        };

        let predictions = decode_feed(&encode(&message)).unwrap();
        assert_eq!(predictions[0].predicted_epoch_seconds, 1_700_000_120);
    }

    #[test]
    fn drops_stop_time_updates_with_neither_arrival_nor_departure() {
        let message = FeedMessage {
            header: FeedHeader {
                gtfs_realtime_version: "2.0".to_owned(),
                incrementality: None,
                timestamp: None,
            },
            entity: vec![FeedEntity {
                id: "1".to_owned(),
                is_deleted: None,
                trip_update: Some(TripUpdate {
                    trip: TripDescriptor {
                        trip_id: Some("A_1".to_owned()),
                        route_id: Some("A".to_owned()),
                        ..Default::default()
                    },
                    vehicle: None,
                    stop_time_update: vec![StopTimeUpdate {
                        stop_sequence: None,
                        stop_id: Some("127N".to_owned()),
                        arrival: None,
                        departure: None,
                        schedule_relationship: None,
                    }],
                    timestamp: None,
                    delay: None,
                }),
                vehicle: None,
                alert: None,
            }],
        };

        assert!(decode_feed(&encode(&message)).unwrap().is_empty());
    }
}
