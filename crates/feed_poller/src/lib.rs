//! Keeps the [`arrivals_cache::ArrivalsCache`] fresh by polling a set of
//! transit-realtime feeds on a fixed cadence.
//!
//! Each cycle fetches every configured feed concurrently, decodes it
//! ([`decode`]), derives per-platform predictions, and writes one batch per
//! `(base_stop_id, direction)` to the cache. A single feed's fetch or decode
//! failure is logged and that feed is skipped; it never aborts the cycle.

pub mod decode;

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use arrivals_cache::{ArrivalsCache, Prediction};
use decode::{decode_feed, DecodeError, RawPrediction};
use static_store::platform;

/// One configured realtime feed.
#[derive(Debug, Clone)]
pub struct FeedSource {
    pub url: String,
    /// Header name/value pair attached to the request when the feed
    /// requires an API key (e.g. `("x-api-key", "...")`).
    pub api_key_header: Option<(String, String)>,
}

impl FeedSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key_header: None,
        }
    }

    pub fn with_api_key(mut self, header_name: impl Into<String>, key: impl Into<String>) -> Self {
        self.api_key_header = Some((header_name.into(), key.into()));
        self
    }
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub feeds: Vec<FeedSource>,
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    /// How long to wait before retrying after a cycle fails outright
    /// (as opposed to an individual feed failing, which is absorbed).
    pub backoff_interval: Duration,
    /// Predictions outside `[0, max_eta_seconds]` are dropped (I5).
    pub max_eta_seconds: i64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            feeds: Vec::new(),
            poll_interval: Duration::from_secs(45),
            fetch_timeout: Duration::from_secs(10),
            backoff_interval: Duration::from_secs(30),
            max_eta_seconds: 3600,
        }
    }
}

#[derive(Debug)]
pub enum FeedError {
    Fetch(reqwest::Error),
    Decode(DecodeError),
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "fetch failed: {e}"),
            Self::Decode(e) => write!(f, "decode failed: {e}"),
        }
    }
}

impl std::error::Error for FeedError {}

/// Derives a trip's rider-facing headsign. The spec treats this as an
/// opaque, pluggable concern; absent a static-schedule join this follows
/// the reference implementation's lead and formats it from the route alone.
fn derive_headsign(route_id: &str) -> String {
    format!("{route_id} Train")
}

/// Turns one feed's flattened [`RawPrediction`]s into [`Prediction`]s grouped
/// by `(base_stop_id, direction)`, applying the direction/eta filtering from
/// 4.3 steps 4-5. Kept free of any I/O so it can be unit tested directly.
fn derive_predictions(
    raw: Vec<RawPrediction>,
    cycle_start_epoch_seconds: i64,
    max_eta_seconds: i64,
) -> HashMap<(String, char), Vec<Prediction>> {
    let mut grouped: HashMap<(String, char), Vec<Prediction>> = HashMap::new();

    for prediction in raw {
        let Some(direction) = platform::direction_suffix(&prediction.stop_id) else {
            continue;
        };
        let base_stop_id = platform::base_stop_id(&prediction.stop_id).to_owned();

        let eta_seconds = prediction.predicted_epoch_seconds - cycle_start_epoch_seconds;
        if !(0..=max_eta_seconds).contains(&eta_seconds) {
            continue;
        }

        grouped
            .entry((base_stop_id, direction))
            .or_default()
            .push(Prediction {
                headsign: derive_headsign(&prediction.route_id),
                route_id: prediction.route_id,
                eta_seconds,
            });
    }

    grouped
}

/// Fetches and decodes a single feed. Logged and skipped by the caller on
/// failure; never panics.
async fn fetch_one(http: &Client, feed: &FeedSource) -> Result<Vec<RawPrediction>, FeedError> {
    let mut request = http.get(&feed.url);
    if let Some((name, value)) = &feed.api_key_header {
        request = request.header(name, value);
    }
    let response = request.send().await.map_err(FeedError::Fetch)?;
    let response = response.error_for_status().map_err(FeedError::Fetch)?;
    let bytes = response.bytes().await.map_err(FeedError::Fetch)?;
    decode_feed(&bytes).map_err(FeedError::Decode)
}

/// Drives the poll loop against a shared [`ArrivalsCache`].
pub struct FeedPoller {
    http: Client,
    config: PollerConfig,
    cache: Arc<ArrivalsCache>,
}

impl FeedPoller {
    pub fn new(config: PollerConfig, cache: Arc<ArrivalsCache>) -> Self {
        let http = Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .expect("failed to build feed poller http client");
        Self { http, config, cache }
    }

    /// Runs forever until `shutdown` is cancelled, sleeping `poll_interval`
    /// between cycles (or `backoff_interval` after a fatal cycle failure).
    /// If a cycle overruns its interval, the next one starts immediately.
    pub async fn run(&self, shutdown: CancellationToken) {
        loop {
            let sleep_for = match self.run_cycle_guarded().await {
                Ok(groups) => {
                    log::debug!("poll cycle wrote {groups} prediction groups");
                    self.config.poll_interval
                }
                Err(panic_payload) => {
                    log::error!("poll cycle panicked: {panic_payload}; backing off");
                    self.config.backoff_interval
                }
            };

            tokio::select! {
                _ = shutdown.cancelled() => {
                    log::info!("feed poller shutting down");
                    return;
                }
                _ = tokio::time::sleep(sleep_for) => {}
            }
        }
    }

    /// [`run_cycle`](Self::run_cycle) wrapped so that a bug in cycle
    /// bookkeeping degrades to a backoff instead of taking the whole poller
    /// down, matching the reference collector's catch-and-resume behavior.
    async fn run_cycle_guarded(&self) -> Result<usize, String> {
        AssertUnwindSafe(self.run_cycle())
            .catch_unwind()
            .await
            .map_err(|payload| {
                payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_owned())
            })
    }

    /// Runs one poll cycle: fetches every configured feed concurrently,
    /// decodes each, derives predictions and writes them to the cache.
    /// Cancelling the future this returns (as `run` does via `select!`)
    /// aborts every still-in-flight fetch.
    pub async fn run_cycle(&self) -> usize {
        let t0 = chrono::Utc::now().timestamp();

        let fetches = self
            .config
            .feeds
            .iter()
            .map(|feed| async move {
                match fetch_one(&self.http, feed).await {
                    Ok(raw) => raw,
                    Err(err) => {
                        log::warn!("feed {} skipped this cycle: {err}", feed.url);
                        Vec::new()
                    }
                }
            });
        let results = futures::future::join_all(fetches).await;

        let raw: Vec<RawPrediction> = results.into_iter().flatten().collect();
        let grouped = derive_predictions(raw, t0, self.config.max_eta_seconds);

        let group_count = grouped.len();
        for ((base_stop_id, direction), predictions) in grouped {
            self.cache.put(&base_stop_id, direction, predictions, t0);
        }
        self.cache.set_feed_update(t0);

        group_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(stop_id: &str, route_id: &str, predicted_epoch_seconds: i64) -> RawPrediction {
        RawPrediction {
            stop_id: stop_id.to_owned(),
            route_id: route_id.to_owned(),
            predicted_epoch_seconds,
        }
    }

    #[test]
    fn drops_updates_without_a_direction_suffix() {
        let grouped = derive_predictions(vec![raw("127", "A", 1_090)], 1_000, 3600);
        assert!(grouped.is_empty());
    }

    #[test]
    fn keeps_eta_zero_and_drops_negative_or_too_far_ahead() {
        let grouped = derive_predictions(
            vec![
                raw("127N", "A", 1_000),  // eta 0, kept
                raw("127N", "A", 999),    // eta -1, dropped
                raw("127N", "A", 1_000 + 3601), // eta 3601, dropped
            ],
            1_000,
            3600,
        );
        let predictions = &grouped[&("127".to_owned(), 'N')];
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].eta_seconds, 0);
    }

    #[test]
    fn groups_by_base_stop_and_direction() {
        let grouped = derive_predictions(
            vec![raw("127N", "A", 1_090), raw("127S", "A", 1_120)],
            1_000,
            3600,
        );
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&("127".to_owned(), 'N')][0].eta_seconds, 90);
        assert_eq!(grouped[&("127".to_owned(), 'S')][0].eta_seconds, 120);
    }

    #[test]
    fn headsign_is_deterministic_from_the_route() {
        let grouped = derive_predictions(vec![raw("127N", "A", 1_090)], 1_000, 3600);
        assert_eq!(grouped[&("127".to_owned(), 'N')][0].headsign, "A Train");
    }

    #[tokio::test]
    async fn a_cycle_with_no_feeds_still_marks_the_feed_as_updated() {
        let cache = Arc::new(ArrivalsCache::default());
        let poller = FeedPoller::new(PollerConfig::default(), Arc::clone(&cache));
        let groups = poller.run_cycle().await;
        assert_eq!(groups, 0);
        assert!(cache.get_feed_age().is_some());
    }
}
