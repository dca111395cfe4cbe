//! Prediction fetching: the source seam and the widening look-ahead window policy.
//!
//! The network client itself is an external collaborator; this module only defines
//! the request/response shape consumed by the core and the policy for how far ahead
//! to ask.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::core::config::RefreshConfig;
use crate::core::errors::{BoardError, Result};
use crate::snapshot::model::RawArrival;

/// Seam to the transit prediction service.
///
/// Any non-success return is treated by the core as "no data this attempt"; retry
/// and backoff internals belong to the implementation behind this trait.
pub trait PredictionSource: Send + Sync {
    /// Upcoming arrivals for `stop_id` within the next `look_ahead_minutes`.
    fn arrivals(&self, stop_id: &str, look_ahead_minutes: u32) -> Result<Vec<RawArrival>>;
}

/// Successful widening fetch: the arrivals and the window that produced them.
///
/// The winning window is carried into the activity log, so telemetry shows how far
/// ahead a stop's data actually sits.
#[derive(Debug, Clone)]
pub struct FetchedArrivals {
    /// Raw arrivals from the first window that had any.
    pub arrivals: Vec<RawArrival>,
    /// Look-ahead window, in minutes, of the first non-empty response.
    pub window_minutes: u32,
}

/// Query a widening look-ahead window until the source returns data.
///
/// Starts at `initial_window_minutes` and widens by `window_step_minutes` up to
/// `max_window_minutes`, stopping at the first window with at least one arrival.
/// Widening reacts to *source-level* emptiness only; the route filter is applied
/// later by the snapshot builder. Exhausting the ceiling fails the whole attempt —
/// the caller keeps the previous snapshot and retries on its next trigger rather
/// than spinning here.
pub fn fetch_with_widening(
    source: &dyn PredictionSource,
    stop_id: &str,
    refresh: &RefreshConfig,
) -> Result<FetchedArrivals> {
    let mut window_minutes = refresh.initial_window_minutes;

    while window_minutes <= refresh.max_window_minutes {
        match source.arrivals(stop_id, window_minutes) {
            Ok(arrivals) if !arrivals.is_empty() => {
                return Ok(FetchedArrivals {
                    arrivals,
                    window_minutes,
                });
            }
            Ok(_) | Err(_) => {} // empty or failed: widen and try once more
        }
        window_minutes += refresh.window_step_minutes;
    }

    Err(BoardError::FetchFailed {
        stop_id: stop_id.to_string(),
        details: format!(
            "no arrivals in any window up to {} minutes",
            refresh.max_window_minutes
        ),
    })
}

// ──────────────────── fixture-backed source ────────────────────

/// Record shape of the arrivals fixture file.
#[derive(Debug, Clone, Deserialize)]
struct FixtureArrival {
    stop_id: String,
    route_id: String,
    short_name: String,
    #[serde(default)]
    predicted_time_ms: i64,
    scheduled_time_ms: i64,
}

/// Prediction source backed by a JSON fixture file.
///
/// Stands in for the network client in demos and one-shot CLI runs; the file is
/// re-read on every call so an external process can update it.
#[derive(Debug, Clone)]
pub struct StaticSource {
    path: PathBuf,
}

impl StaticSource {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl PredictionSource for StaticSource {
    fn arrivals(&self, stop_id: &str, look_ahead_minutes: u32) -> Result<Vec<RawArrival>> {
        let raw = fs::read_to_string(&self.path).map_err(|source| BoardError::FetchFailed {
            stop_id: stop_id.to_string(),
            details: format!("fixture {} unreadable: {source}", self.path.display()),
        })?;
        let records: Vec<FixtureArrival> = serde_json::from_str(&raw)?;

        let horizon_ms = crate::core::now_ms() + i64::from(look_ahead_minutes) * 60_000;
        Ok(records
            .into_iter()
            .filter(|r| r.stop_id == stop_id)
            .filter(|r| {
                crate::snapshot::model::effective_time_ms(r.predicted_time_ms, r.scheduled_time_ms)
                    <= horizon_ms
            })
            .map(|r| RawArrival {
                route_id: r.route_id,
                short_name: r.short_name,
                predicted_time_ms: r.predicted_time_ms,
                scheduled_time_ms: r.scheduled_time_ms,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Scripted source: returns one canned response per call, in order.
    struct ScriptedSource {
        responses: Mutex<Vec<Result<Vec<RawArrival>>>>,
        windows_seen: Mutex<Vec<u32>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<Vec<RawArrival>>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                windows_seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl PredictionSource for ScriptedSource {
        fn arrivals(&self, _stop_id: &str, look_ahead_minutes: u32) -> Result<Vec<RawArrival>> {
            self.windows_seen.lock().unwrap().push(look_ahead_minutes);
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(Vec::new())
            } else {
                responses.remove(0)
            }
        }
    }

    fn arrival() -> RawArrival {
        RawArrival {
            route_id: "r1".to_string(),
            short_name: "44".to_string(),
            predicted_time_ms: 1_000,
            scheduled_time_ms: 1_000,
        }
    }

    fn refresh() -> RefreshConfig {
        RefreshConfig::default()
    }

    #[test]
    fn first_window_with_data_wins() {
        let source = ScriptedSource::new(vec![Ok(vec![arrival()])]);
        let got = fetch_with_widening(&source, "stop", &refresh()).expect("fetch");
        assert_eq!(got.arrivals.len(), 1);
        assert_eq!(got.window_minutes, 65);
        assert_eq!(*source.windows_seen.lock().unwrap(), vec![65]);
    }

    #[test]
    fn empty_windows_widen_by_step() {
        let source = ScriptedSource::new(vec![Ok(vec![]), Ok(vec![]), Ok(vec![arrival()])]);
        let got = fetch_with_widening(&source, "stop", &refresh()).expect("fetch");
        assert_eq!(got.arrivals.len(), 1);
        // The reported window is the one that actually produced data.
        assert_eq!(got.window_minutes, 185);
        assert_eq!(*source.windows_seen.lock().unwrap(), vec![65, 125, 185]);
    }

    #[test]
    fn source_error_counts_as_empty_window() {
        let source = ScriptedSource::new(vec![
            Err(BoardError::Runtime {
                details: "transient".to_string(),
            }),
            Ok(vec![arrival()]),
        ]);
        let got = fetch_with_widening(&source, "stop", &refresh()).expect("fetch");
        assert_eq!(got.arrivals.len(), 1);
        assert_eq!(got.window_minutes, 125);
    }

    #[test]
    fn exhausted_ceiling_fails_the_attempt() {
        let source = ScriptedSource::new(vec![]);
        let err = fetch_with_widening(&source, "1_75403", &refresh()).unwrap_err();
        assert_eq!(err.code(), "SBD-2101");
        // 65, 125, ... widens until the first window beyond 1440.
        let windows = source.windows_seen.lock().unwrap();
        assert_eq!(windows.first(), Some(&65));
        assert_eq!(windows.last(), Some(&1385));
    }

    #[test]
    fn static_source_filters_by_stop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("arrivals.json");
        let soon = crate::core::now_ms() + 5 * 60_000;
        std::fs::write(
            &path,
            format!(
                r#"[
                  {{"stop_id":"a","route_id":"r1","short_name":"44","scheduled_time_ms":{soon}}},
                  {{"stop_id":"b","route_id":"r2","short_name":"8","scheduled_time_ms":{soon}}}
                ]"#
            ),
        )
        .expect("write fixture");

        let source = StaticSource::new(path);
        let got = source.arrivals("a", 65).expect("arrivals");
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].route_id, "r1");
        assert_eq!(got[0].predicted_time_ms, 0);
    }

    #[test]
    fn static_source_respects_look_ahead_window() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("arrivals.json");
        let far = crate::core::now_ms() + 300 * 60_000;
        std::fs::write(
            &path,
            format!(
                r#"[{{"stop_id":"a","route_id":"r1","short_name":"44","scheduled_time_ms":{far}}}]"#
            ),
        )
        .expect("write fixture");

        let source = StaticSource::new(path);
        assert!(source.arrivals("a", 65).expect("narrow").is_empty());
        assert_eq!(source.arrivals("a", 360).expect("wide").len(), 1);
    }
}
