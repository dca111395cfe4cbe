//! Arrival data model: raw predictions from the source and the persisted,
//! bounded per-route snapshot derived from them.
//!
//! The snapshot is saved so a display can be re-rendered periodically with fresh
//! relative times ("5 min" -> "4 min" -> "3 min") without additional network calls.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

/// Effective arrival time: predicted when available, scheduled otherwise.
///
/// A predicted time of `0` (or below) means the source had no real-time data.
#[must_use]
pub fn effective_time_ms(predicted_time_ms: i64, scheduled_time_ms: i64) -> i64 {
    if predicted_time_ms > 0 {
        predicted_time_ms
    } else {
        scheduled_time_ms
    }
}

/// One upcoming arrival as reported by the prediction source. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawArrival {
    pub route_id: String,
    pub short_name: String,
    /// Unix ms, or 0 if unavailable.
    pub predicted_time_ms: i64,
    /// Unix ms, always present.
    pub scheduled_time_ms: i64,
}

impl RawArrival {
    #[must_use]
    pub fn effective_time_ms(&self) -> i64 {
        effective_time_ms(self.predicted_time_ms, self.scheduled_time_ms)
    }
}

/// One arrival retained in the persisted snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrivalSnapshot {
    /// Unix ms, or 0 if unavailable.
    pub predicted_time_ms: i64,
    /// Unix ms, always present.
    pub scheduled_time_ms: i64,
}

impl ArrivalSnapshot {
    #[must_use]
    pub fn effective_time_ms(&self) -> i64 {
        effective_time_ms(self.predicted_time_ms, self.scheduled_time_ms)
    }
}

/// One route's retained arrivals. Non-empty by construction: groups are built only
/// from retained arrivals, so first-arrival access never fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSnapshot {
    pub route_id: String,
    pub short_name: String,
    /// At most 3, ordered by effective time ascending.
    pub arrivals: Vec<ArrivalSnapshot>,
}

impl RouteSnapshot {
    /// Effective time of this route's soonest arrival, used for route ranking.
    #[must_use]
    pub fn soonest_effective_ms(&self) -> i64 {
        self.arrivals
            .first()
            .map_or(i64::MAX, ArrivalSnapshot::effective_time_ms)
    }
}

/// Point-in-time reduction of raw predictions, persisted per display instance and
/// fully replaced (never merged) on every successful fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the fetch producing this snapshot completed, unix ms.
    pub fetched_at_ms: i64,
    /// Ordered by each route's soonest effective arrival ascending.
    pub routes: Vec<RouteSnapshot>,
}
