//! ETA status classification: predicted-vs-scheduled delta to display category.

use serde::{Deserialize, Serialize};

/// Delta magnitude at which a prediction counts as late or early. Boundary inclusive.
const DEVIATION_THRESHOLD_MS: i64 = 2 * 60 * 1_000;

/// Display category for one arrival, applied at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EtaStatus {
    /// No real-time prediction; showing the scheduled time.
    Scheduled,
    /// Running at least two minutes behind schedule.
    Late,
    /// Running at least two minutes ahead of schedule.
    Early,
    /// Within two minutes of schedule.
    OnTime,
}

/// Classify a (predicted, scheduled) pair. Total and side-effect-free.
#[must_use]
pub fn classify(predicted_time_ms: i64, scheduled_time_ms: i64) -> EtaStatus {
    if predicted_time_ms <= 0 {
        return EtaStatus::Scheduled;
    }
    let delta_ms = predicted_time_ms - scheduled_time_ms;
    if delta_ms >= DEVIATION_THRESHOLD_MS {
        EtaStatus::Late
    } else if delta_ms <= -DEVIATION_THRESHOLD_MS {
        EtaStatus::Early
    } else {
        EtaStatus::OnTime
    }
}
