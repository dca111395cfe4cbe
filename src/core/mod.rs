//! Core subsystem: configuration and error types shared by every module.

pub mod config;
pub mod errors;
pub mod instance;

use chrono::Utc;

/// Current wall-clock time as unix epoch milliseconds.
///
/// All arrival timestamps in the data model use this representation; `0` is the
/// "unavailable" sentinel for predicted times.
#[must_use]
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
