//! Render-time staleness filtering.
//!
//! Applied only when rendering, never at build/persist time, so a snapshot fetched
//! minutes ago can still drop old entries without re-fetching.

/// How far in the past an arrival may sit before it is dropped from display.
pub const STALENESS_GRACE_MS: i64 = 2 * 60 * 1_000;

/// Whether an arrival's effective time is too old to display.
///
/// `true` iff the arrival is more than two minutes in the past; exactly two minutes
/// is still shown.
#[must_use]
pub fn is_stale(effective_time_ms: i64, now_ms: i64) -> bool {
    effective_time_ms < now_ms - STALENESS_GRACE_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 10_000_000;

    #[test]
    fn future_arrival_is_not_stale() {
        assert!(!is_stale(NOW + 60_000, NOW));
    }

    #[test]
    fn slightly_past_arrival_is_not_stale() {
        assert!(!is_stale(NOW - 60_000, NOW));
    }

    #[test]
    fn boundary_exactly_two_minutes_is_not_stale() {
        assert!(!is_stale(NOW - 120_000, NOW));
    }

    #[test]
    fn one_ms_past_boundary_is_stale() {
        assert!(is_stale(NOW - 120_001, NOW));
    }
}
