//! Dual-cadence trigger policy, free of clocks and threads.
//!
//! Two independent periodic triggers drive a display: a cheap local re-render that
//! keeps relative "N min" labels current from the persisted snapshot, and a network
//! refresh that is the only path to the prediction source. Callers feed in `Instant`s
//! from whatever loop granularity they run at; triggers fire on the first poll at or
//! after their period elapses, so timing is inexact by design.

use std::time::{Duration, Instant};

use crate::core::config::RefreshConfig;

/// Which action is due for a display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Re-compose the render plan from the persisted snapshot.
    LocalRender,
    /// Fetch fresh predictions, rebuild the snapshot, then re-compose.
    NetworkFetch,
}

/// Per-display trigger bookkeeping.
#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    local_period: Duration,
    network_period: Duration,
    last_render: Option<Instant>,
    last_fetch: Option<Instant>,
}

impl RefreshPolicy {
    #[must_use]
    pub fn new(refresh: &RefreshConfig) -> Self {
        Self {
            local_period: Duration::from_secs(refresh.local_render_secs),
            network_period: Duration::from_secs(refresh.network_fetch_secs),
            last_render: None,
            last_fetch: None,
        }
    }

    /// Next trigger due at `now`, if any. A network fetch subsumes the render, so
    /// when both are due the fetch wins. The first poll always fetches, covering
    /// the initial population of a newly registered display.
    pub fn due(&mut self, now: Instant) -> Option<Trigger> {
        if self.elapsed(self.last_fetch, self.network_period, now) {
            self.last_fetch = Some(now);
            self.last_render = Some(now);
            return Some(Trigger::NetworkFetch);
        }
        if self.elapsed(self.last_render, self.local_period, now) {
            self.last_render = Some(now);
            return Some(Trigger::LocalRender);
        }
        None
    }

    /// Record an out-of-band fetch (manual refresh) so the periodic timer restarts.
    pub fn note_manual_fetch(&mut self, now: Instant) {
        self.last_fetch = Some(now);
        self.last_render = Some(now);
    }

    #[allow(clippy::unused_self)]
    fn elapsed(&self, last: Option<Instant>, period: Duration, now: Instant) -> bool {
        last.is_none_or(|t| now.duration_since(t) >= period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RefreshPolicy {
        RefreshPolicy::new(&RefreshConfig {
            local_render_secs: 60,
            network_fetch_secs: 300,
            ..RefreshConfig::default()
        })
    }

    #[test]
    fn first_poll_fetches() {
        let mut p = policy();
        assert_eq!(p.due(Instant::now()), Some(Trigger::NetworkFetch));
    }

    #[test]
    fn render_fires_between_fetches() {
        let mut p = policy();
        let t0 = Instant::now();
        assert_eq!(p.due(t0), Some(Trigger::NetworkFetch));

        assert_eq!(p.due(t0 + Duration::from_secs(30)), None);
        assert_eq!(
            p.due(t0 + Duration::from_secs(60)),
            Some(Trigger::LocalRender)
        );
        assert_eq!(
            p.due(t0 + Duration::from_secs(121)),
            Some(Trigger::LocalRender)
        );
    }

    #[test]
    fn fetch_wins_when_both_due() {
        let mut p = policy();
        let t0 = Instant::now();
        assert_eq!(p.due(t0), Some(Trigger::NetworkFetch));
        // 300s later both periods have elapsed.
        assert_eq!(
            p.due(t0 + Duration::from_secs(300)),
            Some(Trigger::NetworkFetch)
        );
        // The fetch also reset the render timer.
        assert_eq!(p.due(t0 + Duration::from_secs(330)), None);
    }

    #[test]
    fn manual_fetch_restarts_the_network_timer() {
        let mut p = policy();
        let t0 = Instant::now();
        assert_eq!(p.due(t0), Some(Trigger::NetworkFetch));

        p.note_manual_fetch(t0 + Duration::from_secs(290));
        assert_eq!(p.due(t0 + Duration::from_secs(300)), None);
        assert_eq!(
            p.due(t0 + Duration::from_secs(590)),
            Some(Trigger::NetworkFetch)
        );
    }
}
