//! Render plan composition: snapshot + viewport + wall clock -> slot assignments.
//!
//! The plan is the produced external interface: a structured set of slot
//! assignments (text, visibility, status category) the host toolkit binds to its
//! views. Composition is pure; all failure modes upstream collapse to "config
//! absent" or "snapshot absent" here.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use crate::core::instance::{DisplayConfig, Viewport};
use crate::snapshot::eta::{EtaStatus, classify};
use crate::snapshot::model::Snapshot;
use crate::snapshot::staleness::is_stale;

use crate::render::viewport::{MAX_ETA_SLOTS, MAX_ROUTE_ROWS, SlotVisibility};

/// Overall board state, distinguishing the neutral unconfigured state from the
/// "configured but nothing fetched yet" and normal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardState {
    NotConfigured,
    /// Config present, no snapshot persisted yet.
    Loading,
    /// Snapshot present but its routes are empty (source had nothing to show).
    NoArrivals,
    Active,
}

/// One ETA slot assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EtaSlot {
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EtaStatus>,
}

impl EtaSlot {
    fn hidden() -> Self {
        Self::default()
    }

    fn shown(label: String, status: EtaStatus) -> Self {
        Self {
            visible: true,
            label: Some(label),
            status: Some(status),
        }
    }
}

/// One route row assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RouteRow {
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub etas: [EtaSlot; MAX_ETA_SLOTS],
}

/// Complete slot assignment for one render pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderPlan {
    pub state: BoardState,
    pub title: String,
    pub rows: [RouteRow; MAX_ROUTE_ROWS],
    pub footer_visible: bool,
    pub branding_visible: bool,
    pub compact_refresh_visible: bool,
    /// "Updated N min ago" footer text; absent until a snapshot exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl RenderPlan {
    fn empty(state: BoardState, title: String, vis: SlotVisibility) -> Self {
        Self {
            state,
            title,
            rows: Default::default(),
            footer_visible: vis.footer,
            branding_visible: vis.branding,
            compact_refresh_visible: vis.compact_refresh,
            last_updated: None,
        }
    }
}

/// Relative label for an arrival: "Now" within the current minute, "N min" otherwise.
///
/// Minutes truncate toward zero, so an arrival just past now still reads "Now" and a
/// not-yet-stale arrival a minute back reads "-1 min", matching the display contract.
#[must_use]
pub fn format_minutes_away(effective_time_ms: i64, now_ms: i64) -> String {
    let minutes = (effective_time_ms - now_ms) / 60_000;
    if minutes == 0 {
        "Now".to_string()
    } else {
        format!("{minutes} min")
    }
}

/// Relative freshness label for the footer.
#[must_use]
pub fn format_last_updated(fetched_at_ms: i64, now_ms: i64) -> String {
    let minutes = (now_ms - fetched_at_ms).max(0) / 60_000;
    if minutes == 0 {
        "Updated just now".to_string()
    } else {
        format!("Updated {minutes} min ago")
    }
}

/// Compose a render plan from whatever state is available.
///
/// Row/slot visibility is the logical AND of the viewport policy and the data: a row
/// shows only when a route exists at that rank, a slot only when a non-stale arrival
/// survives at that rank. A route whose arrivals all went stale shows an "N/A"
/// placeholder (status `Scheduled`) in its first slot.
#[must_use]
pub fn compose(
    config: Option<&DisplayConfig>,
    snapshot: Option<&Snapshot>,
    viewport: Viewport,
    now_ms: i64,
) -> RenderPlan {
    let vis = SlotVisibility::for_viewport(viewport);

    let Some(config) = config else {
        return RenderPlan::empty(BoardState::NotConfigured, "Not configured".to_string(), vis);
    };

    let Some(snapshot) = snapshot else {
        return RenderPlan::empty(BoardState::Loading, config.display_name.clone(), vis);
    };

    let state = if snapshot.routes.is_empty() {
        BoardState::NoArrivals
    } else {
        BoardState::Active
    };

    let mut rows: [RouteRow; MAX_ROUTE_ROWS] = Default::default();
    for (rank, row) in rows.iter_mut().enumerate() {
        let Some(route) = snapshot.routes.get(rank) else {
            continue; // no route at this rank; row stays hidden
        };
        if !vis.route_rows[rank] {
            continue;
        }

        row.visible = true;
        row.name = Some(route.short_name.clone());

        let surviving: Vec<_> = route
            .arrivals
            .iter()
            .filter(|a| !is_stale(a.effective_time_ms(), now_ms))
            .collect();

        if surviving.is_empty() {
            // Placeholder in slot 1; the rest stay hidden regardless of policy.
            row.etas[0] = EtaSlot::shown("N/A".to_string(), EtaStatus::Scheduled);
            continue;
        }

        for (slot, eta) in row.etas.iter_mut().enumerate() {
            let Some(arrival) = surviving.get(slot) else {
                continue;
            };
            if !vis.eta_cols[slot] {
                continue;
            }
            *eta = EtaSlot::shown(
                format_minutes_away(arrival.effective_time_ms(), now_ms),
                classify(arrival.predicted_time_ms, arrival.scheduled_time_ms),
            );
        }
    }

    RenderPlan {
        state,
        title: config.display_name.clone(),
        rows,
        footer_visible: vis.footer,
        branding_visible: vis.branding,
        compact_refresh_visible: vis.compact_refresh,
        last_updated: Some(format_last_updated(snapshot.fetched_at_ms, now_ms)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instance::RouteFilter;
    use crate::snapshot::model::{ArrivalSnapshot, RouteSnapshot};

    const NOW: i64 = 1_700_000_000_000;

    fn config() -> DisplayConfig {
        DisplayConfig {
            stop_id: "1_75403".to_string(),
            display_name: "Pike St".to_string(),
            route_filter: RouteFilter::AllRoutes,
            viewport: Viewport::default(),
        }
    }

    fn route(short_name: &str, offsets_min: &[i64]) -> RouteSnapshot {
        RouteSnapshot {
            route_id: format!("id_{short_name}"),
            short_name: short_name.to_string(),
            arrivals: offsets_min
                .iter()
                .map(|m| ArrivalSnapshot {
                    predicted_time_ms: NOW + m * 60_000,
                    scheduled_time_ms: NOW + m * 60_000,
                })
                .collect(),
        }
    }

    #[test]
    fn absent_config_renders_neutral_state() {
        let plan = compose(None, None, Viewport::default(), NOW);
        assert_eq!(plan.state, BoardState::NotConfigured);
        assert_eq!(plan.title, "Not configured");
        assert!(plan.rows.iter().all(|r| !r.visible));
    }

    #[test]
    fn absent_snapshot_renders_loading_state() {
        let cfg = config();
        let plan = compose(Some(&cfg), None, Viewport::default(), NOW);
        assert_eq!(plan.state, BoardState::Loading);
        assert_eq!(plan.title, "Pike St");
        assert!(plan.last_updated.is_none());
    }

    #[test]
    fn empty_routes_render_no_arrivals_state() {
        let cfg = config();
        let snapshot = Snapshot {
            fetched_at_ms: NOW,
            routes: vec![],
        };
        let plan = compose(Some(&cfg), Some(&snapshot), Viewport::default(), NOW);
        assert_eq!(plan.state, BoardState::NoArrivals);
        assert!(plan.rows.iter().all(|r| !r.visible));
    }

    #[test]
    fn active_snapshot_fills_rows_and_slots() {
        let cfg = config();
        let snapshot = Snapshot {
            fetched_at_ms: NOW - 3 * 60_000,
            routes: vec![route("44", &[2, 9, 15]), route("8", &[5])],
        };
        let plan = compose(Some(&cfg), Some(&snapshot), Viewport::default(), NOW);

        assert_eq!(plan.state, BoardState::Active);
        assert!(plan.rows[0].visible);
        assert_eq!(plan.rows[0].name.as_deref(), Some("44"));
        assert_eq!(plan.rows[0].etas[0].label.as_deref(), Some("2 min"));
        assert_eq!(plan.rows[0].etas[2].label.as_deref(), Some("15 min"));
        assert_eq!(plan.rows[0].etas[0].status, Some(EtaStatus::OnTime));

        assert!(plan.rows[1].visible);
        assert_eq!(plan.rows[1].etas[0].label.as_deref(), Some("5 min"));
        assert!(!plan.rows[1].etas[1].visible);

        assert!(!plan.rows[2].visible);
        assert_eq!(plan.last_updated.as_deref(), Some("Updated 3 min ago"));
    }

    #[test]
    fn stale_arrivals_are_dropped_at_render_time() {
        let cfg = config();
        // First arrival 5 minutes past (stale), second 4 minutes out.
        let snapshot = Snapshot {
            fetched_at_ms: NOW,
            routes: vec![route("44", &[-5, 4])],
        };
        let plan = compose(Some(&cfg), Some(&snapshot), Viewport::default(), NOW);
        assert_eq!(plan.rows[0].etas[0].label.as_deref(), Some("4 min"));
        assert!(!plan.rows[0].etas[1].visible);
    }

    #[test]
    fn all_stale_shows_placeholder_with_scheduled_status() {
        let cfg = config();
        let snapshot = Snapshot {
            fetched_at_ms: NOW,
            routes: vec![route("44", &[-10, -7])],
        };
        let plan = compose(Some(&cfg), Some(&snapshot), Viewport::default(), NOW);
        assert!(plan.rows[0].visible);
        assert_eq!(plan.rows[0].etas[0].label.as_deref(), Some("N/A"));
        assert_eq!(plan.rows[0].etas[0].status, Some(EtaStatus::Scheduled));
        assert!(!plan.rows[0].etas[1].visible);
        assert!(!plan.rows[0].etas[2].visible);
    }

    #[test]
    fn viewport_policy_ands_with_data() {
        let cfg = config();
        let snapshot = Snapshot {
            fetched_at_ms: NOW,
            routes: vec![
                route("44", &[2, 9, 15]),
                route("8", &[5]),
                route("62", &[7]),
            ],
        };
        let tiny = Viewport {
            min_width: 150,
            min_height: 90,
        };
        let plan = compose(Some(&cfg), Some(&snapshot), tiny, NOW);

        assert!(plan.rows[0].visible);
        assert!(plan.rows[0].etas[0].visible);
        assert!(!plan.rows[0].etas[1].visible);
        assert!(!plan.rows[0].etas[2].visible);
        assert!(!plan.rows[1].visible);
        assert!(!plan.rows[2].visible);
        assert!(!plan.footer_visible);
        assert!(!plan.branding_visible);
        assert!(plan.compact_refresh_visible);
    }

    #[test]
    fn arrival_in_current_minute_reads_now() {
        assert_eq!(format_minutes_away(NOW + 30_000, NOW), "Now");
        assert_eq!(format_minutes_away(NOW + 90_000, NOW), "1 min");
        assert_eq!(format_minutes_away(NOW - 70_000, NOW), "-1 min");
    }

    #[test]
    fn last_updated_labels() {
        assert_eq!(format_last_updated(NOW - 10_000, NOW), "Updated just now");
        assert_eq!(format_last_updated(NOW - 150_000, NOW), "Updated 2 min ago");
    }
}
