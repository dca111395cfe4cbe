//! Per-display-instance domain types: identity, user configuration, route filter,
//! and the viewport size descriptor.

#![allow(missing_docs)]

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Identity of one configured, independently scheduled rendering target.
pub type InstanceId = u32;

/// Which routes a display instance shows.
///
/// The stored wire form keeps the original empty-list sentinel (empty ⇔ all routes)
/// so persisted configs stay compact; in memory the distinction is explicit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub enum RouteFilter {
    /// Show every route serving the stop. Never enumerated explicitly.
    AllRoutes,
    /// Show only the listed route ids.
    Subset(BTreeSet<String>),
}

impl RouteFilter {
    /// Build a filter from a user selection. An empty selection means "all routes".
    #[must_use]
    pub fn from_selection(routes: impl IntoIterator<Item = String>) -> Self {
        let set: BTreeSet<String> = routes.into_iter().collect();
        if set.is_empty() {
            Self::AllRoutes
        } else {
            Self::Subset(set)
        }
    }

    /// Whether an arrival on `route_id` passes this filter.
    #[must_use]
    pub fn matches(&self, route_id: &str) -> bool {
        match self {
            Self::AllRoutes => true,
            Self::Subset(routes) => routes.contains(route_id),
        }
    }
}

impl From<Vec<String>> for RouteFilter {
    fn from(routes: Vec<String>) -> Self {
        Self::from_selection(routes)
    }
}

impl From<RouteFilter> for Vec<String> {
    fn from(filter: RouteFilter) -> Self {
        match filter {
            RouteFilter::AllRoutes => Self::new(),
            RouteFilter::Subset(routes) => routes.into_iter().collect(),
        }
    }
}

/// Size descriptor for a display surface, in abstract display units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for Viewport {
    /// Large enough that nothing is hidden.
    fn default() -> Self {
        Self {
            min_width: 320,
            min_height: 160,
        }
    }
}

/// User settings for one display instance.
///
/// Created on configuration save, immutable until re-saved, deleted together with
/// the instance's snapshot when the instance is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub stop_id: String,
    /// Defaults to the stop name but can be edited by the user.
    pub display_name: String,
    #[serde(rename = "routes")]
    pub route_filter: RouteFilter,
    /// Last-known surface size, refreshed when the host reports a resize.
    #[serde(default)]
    pub viewport: Viewport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selection_means_all_routes() {
        let filter = RouteFilter::from_selection(Vec::new());
        assert_eq!(filter, RouteFilter::AllRoutes);
        assert!(filter.matches("1_100"));
        assert!(filter.matches("anything"));
    }

    #[test]
    fn subset_matches_only_listed_routes() {
        let filter = RouteFilter::from_selection(vec!["1_100".to_string(), "1_44".to_string()]);
        assert!(filter.matches("1_100"));
        assert!(filter.matches("1_44"));
        assert!(!filter.matches("1_999"));
    }

    #[test]
    fn wire_form_keeps_empty_list_sentinel() {
        let all = serde_json::to_string(&RouteFilter::AllRoutes).expect("serialize");
        assert_eq!(all, "[]");

        let subset = RouteFilter::from_selection(vec!["1_44".to_string()]);
        let json = serde_json::to_string(&subset).expect("serialize");
        assert_eq!(json, "[\"1_44\"]");

        let back: RouteFilter = serde_json::from_str("[]").expect("deserialize");
        assert_eq!(back, RouteFilter::AllRoutes);
    }

    #[test]
    fn display_config_roundtrip() {
        let config = DisplayConfig {
            stop_id: "1_75403".to_string(),
            display_name: "3rd Ave & Pike St".to_string(),
            route_filter: RouteFilter::from_selection(vec!["1_100".to_string()]),
            viewport: Viewport {
                min_width: 250,
                min_height: 110,
            },
        };
        let json = serde_json::to_string(&config).expect("serialize");
        let back: DisplayConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, config);
    }
}
