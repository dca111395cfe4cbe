//! Snapshot construction: filter, group, rank, and cap raw arrivals.

use crate::core::instance::RouteFilter;
use crate::snapshot::model::{ArrivalSnapshot, RawArrival, RouteSnapshot, Snapshot};

/// Maximum arrivals retained per route.
const MAX_ARRIVALS_PER_ROUTE: usize = 3;

/// Reduce a flat arrival sequence into a bounded, ranked snapshot.
///
/// Steps:
/// 1. Retain arrivals passing `filter`.
/// 2. Group by route id, preserving first-seen order of distinct ids.
/// 3. Sort each group by effective time ascending; keep at most 3.
/// 4. The group's display name is its first arrival's short name (arrivals for a
///    route share a short name; not re-validated).
/// 5. Sort groups by their own soonest effective arrival ascending.
///
/// A filtered-to-empty input yields an empty `routes` sequence, which renders as a
/// "no arrivals" state rather than an error.
#[must_use]
pub fn build_snapshot(arrivals: &[RawArrival], filter: &RouteFilter, fetched_at_ms: i64) -> Snapshot {
    // First-seen-order grouping: Vec keeps encounter order, the index map avoids
    // a linear scan per arrival.
    let mut groups: Vec<(String, Vec<&RawArrival>)> = Vec::new();
    let mut index_by_route: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();

    for arrival in arrivals {
        if !filter.matches(&arrival.route_id) {
            continue;
        }
        match index_by_route.get(arrival.route_id.as_str()) {
            Some(&idx) => groups[idx].1.push(arrival),
            None => {
                index_by_route.insert(arrival.route_id.as_str(), groups.len());
                groups.push((arrival.route_id.clone(), vec![arrival]));
            }
        }
    }

    let mut routes: Vec<RouteSnapshot> = groups
        .into_iter()
        .map(|(route_id, mut group)| {
            group.sort_by_key(|a| a.effective_time_ms());
            let short_name = group[0].short_name.clone();
            let arrivals = group
                .iter()
                .take(MAX_ARRIVALS_PER_ROUTE)
                .map(|a| ArrivalSnapshot {
                    predicted_time_ms: a.predicted_time_ms,
                    scheduled_time_ms: a.scheduled_time_ms,
                })
                .collect();
            RouteSnapshot {
                route_id,
                short_name,
                arrivals,
            }
        })
        .collect();

    routes.sort_by_key(RouteSnapshot::soonest_effective_ms);

    Snapshot {
        fetched_at_ms,
        routes,
    }
}
