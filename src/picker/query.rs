//! Picker queries: the starred and recent stop lists.

use crate::picker::catalog::StopEntry;

/// Most recent stops shown; older usage falls off the list.
const RECENT_LIMIT: usize = 20;

/// Filter applied to both picker lists.
#[derive(Debug, Clone, Default)]
pub struct StopQuery {
    /// Case-insensitive substring matched against the stop name. Empty matches all.
    pub name_contains: String,
    /// Restrict to one region when set.
    pub region_id: Option<String>,
}

impl StopQuery {
    fn accepts(&self, entry: &StopEntry) -> bool {
        if let Some(region) = &self.region_id
            && entry.region_id.as_ref() != Some(region)
        {
            return false;
        }
        self.name_contains.is_empty()
            || entry
                .name
                .to_lowercase()
                .contains(&self.name_contains.to_lowercase())
    }
}

/// Favorite stops matching the query, name ascending.
#[must_use]
pub fn starred(entries: &[StopEntry], query: &StopQuery) -> Vec<StopEntry> {
    let mut matched: Vec<StopEntry> = entries
        .iter()
        .filter(|e| e.favorite && query.accepts(e))
        .cloned()
        .collect();
    matched.sort_by(|a, b| a.name.cmp(&b.name));
    matched
}

/// Non-favorite stops with prior use, most recently used first, use count as the
/// tiebreak, capped at 20.
#[must_use]
pub fn recent(entries: &[StopEntry], query: &StopQuery) -> Vec<StopEntry> {
    let mut matched: Vec<StopEntry> = entries
        .iter()
        .filter(|e| !e.favorite && (e.last_access_ms > 0 || e.use_count > 0))
        .filter(|e| query.accepts(e))
        .cloned()
        .collect();
    matched.sort_by(|a, b| {
        b.last_access_ms
            .cmp(&a.last_access_ms)
            .then(b.use_count.cmp(&a.use_count))
    });
    matched.truncate(RECENT_LIMIT);
    matched
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, favorite: bool, last_access_ms: i64, use_count: u32) -> StopEntry {
        StopEntry {
            stop_id: format!("1_{name}"),
            name: name.to_string(),
            direction: None,
            favorite,
            last_access_ms,
            use_count,
            region_id: Some("1".to_string()),
        }
    }

    #[test]
    fn starred_sorts_by_name() {
        let entries = vec![
            entry("Pine St", true, 0, 0),
            entry("Broadway", true, 0, 0),
            entry("Aloha St", false, 100, 1),
        ];
        let got = starred(&entries, &StopQuery::default());
        let names: Vec<&str> = got.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Broadway", "Pine St"]);
    }

    #[test]
    fn recent_orders_by_access_then_use_count() {
        let entries = vec![
            entry("A", false, 100, 1),
            entry("B", false, 300, 1),
            entry("C", false, 300, 5),
            entry("D", false, 0, 0),  // never used: excluded
            entry("E", true, 900, 9), // favorite: excluded
        ];
        let got = recent(&entries, &StopQuery::default());
        let names: Vec<&str> = got.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);
    }

    #[test]
    fn recent_is_capped_at_twenty() {
        let entries: Vec<StopEntry> = (0..30)
            .map(|i| entry(&format!("Stop {i:02}"), false, i64::from(i) + 1, 1))
            .collect();
        let got = recent(&entries, &StopQuery::default());
        assert_eq!(got.len(), 20);
        // Newest access first.
        assert_eq!(got[0].name, "Stop 29");
    }

    #[test]
    fn name_query_is_case_insensitive() {
        let entries = vec![
            entry("Pike Street", true, 0, 0),
            entry("Pine Street", true, 0, 0),
        ];
        let query = StopQuery {
            name_contains: "pike".to_string(),
            region_id: None,
        };
        let got = starred(&entries, &query);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].name, "Pike Street");
    }

    #[test]
    fn region_filter_applies() {
        let mut other_region = entry("Pike Street", true, 0, 0);
        other_region.region_id = Some("2".to_string());
        let entries = vec![entry("Broadway", true, 0, 0), other_region];

        let query = StopQuery {
            name_contains: String::new(),
            region_id: Some("1".to_string()),
        };
        let got = starred(&entries, &query);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].name, "Broadway");
    }
}
