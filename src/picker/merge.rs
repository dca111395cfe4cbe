//! Section merge: starred and recent lists flattened into one picker listing.

use serde::{Deserialize, Serialize};

use crate::picker::catalog::StopEntry;

/// One row of the merged picker listing. Headers label the following stops and are
/// not selectable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PickerItem {
    Header { title: String },
    Stop { entry: StopEntry },
}

/// Merge the two query results into a flat listing. A section contributes its
/// header only when it has at least one stop; an empty section contributes nothing.
/// The output fully replaces any previous listing.
#[must_use]
pub fn merge(starred: Vec<StopEntry>, recent: Vec<StopEntry>) -> Vec<PickerItem> {
    let mut items = Vec::with_capacity(starred.len() + recent.len() + 2);
    append_section(&mut items, "Starred stops", starred);
    append_section(&mut items, "Recent stops", recent);
    items
}

fn append_section(items: &mut Vec<PickerItem>, title: &str, stops: Vec<StopEntry>) {
    if stops.is_empty() {
        return;
    }
    items.push(PickerItem::Header {
        title: title.to_string(),
    });
    items.extend(stops.into_iter().map(|entry| PickerItem::Stop { entry }));
}
