//! Viewport policy: maps a surface size descriptor to visible layout slots.
//!
//! Thresholds are deterministic and cumulative: narrower or shorter viewports hide
//! strictly more. Policy visibility is later ANDed with data-driven visibility by
//! the surface composer.

use serde::{Deserialize, Serialize};

use crate::core::instance::Viewport;

/// Route rows a display can show.
pub const MAX_ROUTE_ROWS: usize = 3;
/// ETA slots per route row.
pub const MAX_ETA_SLOTS: usize = 3;

// Width thresholds hide trailing ETA columns.
const WIDTH_HIDE_THIRD_ETA: u32 = 300;
const WIDTH_HIDE_SECOND_ETA: u32 = 180;
// Height thresholds hide trailing route rows, then the footer and branding.
const HEIGHT_HIDE_THIRD_ROW: u32 = 150;
const HEIGHT_HIDE_SECOND_ROW: u32 = 120;
const HEIGHT_COMPACT: u32 = 100;

/// Which layout slots a viewport permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotVisibility {
    /// Per-column ETA permission, applied uniformly to every route row.
    pub eta_cols: [bool; MAX_ETA_SLOTS],
    /// Per-rank route row permission.
    pub route_rows: [bool; MAX_ROUTE_ROWS],
    pub footer: bool,
    pub branding: bool,
    /// Compact refresh control shown in place of footer/branding at the smallest height.
    pub compact_refresh: bool,
}

impl SlotVisibility {
    /// Evaluate the policy for a viewport.
    #[must_use]
    pub fn for_viewport(viewport: Viewport) -> Self {
        let Viewport {
            min_width,
            min_height,
        } = viewport;

        let eta_cols = [
            true, // first ETA is always permitted when data exists
            min_width >= WIDTH_HIDE_SECOND_ETA,
            min_width >= WIDTH_HIDE_THIRD_ETA,
        ];
        let route_rows = [
            true,
            min_height >= HEIGHT_HIDE_SECOND_ROW,
            min_height >= HEIGHT_HIDE_THIRD_ROW,
        ];
        let compact = min_height < HEIGHT_COMPACT;

        Self {
            eta_cols,
            route_rows,
            footer: !compact,
            branding: !compact,
            compact_refresh: compact,
        }
    }
}
