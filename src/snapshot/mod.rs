//! Snapshot subsystem: raw arrival reduction, render-time staleness filtering,
//! and ETA status classification.

pub mod builder;
pub mod eta;
pub mod model;
pub mod staleness;
