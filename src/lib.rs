#![forbid(unsafe_code)]

//! stopboard — turns transit stop arrival predictions into compact,
//! size-adaptive display snapshots.
//!
//! The pipeline per display instance:
//! 1. **Fetch** — query a prediction source over a widening look-ahead window
//! 2. **Build** — group, sort, and cap arrivals into a compact snapshot
//! 3. **Render** — compose a slot-assignment plan fitted to the display's viewport
//!
//! A local re-render and a network refresh run on independent cadences, so the
//! "N min" labels stay current without hammering the prediction source.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use stopboard::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use stopboard::core::config::Config;
//! use stopboard::snapshot::builder::build_snapshot;
//! ```

pub mod prelude;

pub mod core;
#[cfg(feature = "daemon")]
pub mod daemon;
pub mod fetch;
pub mod logger;
pub mod picker;
pub mod render;
pub mod scheduler;
pub mod snapshot;
pub mod store;
