//! Convenience re-exports of the types most callers need.
//!
//! ```rust,no_run
//! use stopboard::prelude::*;
//! ```

pub use crate::core::config::{Config, PathsConfig, RefreshConfig};
pub use crate::core::errors::{BoardError, Result};
pub use crate::core::instance::{DisplayConfig, InstanceId, RouteFilter, Viewport};
pub use crate::core::now_ms;
pub use crate::fetch::{FetchedArrivals, PredictionSource, StaticSource, fetch_with_widening};
pub use crate::picker::{PickerItem, StopCatalog, StopEntry, StopQuery, merge, recent, starred};
pub use crate::render::surface::{BoardState, EtaSlot, RenderPlan, RouteRow, compose};
pub use crate::render::viewport::SlotVisibility;
pub use crate::scheduler::{RefreshPolicy, RefreshWorker, SchedulerRegistry, Trigger};
pub use crate::snapshot::builder::build_snapshot;
pub use crate::snapshot::eta::{EtaStatus, classify};
pub use crate::snapshot::model::{ArrivalSnapshot, RawArrival, RouteSnapshot, Snapshot};
pub use crate::snapshot::staleness::is_stale;
pub use crate::store::SnapshotStore;

#[cfg(feature = "daemon")]
pub use crate::daemon::{BoardDaemon, SignalHandler};
