//! Refresh scheduling: the pure dual-cadence policy, the per-display refresh
//! worker, and the thread registry that owns one scheduling loop per display
//! instance.

pub mod policy;
pub mod registry;
pub mod worker;

pub use policy::{RefreshPolicy, Trigger};
pub use registry::SchedulerRegistry;
pub use worker::RefreshWorker;
