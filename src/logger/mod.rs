//! Activity logging: a dedicated writer thread fed by a bounded channel, persisting
//! line-delimited JSON. Producers never block on logging.

pub mod activity;
pub mod jsonl;

pub use activity::{ActivityEvent, ActivityLoggerHandle, spawn_logger};
pub use jsonl::{JsonlConfig, JsonlWriter, LogEntry, Severity};
