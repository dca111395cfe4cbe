//! Daemon runtime: signal handling and the top-level service loop that keeps one
//! scheduling thread per configured display alive.

pub mod service;
pub mod signals;

pub use service::BoardDaemon;
pub use signals::SignalHandler;
