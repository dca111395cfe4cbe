//! Signal handling: SIGTERM/SIGINT graceful shutdown, SIGUSR1 manual refresh of
//! every display.
//!
//! Registered through `signal-hook` flags; the service loop polls the handler each
//! tick instead of blocking on signals.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::{SIGINT, SIGTERM};

/// Thread-safe signal state shared between signal hooks and the service loop.
///
/// Flags use `Ordering::Relaxed`; the loop polls them every tick and no ordering
/// with other atomics is required.
#[derive(Clone)]
pub struct SignalHandler {
    shutdown_flag: Arc<AtomicBool>,
    refresh_flag: Arc<AtomicBool>,
}

impl SignalHandler {
    /// Create a handler and register OS hooks: SIGTERM/SIGINT -> shutdown,
    /// SIGUSR1 -> refresh all displays. Registration is best-effort.
    #[must_use]
    pub fn new() -> Self {
        let handler = Self {
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            refresh_flag: Arc::new(AtomicBool::new(false)),
        };
        handler.register_signals();
        handler
    }

    #[must_use]
    pub fn should_shutdown(&self) -> bool {
        self.shutdown_flag.load(Ordering::Relaxed)
    }

    /// Check and clear the manual refresh flag.
    pub fn should_refresh(&self) -> bool {
        self.refresh_flag.swap(false, Ordering::Relaxed)
    }

    pub fn request_shutdown(&self) {
        self.shutdown_flag.store(true, Ordering::Relaxed);
    }

    pub fn request_refresh(&self) {
        self.refresh_flag.store(true, Ordering::Relaxed);
    }

    fn register_signals(&self) {
        if let Err(e) = signal_hook::flag::register(SIGTERM, Arc::clone(&self.shutdown_flag)) {
            eprintln!("[SBD-SIGNAL] failed to register SIGTERM: {e}");
        }
        if let Err(e) = signal_hook::flag::register(SIGINT, Arc::clone(&self.shutdown_flag)) {
            eprintln!("[SBD-SIGNAL] failed to register SIGINT: {e}");
        }
        #[cfg(unix)]
        {
            use signal_hook::consts::SIGUSR1;
            if let Err(e) = signal_hook::flag::register(SIGUSR1, Arc::clone(&self.refresh_flag)) {
                eprintln!("[SBD-SIGNAL] failed to register SIGUSR1: {e}");
            }
        }
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> SignalHandler {
        SignalHandler {
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            refresh_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    #[test]
    fn default_state_is_idle() {
        let h = handler();
        assert!(!h.should_shutdown());
        assert!(!h.should_refresh());
    }

    #[test]
    fn programmatic_shutdown_request() {
        let h = handler();
        h.request_shutdown();
        assert!(h.should_shutdown());
        // Shutdown is sticky.
        assert!(h.should_shutdown());
    }

    #[test]
    fn refresh_flag_clears_on_read() {
        let h = handler();
        h.request_refresh();
        assert!(h.should_refresh());
        assert!(!h.should_refresh());
    }

    #[test]
    fn handler_is_shared_across_clones() {
        let h = handler();
        let h2 = h.clone();
        h.request_shutdown();
        assert!(h2.should_shutdown());
    }
}
