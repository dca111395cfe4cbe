//! Activity logger thread: a bounded crossbeam channel in front of the JSONL writer.
//!
//! Producers hold a cheap cloneable handle and use `try_send`, so a slow disk never
//! stalls the scheduler or a CLI command. Overflow increments a dropped-events
//! counter that is reported on the next line that does get through.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::core::errors::{BoardError, Result};
use crate::logger::jsonl::{JsonlConfig, JsonlWriter, LogEntry, Severity};

const CHANNEL_CAPACITY: usize = 256;

/// Events recorded to the activity log.
#[derive(Debug, Clone)]
pub enum ActivityEvent {
    DaemonStarted {
        version: String,
    },
    DaemonStopped {
        reason: String,
        uptime_secs: u64,
    },
    DisplayConfigured {
        instance: u32,
        stop_id: String,
    },
    DisplayRemoved {
        instance: u32,
    },
    SnapshotFetched {
        instance: u32,
        stop_id: String,
        routes: usize,
        window_minutes: u32,
        duration_ms: u64,
    },
    FetchFailed {
        instance: u32,
        stop_id: String,
        error_code: String,
        details: String,
    },
    RenderComposed {
        instance: u32,
        state: String,
    },
    Error {
        code: String,
        message: String,
    },
    /// Sentinel requesting graceful shutdown of the writer thread.
    Shutdown,
}

/// Cloneable, non-blocking handle for sending activity events.
#[derive(Clone)]
pub struct ActivityLoggerHandle {
    tx: Sender<ActivityEvent>,
    dropped_events: Arc<AtomicU64>,
}

impl ActivityLoggerHandle {
    /// Send an event without blocking. A full channel drops the event and counts it.
    pub fn send(&self, event: ActivityEvent) {
        if let Err(TrySendError::Full(_)) = self.tx.try_send(event) {
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
        }
        // Disconnected is expected during shutdown.
    }

    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    /// Ask the writer thread to flush and exit.
    pub fn shutdown(&self) {
        let _ = self.tx.send(ActivityEvent::Shutdown);
    }
}

/// Spawn the writer thread and return a handle plus its join handle.
pub fn spawn_logger(
    config: JsonlConfig,
) -> Result<(ActivityLoggerHandle, thread::JoinHandle<()>)> {
    let (tx, rx) = bounded::<ActivityEvent>(CHANNEL_CAPACITY);
    let dropped = Arc::new(AtomicU64::new(0));
    let dropped_clone = Arc::clone(&dropped);

    let handle = ActivityLoggerHandle {
        tx,
        dropped_events: dropped,
    };

    let join = thread::Builder::new()
        .name("sbd-logger".to_string())
        .spawn(move || logger_thread_main(&rx, config, &dropped_clone))
        .map_err(|source| BoardError::Runtime {
            details: format!("failed to spawn logger thread: {source}"),
        })?;

    Ok((handle, join))
}

fn logger_thread_main(
    rx: &Receiver<ActivityEvent>,
    config: JsonlConfig,
    dropped: &Arc<AtomicU64>,
) {
    let mut writer = JsonlWriter::open(config);

    while let Ok(event) = rx.recv() {
        let d = dropped.swap(0, Ordering::Relaxed);
        if d > 0 {
            let mut warn = LogEntry::new("events_dropped", Severity::Warning);
            warn.details = Some(format!("{d} events dropped under back-pressure"));
            writer.write_entry(&warn);
        }

        if matches!(event, ActivityEvent::Shutdown) {
            break;
        }
        writer.write_entry(&event_to_entry(&event));
    }
    writer.flush();
}

fn event_to_entry(event: &ActivityEvent) -> LogEntry {
    match event {
        ActivityEvent::DaemonStarted { version } => {
            let mut e = LogEntry::new("daemon_started", Severity::Info);
            e.details = Some(format!("version {version}"));
            e
        }
        ActivityEvent::DaemonStopped {
            reason,
            uptime_secs,
        } => {
            let mut e = LogEntry::new("daemon_stopped", Severity::Info);
            e.details = Some(format!("{reason} (uptime={uptime_secs}s)"));
            e
        }
        ActivityEvent::DisplayConfigured { instance, stop_id } => {
            let mut e = LogEntry::new("display_configured", Severity::Info);
            e.instance = Some(*instance);
            e.stop_id = Some(stop_id.clone());
            e
        }
        ActivityEvent::DisplayRemoved { instance } => {
            let mut e = LogEntry::new("display_removed", Severity::Info);
            e.instance = Some(*instance);
            e
        }
        ActivityEvent::SnapshotFetched {
            instance,
            stop_id,
            routes,
            window_minutes,
            duration_ms,
        } => {
            let mut e = LogEntry::new("snapshot_fetched", Severity::Info);
            e.instance = Some(*instance);
            e.stop_id = Some(stop_id.clone());
            e.routes = Some(*routes);
            e.window_minutes = Some(*window_minutes);
            e.duration_ms = Some(*duration_ms);
            e
        }
        ActivityEvent::FetchFailed {
            instance,
            stop_id,
            error_code,
            details,
        } => {
            let mut e = LogEntry::new("fetch_failed", Severity::Warning);
            e.instance = Some(*instance);
            e.stop_id = Some(stop_id.clone());
            e.error_code = Some(error_code.clone());
            e.details = Some(details.clone());
            e
        }
        ActivityEvent::RenderComposed { instance, state } => {
            let mut e = LogEntry::new("render_composed", Severity::Info);
            e.instance = Some(*instance);
            e.details = Some(state.clone());
            e
        }
        ActivityEvent::Error { code, message } => {
            let mut e = LogEntry::new("error", Severity::Error);
            e.error_code = Some(code.clone());
            e.details = Some(message.clone());
            e
        }
        ActivityEvent::Shutdown => LogEntry::new("shutdown", Severity::Info),
    }
}
