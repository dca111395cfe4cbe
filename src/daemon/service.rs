//! Top-level service loop for `stopboard daemon`.
//!
//! One process: a registry of per-display scheduling threads, a logger thread, and
//! this polling loop handling signals and newly configured displays.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::core::config::Config;
use crate::core::errors::Result;
use crate::daemon::signals::SignalHandler;
use crate::fetch::PredictionSource;
use crate::logger::activity::{ActivityEvent, ActivityLoggerHandle, spawn_logger};
use crate::logger::jsonl::JsonlConfig;
use crate::scheduler::registry::SchedulerRegistry;
use crate::scheduler::worker::RefreshWorker;
use crate::store::SnapshotStore;

/// How often the service loop rescans the store for configured displays that do
/// not have a scheduling thread yet.
const DISCOVERY_INTERVAL: Duration = Duration::from_secs(10);

/// The stopboard daemon: keeps every configured display refreshing on schedule.
pub struct BoardDaemon {
    config: Config,
    registry: SchedulerRegistry,
    signal_handler: SignalHandler,
    logger_handle: ActivityLoggerHandle,
    logger_join: Option<thread::JoinHandle<()>>,
    start_time: Instant,
}

impl BoardDaemon {
    /// Build the daemon: logger thread, store, worker, and signal hooks.
    pub fn init(config: Config, source: Arc<dyn PredictionSource>) -> Result<Self> {
        let (logger_handle, logger_join) = spawn_logger(JsonlConfig {
            path: config.paths.jsonl_log.clone(),
            ..JsonlConfig::default()
        })?;

        let store = SnapshotStore::open(&config.paths.store_dir)?;
        let worker = Arc::new(RefreshWorker::new(
            source,
            store,
            config.refresh.clone(),
            logger_handle.clone(),
        ));
        let registry = SchedulerRegistry::new(worker);
        let signal_handler = SignalHandler::new();

        Ok(Self {
            config,
            registry,
            signal_handler,
            logger_handle,
            logger_join: Some(logger_join),
            start_time: Instant::now(),
        })
    }

    /// Run until SIGTERM/SIGINT. This is the entry point for `stopboard daemon`.
    pub fn run(&mut self) -> Result<()> {
        self.logger_handle.send(ActivityEvent::DaemonStarted {
            version: env!("CARGO_PKG_VERSION").to_string(),
        });

        self.adopt_configured_displays()?;
        let mut last_discovery = Instant::now();
        let tick = Duration::from_millis(self.config.refresh.tick_millis);

        loop {
            if self.signal_handler.should_shutdown() {
                eprintln!("[SBD-DAEMON] shutdown requested");
                break;
            }

            if self.signal_handler.should_refresh() {
                eprintln!("[SBD-DAEMON] manual refresh requested (SIGUSR1)");
                for instance in self.registry.active_instances() {
                    if let Err(err) = self.registry.request_refresh(instance) {
                        self.logger_handle.send(ActivityEvent::Error {
                            code: err.code().to_string(),
                            message: format!("manual refresh for display {instance}: {err}"),
                        });
                    }
                }
            }

            // Displays configured while the daemon runs get a loop without a restart.
            if last_discovery.elapsed() >= DISCOVERY_INTERVAL {
                last_discovery = Instant::now();
                if let Err(err) = self.adopt_configured_displays() {
                    self.logger_handle.send(ActivityEvent::Error {
                        code: err.code().to_string(),
                        message: format!("display discovery: {err}"),
                    });
                }
            }

            thread::sleep(tick);
        }

        self.shutdown();
        Ok(())
    }

    /// Register a scheduling loop for every stored config without one.
    fn adopt_configured_displays(&self) -> Result<()> {
        let active = self.registry.active_instances();
        for instance in self.registry.worker().store().configured_instances()? {
            if !active.contains(&instance) {
                self.registry.register(instance)?;
            }
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        let uptime_secs = self.start_time.elapsed().as_secs();
        self.registry.shutdown();

        self.logger_handle.send(ActivityEvent::DaemonStopped {
            reason: "clean shutdown".to_string(),
            uptime_secs,
        });
        self.logger_handle.shutdown();
        if let Some(join) = self.logger_join.take() {
            let _ = join.join();
        }
        eprintln!("[SBD-DAEMON] shutdown complete (uptime={uptime_secs}s)");
    }
}
