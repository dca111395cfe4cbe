//! Per-display scheduling threads with explicit lifecycle control.
//!
//! Every configured display instance gets its own loop thread, registered and
//! cancelled by id. Cancellation joins the thread before returning, so a caller
//! deleting the instance's documents afterwards cannot race a late write from the
//! loop it just stopped.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use parking_lot::Mutex;

use crate::core::errors::{BoardError, Result};
use crate::core::instance::InstanceId;
use crate::scheduler::policy::{RefreshPolicy, Trigger};
use crate::scheduler::worker::RefreshWorker;

enum Command {
    /// Run a network refresh now and restart the periodic timer.
    RefreshNow,
    /// Exit the loop.
    Cancel,
}

struct Entry {
    cmd_tx: Sender<Command>,
    join: thread::JoinHandle<()>,
}

/// Registry owning one scheduling thread per registered display instance.
pub struct SchedulerRegistry {
    worker: Arc<RefreshWorker>,
    tick: Duration,
    entries: Mutex<HashMap<InstanceId, Entry>>,
}

impl SchedulerRegistry {
    #[must_use]
    pub fn new(worker: Arc<RefreshWorker>) -> Self {
        let tick = Duration::from_millis(worker.refresh_config().tick_millis);
        Self {
            worker,
            tick,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Shared refresh machinery, for callers that need store access.
    #[must_use]
    pub fn worker(&self) -> &Arc<RefreshWorker> {
        &self.worker
    }

    /// Start a scheduling loop for an instance. Re-registering an already active
    /// instance restarts its loop, which forces an immediate refresh.
    pub fn register(&self, instance: InstanceId) -> Result<()> {
        self.cancel_if_present(instance)?;

        let (cmd_tx, cmd_rx) = bounded::<Command>(4);
        let worker = Arc::clone(&self.worker);
        let tick = self.tick;
        let join = thread::Builder::new()
            .name(format!("sbd-display-{instance}"))
            .spawn(move || display_loop(&worker, instance, &cmd_rx, tick))
            .map_err(|source| BoardError::Runtime {
                details: format!("failed to spawn display loop {instance}: {source}"),
            })?;

        self.entries.lock().insert(instance, Entry { cmd_tx, join });
        Ok(())
    }

    /// Ask an instance's loop to refresh now. Fails for unknown instances.
    ///
    /// Never blocks: the sender is cloned out of the registry lock, and a full
    /// command channel means a refresh is already pending, which satisfies the
    /// request. A loop stuck in a slow fetch therefore cannot stall cancel,
    /// enumeration, or shutdown behind this call.
    pub fn request_refresh(&self, instance: InstanceId) -> Result<()> {
        let cmd_tx = {
            let entries = self.entries.lock();
            entries
                .get(&instance)
                .ok_or(BoardError::InvalidInstance { instance })?
                .cmd_tx
                .clone()
        };
        match cmd_tx.try_send(Command::RefreshNow) {
            Ok(()) | Err(TrySendError::Full(_)) => Ok(()),
            Err(TrySendError::Disconnected(_)) => Err(BoardError::ChannelClosed {
                component: "scheduler",
            }),
        }
    }

    /// Stop an instance's loop and wait for it to exit. Fails for unknown instances.
    pub fn cancel(&self, instance: InstanceId) -> Result<()> {
        let entry = self
            .entries
            .lock()
            .remove(&instance)
            .ok_or(BoardError::InvalidInstance { instance })?;
        stop_entry(entry);
        Ok(())
    }

    /// Instances with an active scheduling loop, ascending.
    #[must_use]
    pub fn active_instances(&self) -> Vec<InstanceId> {
        let mut ids: Vec<InstanceId> = self.entries.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Stop every loop. Called on daemon shutdown.
    pub fn shutdown(&self) {
        let entries: Vec<Entry> = {
            let mut map = self.entries.lock();
            map.drain().map(|(_, e)| e).collect()
        };
        for entry in entries {
            stop_entry(entry);
        }
    }

    fn cancel_if_present(&self, instance: InstanceId) -> Result<()> {
        if let Some(entry) = self.entries.lock().remove(&instance) {
            stop_entry(entry);
        }
        Ok(())
    }
}

impl Drop for SchedulerRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn stop_entry(entry: Entry) {
    let _ = entry.cmd_tx.send(Command::Cancel);
    drop(entry.cmd_tx);
    let _ = entry.join.join();
}

/// One display's scheduling loop. Errors are absorbed here: a failed refresh is
/// logged and the loop keeps its cadence, retrying on the next due trigger.
fn display_loop(
    worker: &RefreshWorker,
    instance: InstanceId,
    cmd_rx: &Receiver<Command>,
    tick: Duration,
) {
    let mut policy = RefreshPolicy::new(worker.refresh_config());

    loop {
        match cmd_rx.recv_timeout(tick) {
            Ok(Command::Cancel) | Err(RecvTimeoutError::Disconnected) => break,
            Ok(Command::RefreshNow) => {
                policy.note_manual_fetch(Instant::now());
                if let Err(err) = worker.refresh_once(instance) {
                    worker.log_error(&err);
                    if matches!(err, BoardError::NotConfigured { .. }) {
                        break;
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => match policy.due(Instant::now()) {
                Some(Trigger::NetworkFetch) => {
                    if let Err(err) = worker.refresh_once(instance) {
                        worker.log_error(&err);
                        if matches!(err, BoardError::NotConfigured { .. }) {
                            break;
                        }
                    }
                }
                Some(Trigger::LocalRender) => {
                    if let Err(err) = worker.render_once(instance) {
                        worker.log_error(&err);
                        if matches!(err, BoardError::NotConfigured { .. }) {
                            break;
                        }
                    }
                }
                None => {}
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::RefreshConfig;
    use crate::core::instance::{DisplayConfig, RouteFilter, Viewport};
    use crate::fetch::PredictionSource;
    use crate::logger::jsonl::JsonlConfig;
    use crate::snapshot::model::RawArrival;
    use crate::store::SnapshotStore;

    struct SteadySource;

    impl PredictionSource for SteadySource {
        fn arrivals(&self, _stop_id: &str, _look_ahead_minutes: u32) -> Result<Vec<RawArrival>> {
            let t = crate::core::now_ms() + 5 * 60_000;
            Ok(vec![RawArrival {
                route_id: "r44".to_string(),
                short_name: "44".to_string(),
                predicted_time_ms: t,
                scheduled_time_ms: t,
            }])
        }
    }

    fn registry(dir: &std::path::Path) -> (SchedulerRegistry, thread::JoinHandle<()>) {
        registry_with(dir, Arc::new(SteadySource))
    }

    fn registry_with(
        dir: &std::path::Path,
        source: Arc<dyn PredictionSource>,
    ) -> (SchedulerRegistry, thread::JoinHandle<()>) {
        let store = SnapshotStore::open(dir.join("displays")).expect("open store");
        let (logger, join) = crate::logger::activity::spawn_logger(JsonlConfig {
            path: dir.join("activity.jsonl"),
            ..JsonlConfig::default()
        })
        .expect("spawn logger");
        let refresh = RefreshConfig {
            tick_millis: 10,
            ..RefreshConfig::default()
        };
        let worker = Arc::new(RefreshWorker::new(source, store, refresh, logger.clone()));
        let reg = SchedulerRegistry::new(worker);
        logger.shutdown();
        (reg, join)
    }

    fn configure(reg: &SchedulerRegistry, instance: InstanceId) {
        let config = DisplayConfig {
            stop_id: "1_75403".to_string(),
            display_name: "Pike St".to_string(),
            route_filter: RouteFilter::AllRoutes,
            viewport: Viewport::default(),
        };
        reg.worker.configure(instance, &config).expect("configure");
    }

    fn wait_for_snapshot(reg: &SchedulerRegistry, instance: InstanceId) -> bool {
        for _ in 0..200 {
            if reg
                .worker
                .store()
                .load_snapshot(instance)
                .expect("load")
                .is_some()
            {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn registered_instance_fetches_on_first_tick() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (reg, logger_join) = registry(dir.path());
        configure(&reg, 1);

        reg.register(1).expect("register");
        assert!(wait_for_snapshot(&reg, 1), "first fetch never happened");
        assert_eq!(reg.active_instances(), vec![1]);

        reg.shutdown();
        logger_join.join().expect("logger thread");
    }

    #[test]
    fn unknown_instance_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (reg, logger_join) = registry(dir.path());

        assert_eq!(reg.request_refresh(42).unwrap_err().code(), "SBD-2002");
        assert_eq!(reg.cancel(42).unwrap_err().code(), "SBD-2002");

        reg.shutdown();
        logger_join.join().expect("logger thread");
    }

    #[test]
    fn cancel_then_remove_leaves_no_documents_behind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (reg, logger_join) = registry(dir.path());
        configure(&reg, 3);

        reg.register(3).expect("register");
        assert!(wait_for_snapshot(&reg, 3));

        // Cancel joins the loop thread, so the subsequent delete cannot race it.
        reg.cancel(3).expect("cancel");
        reg.worker.remove(3).expect("remove");
        thread::sleep(Duration::from_millis(50));

        assert!(reg.worker.store().load_config(3).expect("load").is_none());
        assert!(reg.worker.store().load_snapshot(3).expect("load").is_none());
        assert!(reg.active_instances().is_empty());

        reg.shutdown();
        logger_join.join().expect("logger thread");
    }

    /// Source whose fetch parks on a gate channel until the test drops the sender.
    struct StalledSource {
        entered: Arc<std::sync::atomic::AtomicBool>,
        gate: Receiver<()>,
    }

    impl PredictionSource for StalledSource {
        fn arrivals(&self, _stop_id: &str, _look_ahead_minutes: u32) -> Result<Vec<RawArrival>> {
            self.entered
                .store(true, std::sync::atomic::Ordering::SeqCst);
            let _ = self.gate.recv();
            let t = crate::core::now_ms() + 5 * 60_000;
            Ok(vec![RawArrival {
                route_id: "r44".to_string(),
                short_name: "44".to_string(),
                predicted_time_ms: t,
                scheduled_time_ms: t,
            }])
        }
    }

    #[test]
    fn refresh_requests_never_block_on_a_busy_loop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (gate_tx, gate_rx) = bounded::<()>(0);
        let entered = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let (reg, logger_join) = registry_with(
            dir.path(),
            Arc::new(StalledSource {
                entered: Arc::clone(&entered),
                gate: gate_rx,
            }),
        );
        configure(&reg, 8);
        reg.register(8).expect("register");

        // Wait until the loop is parked inside its fetch.
        for _ in 0..200 {
            if entered.load(std::sync::atomic::Ordering::SeqCst) {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert!(entered.load(std::sync::atomic::Ordering::SeqCst));

        // More requests than the command channel holds; a full channel means a
        // refresh is already pending, so every call returns immediately.
        for _ in 0..8 {
            reg.request_refresh(8).expect("refresh request");
        }
        // The registry lock is free while the loop is stuck.
        assert_eq!(reg.active_instances(), vec![8]);

        drop(gate_tx);
        reg.shutdown();
        logger_join.join().expect("logger thread");
    }

    #[test]
    fn manual_refresh_reaches_the_loop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (reg, logger_join) = registry(dir.path());
        configure(&reg, 5);

        reg.register(5).expect("register");
        assert!(wait_for_snapshot(&reg, 5));
        reg.request_refresh(5).expect("refresh request");

        reg.shutdown();
        logger_join.join().expect("logger thread");
    }
}
