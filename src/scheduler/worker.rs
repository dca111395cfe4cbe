//! Per-display refresh work: fetch, rebuild, persist, re-compose.
//!
//! The worker is shared across scheduling threads and CLI one-shots. It owns no
//! threads itself; the registry and the CLI decide when its operations run.

use std::sync::Arc;
use std::time::Instant;

use crate::core::config::RefreshConfig;
use crate::core::errors::{BoardError, Result};
use crate::core::instance::InstanceId;
use crate::core::now_ms;
use crate::fetch::{PredictionSource, fetch_with_widening};
use crate::logger::activity::{ActivityEvent, ActivityLoggerHandle};
use crate::render::surface::{RenderPlan, compose};
use crate::snapshot::builder::build_snapshot;
use crate::store::SnapshotStore;

/// Shared refresh machinery for all display instances.
pub struct RefreshWorker {
    source: Arc<dyn PredictionSource>,
    store: SnapshotStore,
    refresh: RefreshConfig,
    logger: ActivityLoggerHandle,
}

impl RefreshWorker {
    #[must_use]
    pub fn new(
        source: Arc<dyn PredictionSource>,
        store: SnapshotStore,
        refresh: RefreshConfig,
        logger: ActivityLoggerHandle,
    ) -> Self {
        Self {
            source,
            store,
            refresh,
            logger,
        }
    }

    #[must_use]
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    #[must_use]
    pub fn refresh_config(&self) -> &RefreshConfig {
        &self.refresh
    }

    /// Full network refresh: fetch, rebuild the snapshot, persist it, re-compose.
    ///
    /// A failed fetch leaves the previously persisted snapshot untouched; the error
    /// is returned after a render plan from the stale data has been written, so the
    /// display keeps showing the last good arrivals until a later attempt succeeds.
    pub fn refresh_once(&self, instance: InstanceId) -> Result<RenderPlan> {
        let config = self.store.require_config(instance)?;
        let started = Instant::now();

        match fetch_with_widening(self.source.as_ref(), &config.stop_id, &self.refresh) {
            Ok(fetched) => {
                let snapshot = build_snapshot(&fetched.arrivals, &config.route_filter, now_ms());
                self.store.save_snapshot(instance, &snapshot)?;
                self.logger.send(ActivityEvent::SnapshotFetched {
                    instance,
                    stop_id: config.stop_id.clone(),
                    routes: snapshot.routes.len(),
                    window_minutes: fetched.window_minutes,
                    duration_ms: u64::try_from(started.elapsed().as_millis())
                        .unwrap_or(u64::MAX),
                });
                self.render_once(instance)
            }
            Err(err) => {
                self.logger.send(ActivityEvent::FetchFailed {
                    instance,
                    stop_id: config.stop_id.clone(),
                    error_code: err.code().to_string(),
                    details: err.to_string(),
                });
                // Keep the display alive on whatever snapshot is already stored.
                let _ = self.render_once(instance);
                Err(err)
            }
        }
    }

    /// Cheap re-compose from persisted state; no network involved.
    pub fn render_once(&self, instance: InstanceId) -> Result<RenderPlan> {
        let config = self.store.require_config(instance)?;
        let snapshot = self.store.load_snapshot(instance)?;
        let plan = compose(Some(&config), snapshot.as_ref(), config.viewport, now_ms());
        self.store.save_render(instance, &plan)?;
        self.logger.send(ActivityEvent::RenderComposed {
            instance,
            state: format!("{:?}", plan.state),
        });
        Ok(plan)
    }

    /// Store a new display config and log the change.
    pub fn configure(&self, instance: InstanceId, config: &crate::core::instance::DisplayConfig) -> Result<()> {
        self.store.save_config(instance, config)?;
        self.logger.send(ActivityEvent::DisplayConfigured {
            instance,
            stop_id: config.stop_id.clone(),
        });
        Ok(())
    }

    /// Delete every persisted document for a display.
    ///
    /// Callers must cancel the display's scheduling thread first, or a concurrent
    /// refresh can resurrect the snapshot document.
    pub fn remove(&self, instance: InstanceId) -> Result<()> {
        self.store.remove(instance)?;
        self.logger.send(ActivityEvent::DisplayRemoved { instance });
        Ok(())
    }

    /// Map a worker error to an activity log entry. Used by scheduling loops that
    /// absorb errors instead of propagating them.
    pub fn log_error(&self, err: &BoardError) {
        self.logger.send(ActivityEvent::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        });
    }
}
