//! Per-instance persistence: display configs, snapshots, and render plans as JSON
//! documents.
//!
//! One display instance owns up to three documents under the store directory,
//! `display-<id>.config.json`, `display-<id>.snapshot.json`, and
//! `display-<id>.render.json`. Writes go through a temp file and an atomic rename
//! so a crash mid-write never leaves a reader with a truncated document.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::core::errors::{BoardError, Result};
use crate::core::instance::{DisplayConfig, InstanceId};
use crate::render::surface::RenderPlan;
use crate::snapshot::model::Snapshot;

/// Filesystem-backed store keyed by display instance id.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Open a store rooted at `dir`, creating the directory if absent.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| BoardError::io(&dir, source))?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn config_path(&self, instance: InstanceId) -> PathBuf {
        self.dir.join(format!("display-{instance}.config.json"))
    }

    fn snapshot_path(&self, instance: InstanceId) -> PathBuf {
        self.dir.join(format!("display-{instance}.snapshot.json"))
    }

    fn render_path(&self, instance: InstanceId) -> PathBuf {
        self.dir.join(format!("display-{instance}.render.json"))
    }

    /// Persist the display config for an instance.
    pub fn save_config(&self, instance: InstanceId, config: &DisplayConfig) -> Result<()> {
        write_json_atomic(&self.config_path(instance), config)
    }

    /// Persist the latest snapshot for an instance. Last writer wins.
    pub fn save_snapshot(&self, instance: InstanceId, snapshot: &Snapshot) -> Result<()> {
        write_json_atomic(&self.snapshot_path(instance), snapshot)
    }

    /// Persist the latest composed render plan for an instance.
    pub fn save_render(&self, instance: InstanceId, plan: &RenderPlan) -> Result<()> {
        write_json_atomic(&self.render_path(instance), plan)
    }

    /// Load the latest composed render plan for an instance.
    pub fn load_render(&self, instance: InstanceId) -> Result<Option<RenderPlan>> {
        read_json_opt(&self.render_path(instance))
    }

    /// Load the display config for an instance; `None` when never configured.
    pub fn load_config(&self, instance: InstanceId) -> Result<Option<DisplayConfig>> {
        read_json_opt(&self.config_path(instance))
    }

    /// Load the latest snapshot for an instance; `None` before the first fetch.
    pub fn load_snapshot(&self, instance: InstanceId) -> Result<Option<Snapshot>> {
        read_json_opt(&self.snapshot_path(instance))
    }

    /// Require a config to exist, mapping absence to `NotConfigured`.
    pub fn require_config(&self, instance: InstanceId) -> Result<DisplayConfig> {
        self.load_config(instance)?
            .ok_or(BoardError::NotConfigured { instance })
    }

    /// Delete every document for an instance. Idempotent: removing an instance
    /// that was never configured succeeds.
    pub fn remove(&self, instance: InstanceId) -> Result<()> {
        remove_if_present(&self.config_path(instance))?;
        remove_if_present(&self.snapshot_path(instance))?;
        remove_if_present(&self.render_path(instance))?;
        Ok(())
    }

    /// Instance ids that currently have a stored config, ascending.
    pub fn configured_instances(&self) -> Result<Vec<InstanceId>> {
        let entries = fs::read_dir(&self.dir).map_err(|source| BoardError::io(&self.dir, source))?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| BoardError::io(&self.dir, source))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(id) = name
                .strip_prefix("display-")
                .and_then(|rest| rest.strip_suffix(".config.json"))
                .and_then(|id| id.parse::<InstanceId>().ok())
            {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }
}

// ──────────────────── document IO ────────────────────

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let body = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &body).map_err(|source| BoardError::io(&tmp, source))?;
    fs::rename(&tmp, path).map_err(|source| BoardError::io(path, source))?;
    Ok(())
}

fn read_json_opt<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(BoardError::io(path, source)),
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(BoardError::io(path, source)),
    }
}
