//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{BoardError, Result};

/// Full stopboard configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    pub refresh: RefreshConfig,
    pub paths: PathsConfig,
}

/// Refresh cadences and fetch window policy.
///
/// The two periods are deliberately independent: the local re-render keeps relative
/// "N min" labels current from the persisted snapshot, while the network refresh is
/// the only trigger that touches the prediction source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RefreshConfig {
    /// Period of the cheap local re-render trigger.
    pub local_render_secs: u64,
    /// Period of the network refresh trigger.
    pub network_fetch_secs: u64,
    /// First look-ahead window queried on a network refresh, in minutes.
    pub initial_window_minutes: u32,
    /// Increment applied when a window returns no arrivals.
    pub window_step_minutes: u32,
    /// Widening ceiling; an attempt that reaches this without data has failed.
    pub max_window_minutes: u32,
    /// Worker tick granularity. Triggers fire on the first tick at or after their
    /// period elapses, so timing is inexact by design.
    pub tick_millis: u64,
}

/// Filesystem paths used by stopboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    /// Directory holding per-instance config/snapshot/render documents.
    pub store_dir: PathBuf,
    pub jsonl_log: PathBuf,
    /// Stop catalog consumed by the picker merge.
    pub catalog_file: PathBuf,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            local_render_secs: 60,
            network_fetch_secs: 300,
            initial_window_minutes: 65,
            window_step_minutes: 60,
            max_window_minutes: 1440,
            tick_millis: 1_000,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!(
                    "[SBD-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths"
                );
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        let cfg = home_dir
            .join(".config")
            .join("stopboard")
            .join("config.toml");
        let data = home_dir.join(".local").join("share").join("stopboard");
        Self {
            config_file: cfg,
            store_dir: data.join("displays"),
            jsonl_log: data.join("activity.jsonl"),
            catalog_file: data.join("stops.json"),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| BoardError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(BoardError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        set_env_u64(
            "SBD_REFRESH_LOCAL_RENDER_SECS",
            &mut self.refresh.local_render_secs,
        )?;
        set_env_u64(
            "SBD_REFRESH_NETWORK_FETCH_SECS",
            &mut self.refresh.network_fetch_secs,
        )?;
        set_env_u32(
            "SBD_REFRESH_INITIAL_WINDOW_MINUTES",
            &mut self.refresh.initial_window_minutes,
        )?;
        set_env_u32(
            "SBD_REFRESH_WINDOW_STEP_MINUTES",
            &mut self.refresh.window_step_minutes,
        )?;
        set_env_u32(
            "SBD_REFRESH_MAX_WINDOW_MINUTES",
            &mut self.refresh.max_window_minutes,
        )?;
        set_env_u64("SBD_REFRESH_TICK_MILLIS", &mut self.refresh.tick_millis)?;

        if let Some(raw) = env_var("SBD_PATHS_STORE_DIR") {
            self.paths.store_dir = PathBuf::from(raw);
        }
        if let Some(raw) = env_var("SBD_PATHS_JSONL_LOG") {
            self.paths.jsonl_log = PathBuf::from(raw);
        }
        if let Some(raw) = env_var("SBD_PATHS_CATALOG_FILE") {
            self.paths.catalog_file = PathBuf::from(raw);
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.refresh.local_render_secs == 0 {
            return Err(BoardError::InvalidConfig {
                details: "refresh.local_render_secs must be >= 1".to_string(),
            });
        }
        if self.refresh.network_fetch_secs == 0 {
            return Err(BoardError::InvalidConfig {
                details: "refresh.network_fetch_secs must be >= 1".to_string(),
            });
        }
        if self.refresh.tick_millis == 0 {
            return Err(BoardError::InvalidConfig {
                details: "refresh.tick_millis must be >= 1".to_string(),
            });
        }
        if self.refresh.initial_window_minutes == 0 {
            return Err(BoardError::InvalidConfig {
                details: "refresh.initial_window_minutes must be >= 1".to_string(),
            });
        }
        if self.refresh.window_step_minutes == 0 {
            return Err(BoardError::InvalidConfig {
                details: "refresh.window_step_minutes must be >= 1".to_string(),
            });
        }
        if self.refresh.max_window_minutes < self.refresh.initial_window_minutes {
            return Err(BoardError::InvalidConfig {
                details: format!(
                    "refresh.max_window_minutes ({}) must be >= initial_window_minutes ({})",
                    self.refresh.max_window_minutes, self.refresh.initial_window_minutes
                ),
            });
        }
        Ok(())
    }
}

// ──────────────────── env parsing helpers ────────────────────

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn set_env_u64(name: &str, target: &mut u64) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *target = raw.parse().map_err(|_| BoardError::InvalidConfig {
            details: format!("{name} must be an unsigned integer, got {raw:?}"),
        })?;
    }
    Ok(())
}

fn set_env_u32(name: &str, target: &mut u32) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *target = raw.parse().map_err(|_| BoardError::InvalidConfig {
            details: format!("{name} must be an unsigned integer, got {raw:?}"),
        })?;
    }
    Ok(())
}
