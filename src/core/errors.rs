//! SBD-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, BoardError>;

/// Top-level error type for stopboard.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("[SBD-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[SBD-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[SBD-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[SBD-2001] display instance {instance} has no stored config")]
    NotConfigured { instance: u32 },

    #[error("[SBD-2002] unknown or removed display instance {instance}")]
    InvalidInstance { instance: u32 },

    #[error("[SBD-2101] prediction fetch failed for stop {stop_id}: {details}")]
    FetchFailed { stop_id: String, details: String },

    #[error("[SBD-2201] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[SBD-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[SBD-3003] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[SBD-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl BoardError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "SBD-1001",
            Self::MissingConfig { .. } => "SBD-1002",
            Self::ConfigParse { .. } => "SBD-1003",
            Self::NotConfigured { .. } => "SBD-2001",
            Self::InvalidInstance { .. } => "SBD-2002",
            Self::FetchFailed { .. } => "SBD-2101",
            Self::Serialization { .. } => "SBD-2201",
            Self::Io { .. } => "SBD-3002",
            Self::ChannelClosed { .. } => "SBD-3003",
            Self::Runtime { .. } => "SBD-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    ///
    /// `FetchFailed` is retryable by contract: the last good snapshot is kept and the
    /// next periodic or manual trigger attempts again. `NotConfigured` and
    /// `InvalidInstance` are terminal until the user acts.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::FetchFailed { .. }
                | Self::Io { .. }
                | Self::ChannelClosed { .. }
                | Self::Runtime { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for BoardError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for BoardError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
