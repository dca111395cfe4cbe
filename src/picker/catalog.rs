//! Stop catalog: the flat set of known stops with per-stop usage bookkeeping.
//!
//! The catalog is a single JSON file maintained outside the refresh path; the
//! picker reads it whole and queries it in memory.

#![allow(missing_docs)]

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::{BoardError, Result};

/// One known stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopEntry {
    pub stop_id: String,
    pub name: String,
    /// Compass direction of travel shown under the name, e.g. "Northbound".
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub favorite: bool,
    /// Unix ms of the last time the user picked this stop; 0 = never.
    #[serde(default)]
    pub last_access_ms: i64,
    #[serde(default)]
    pub use_count: u32,
    #[serde(default)]
    pub region_id: Option<String>,
}

/// The full catalog document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopCatalog {
    pub stops: Vec<StopEntry>,
}

impl StopCatalog {
    /// Load the catalog from a JSON file. A missing file is an empty catalog.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => return Err(BoardError::io(path, source)),
        };
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_empty_catalog() {
        let dir = tempfile::tempdir().expect("tempdir");
        let catalog = StopCatalog::load(&dir.path().join("stops.json")).expect("load");
        assert!(catalog.stops.is_empty());
    }

    #[test]
    fn optional_fields_default() {
        let json = r#"{"stops":[{"stop_id":"1_75403","name":"3rd Ave & Pike St"}]}"#;
        let catalog: StopCatalog = serde_json::from_str(json).expect("parse");
        let stop = &catalog.stops[0];
        assert!(!stop.favorite);
        assert_eq!(stop.last_access_ms, 0);
        assert_eq!(stop.use_count, 0);
        assert!(stop.direction.is_none());
    }

    #[test]
    fn load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stops.json");
        let catalog = StopCatalog {
            stops: vec![StopEntry {
                stop_id: "1_100".to_string(),
                name: "Broadway & Pine".to_string(),
                direction: Some("Northbound".to_string()),
                favorite: true,
                last_access_ms: 1_700_000_000_000,
                use_count: 4,
                region_id: Some("1".to_string()),
            }],
        };
        fs::write(&path, serde_json::to_vec(&catalog).expect("serialize")).expect("write");
        assert_eq!(StopCatalog::load(&path).expect("load"), catalog);
    }
}
