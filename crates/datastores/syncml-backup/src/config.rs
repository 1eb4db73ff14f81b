//! On-disk layout configuration for the backup plugin.
//!
//! Grounded on `sync_dbapi_text.cpp`'s `P_Device`/`P_Data` file-name
//! prefixes: one tab-separated file per (role, device, user,
//! datastore) quadruple, all living under a single base directory.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct BackupConfig {
    /// Directory holding all data/map/admin files for every
    /// (device, user, datastore) triple this plugin instance serves.
    pub base_dir: PathBuf,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            base_dir: std::env::temp_dir().join("syncml-backup"),
        }
    }
}

impl BackupConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}
