use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::{Result, SyncError};

/// Where records come from: the remote tabular data API plus the credentials
/// and part scoping used against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    pub app_url: String,
    pub organization_id: String,
    pub part_id: String,
    pub api_key_id: String,
    pub api_key_value: String,
}

/// Where records go: the local MongoDB plus the identifiers stamped onto
/// every synced document so the destination collection is self-describing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataDestination {
    pub mongodb_url: String,
    pub organization_id: String,
    pub location_id: String,
    pub machine_id: String,
    pub part_id: String,
}

/// Immutable configuration for one sync run, read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub source: DataSource,
    pub destination: DataDestination,
    pub sync_back_n_days: f64,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("error opening config file {}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| SyncError::Config(format!("error decoding config file {}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Resolve the config path from process arguments: exactly one argument,
    /// the path to the JSON config file.
    pub fn path_from_args(args: &[String]) -> Result<&str> {
        match args {
            [_, path] => Ok(path.as_str()),
            _ => Err(SyncError::Config(format!(
                "expected path to config file, got {} arguments",
                args.len().saturating_sub(1)
            ))),
        }
    }
}
