//! JSON configuration shared by the library helpers and the CLI.

use std::fs;
use std::path::Path;

use padcheck_detect::PadDetectorParams;
use padcheck_validate::ValidationParams;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum ConfigIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Detector and validation tunables. Every field is optional in the JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PadcheckConfig {
    #[serde(default)]
    pub detector: PadDetectorParams,
    #[serde(default)]
    pub validation: ValidationParams,
}

impl PadcheckConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
