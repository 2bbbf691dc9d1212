//! Pipeline configuration.

use std::path::Path;

use depthmesh_core::{ReconstructionSettings, Result};
use serde::{Deserialize, Serialize};

/// Configuration for a [`Pipeline`](crate::Pipeline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Finished meshes kept in memory.
    pub mesh_cache_capacity: usize,
    /// Raw engine outputs kept in memory. These are large, so fewer are kept.
    pub raw_cache_capacity: usize,
    pub settings: ReconstructionSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mesh_cache_capacity: 32,
            raw_cache_capacity: 16,
            settings: ReconstructionSettings::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        log::debug!("loaded pipeline config from {}", path.as_ref().display());
        Ok(config)
    }
}
