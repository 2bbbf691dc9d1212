//! Reconstruction settings.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tuning constants for geometry reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionSettings {
    /// Poisson reconstruction depth. The solver grid has `2^depth` nodes per
    /// edge, capped by `max_grid_resolution`.
    pub poisson_depth: u32,

    /// Upper bound on solver grid nodes per edge.
    pub max_grid_resolution: u32,

    /// Vertices at or below this density quantile are removed when quality
    /// filters are on.
    pub density_filter_quantile: f64,

    /// Fewer valid points than this skips surface reconstruction.
    pub min_surface_points: usize,

    /// Conjugate-gradient iteration cap for the Poisson solve.
    pub solver_max_iterations: usize,

    /// Relative residual at which the Poisson solve stops.
    pub solver_tolerance: f64,

    /// Depth scale used when a request does not set `depth_scale`.
    pub default_depth_scale: f32,

    /// Focal length in pixels as a multiple of image width. Not calibrated
    /// per camera.
    pub focal_factor: f32,

    /// Foreground mask values above this count as foreground.
    pub mask_threshold: u8,
}

impl Default for ReconstructionSettings {
    fn default() -> Self {
        Self {
            poisson_depth: 9,
            max_grid_resolution: 128,
            density_filter_quantile: 0.01,
            min_surface_points: 100,
            solver_max_iterations: 400,
            solver_tolerance: 1e-6,
            default_depth_scale: 10.0,
            focal_factor: 1.2,
            mask_threshold: 128,
        }
    }
}

impl ReconstructionSettings {
    /// Parses settings from JSON; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json_str(&text)?;
        log::debug!("loaded reconstruction settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Solver grid nodes per edge for the configured depth.
    pub fn grid_resolution(&self) -> u32 {
        let full = 1_u32.checked_shl(self.poisson_depth).unwrap_or(u32::MAX);
        full.min(self.max_grid_resolution).max(8)
    }
}
