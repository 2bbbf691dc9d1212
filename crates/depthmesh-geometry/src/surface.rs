//! Surface reconstruction: Poisson solve, density pruning, dominant component.

use depthmesh_core::{DepthmeshError, ReconstructionSettings, Result};
use glam::Vec3;

use crate::components::TriMesh;
use crate::poisson::PoissonSolver;

/// Value at quantile `q` (0..=1), linearly interpolated between order statistics.
///
/// Returns `None` for empty input.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn quantile(values: &[f32], q: f64) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let frac = (position - lower as f64) as f32;
    Some(sorted[lower] + frac * (sorted[upper] - sorted[lower]))
}

/// Removes every vertex whose density is at or below the `q` quantile.
///
/// Returns the number of vertices removed.
pub fn filter_by_density(mesh: &mut TriMesh, densities: &[f32], q: f64) -> usize {
    let Some(threshold) = quantile(densities, q) else {
        return 0;
    };
    let keep: Vec<bool> = densities.iter().map(|&d| d > threshold).collect();
    let before = mesh.vertices.len();
    mesh.retain_vertices(&keep);
    before - mesh.vertices.len()
}

/// Turns an oriented point set into a single connected triangle surface.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceReconstructor {
    solver: PoissonSolver,
    density_quantile: f64,
}

impl SurfaceReconstructor {
    pub fn new(solver: PoissonSolver, density_quantile: f64) -> Self {
        Self {
            solver,
            density_quantile,
        }
    }

    pub fn from_settings(settings: &ReconstructionSettings) -> Self {
        Self::new(
            PoissonSolver::from_settings(settings),
            settings.density_filter_quantile,
        )
    }

    /// Runs Poisson reconstruction, optionally prunes low-density vertices,
    /// and keeps the component with the most faces.
    ///
    /// Fails when the solver fails or nothing with faces survives.
    pub fn reconstruct(
        &self,
        points: &[Vec3],
        normals: &[Vec3],
        quality_filters: bool,
    ) -> Result<TriMesh> {
        let surface = self.solver.reconstruct(points, normals)?;
        let mut mesh = surface.mesh;

        if quality_filters {
            let removed = filter_by_density(&mut mesh, &surface.densities, self.density_quantile);
            log::info!(
                "quality filter removed {removed} low-density vertices (quantile {})",
                self.density_quantile
            );
        }

        mesh.keep_largest_component().ok_or_else(|| {
            DepthmeshError::ReconstructionFailed("no faces left after filtering".to_string())
        })?;
        Ok(mesh)
    }
}
