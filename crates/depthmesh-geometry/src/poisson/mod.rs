//! Poisson surface reconstruction on a uniform grid.
//!
//! Oriented samples are splatted into a smoothed vector field `V` on a cubic
//! lattice around the input. The implicit function `chi` with
//! `laplacian(chi) = div(V)` is solved with conjugate gradients, and the
//! surface is the level set of `chi` at its mean value over the samples.
//!
//! Alongside the surface, every output vertex gets a density: the smoothed
//! sample weight interpolated at the vertex. Densities are near zero where the
//! solver closed the surface without any input nearby.

#![allow(clippy::cast_precision_loss)]

pub mod grid;
pub mod solver;

use depthmesh_core::{
    extract_isosurface, DepthmeshError, ReconstructionSettings, Result,
};
use glam::Vec3;

use crate::components::TriMesh;
use grid::{smooth, Lattice};

/// Fraction of the input extent added on every side of the lattice.
const PADDING: f32 = 0.15;

/// A reconstructed surface with one density value per vertex.
#[derive(Debug, Clone)]
pub struct PoissonSurface {
    pub mesh: TriMesh,
    pub densities: Vec<f32>,
}

/// Solver configuration.
#[derive(Debug, Clone, Copy)]
pub struct PoissonSolver {
    resolution: usize,
    max_iterations: usize,
    tolerance: f64,
}

impl PoissonSolver {
    /// `resolution` is the number of lattice nodes per edge.
    pub fn new(resolution: usize, max_iterations: usize, tolerance: f64) -> Self {
        Self {
            resolution: resolution.max(4),
            max_iterations,
            tolerance,
        }
    }

    pub fn from_settings(settings: &ReconstructionSettings) -> Self {
        Self::new(
            settings.grid_resolution() as usize,
            settings.solver_max_iterations,
            settings.solver_tolerance,
        )
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Reconstructs a surface from points and their outward unit normals.
    pub fn reconstruct(&self, points: &[Vec3], normals: &[Vec3]) -> Result<PoissonSurface> {
        if points.len() != normals.len() {
            return Err(DepthmeshError::SizeMismatch {
                expected: points.len(),
                actual: normals.len(),
            });
        }
        if points.is_empty() {
            return Err(DepthmeshError::ReconstructionFailed(
                "no input points".to_string(),
            ));
        }
        if points
            .iter()
            .chain(normals)
            .any(|v| !v.is_finite())
        {
            return Err(DepthmeshError::ReconstructionFailed(
                "non-finite input".to_string(),
            ));
        }
        let lattice = Lattice::fit(points, self.resolution, PADDING).ok_or_else(|| {
            DepthmeshError::ReconstructionFailed("input has no spatial extent".to_string())
        })?;

        let (field, density) = splat(&lattice, points, normals);
        let rhs = divergence_rhs(&lattice, &field);

        let (chi, stats) = solver::solve(&lattice, &rhs, self.max_iterations, self.tolerance);
        if stats.converged {
            log::debug!(
                "poisson solve converged in {} iterations (residual {:.2e})",
                stats.iterations,
                stats.relative_residual
            );
        } else {
            log::warn!(
                "poisson solve stopped after {} iterations (residual {:.2e})",
                stats.iterations,
                stats.relative_residual
            );
        }
        if chi.iter().any(|v| !v.is_finite()) {
            return Err(DepthmeshError::ReconstructionFailed(
                "solver diverged".to_string(),
            ));
        }

        let iso = points
            .iter()
            .map(|&p| f64::from(lattice.sample(&chi, lattice.to_lattice(p))))
            .sum::<f64>()
            / points.len() as f64;

        #[allow(clippy::cast_possible_truncation)]
        let mut surface = extract_isosurface(&chi, [lattice.n; 3], iso as f32)?;
        if surface.is_empty() {
            return Err(DepthmeshError::ReconstructionFailed(
                "no surface extracted".to_string(),
            ));
        }

        let densities = surface
            .vertices
            .iter()
            .map(|&g| lattice.sample(&density, g))
            .collect();
        surface.transform(lattice.origin, lattice.spacing);

        log::info!(
            "poisson surface: {} vertices, {} triangles on a {}^3 grid",
            surface.vertices.len(),
            surface.triangles.len(),
            lattice.n
        );
        Ok(PoissonSurface {
            mesh: TriMesh::new(surface.vertices, surface.triangles),
            densities,
        })
    }
}

/// Splats normals and sample weights onto the lattice, then smooths both.
fn splat(lattice: &Lattice, points: &[Vec3], normals: &[Vec3]) -> ([Vec<f32>; 3], Vec<f32>) {
    let len = lattice.node_count();
    let mut field = [vec![0.0_f32; len], vec![0.0_f32; len], vec![0.0_f32; len]];
    let mut density = vec![0.0_f32; len];

    for (&p, &normal) in points.iter().zip(normals) {
        let normal = normal.normalize_or_zero();
        for (index, w) in lattice.trilinear(lattice.to_lattice(p)) {
            field[0][index] += w * normal.x;
            field[1][index] += w * normal.y;
            field[2][index] += w * normal.z;
            density[index] += w;
        }
    }

    for component in &mut field {
        smooth(lattice, component);
    }
    smooth(lattice, &mut density);
    (field, density)
}

/// Right-hand side `-h^2 * div(V)` by central differences; zero on the boundary.
fn divergence_rhs(lattice: &Lattice, field: &[Vec<f32>; 3]) -> Vec<f32> {
    let n = lattice.n;
    let strides = [1, n, n * n];
    let scale = -0.5 * lattice.spacing;
    let mut rhs = vec![0.0_f32; lattice.node_count()];
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                if lattice.is_boundary(x, y, z) {
                    continue;
                }
                let i = lattice.index(x, y, z);
                let diff: f32 = strides
                    .iter()
                    .zip(field)
                    .map(|(&s, component)| component[i + s] - component[i - s])
                    .sum();
                rhs[i] = scale * diff;
            }
        }
    }
    rhs
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Points on a sphere with outward normals (Fibonacci lattice).
    pub(crate) fn sphere_samples(count: usize, center: Vec3, radius: f32) -> (Vec<Vec3>, Vec<Vec3>) {
        let golden = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
        let mut points = Vec::with_capacity(count);
        let mut normals = Vec::with_capacity(count);
        for i in 0..count {
            let y = 1.0 - 2.0 * (i as f32 + 0.5) / count as f32;
            let r = (1.0 - y * y).sqrt();
            let theta = golden * i as f32;
            let n = Vec3::new(r * theta.cos(), y, r * theta.sin());
            points.push(center + n * radius);
            normals.push(n);
        }
        (points, normals)
    }

    #[test]
    fn test_sphere_reconstruction() {
        let center = Vec3::new(0.5, -1.0, 2.0);
        let (points, normals) = sphere_samples(2000, center, 1.0);
        let surface = PoissonSolver::new(32, 400, 1e-5)
            .reconstruct(&points, &normals)
            .unwrap();

        assert!(surface.mesh.triangles.len() > 200);
        assert_eq!(surface.densities.len(), surface.mesh.vertices.len());

        let radii: Vec<f32> = surface
            .mesh
            .vertices
            .iter()
            .map(|v| (*v - center).length())
            .collect();
        let mean = radii.iter().sum::<f32>() / radii.len() as f32;
        assert!((mean - 1.0).abs() < 0.2, "mean radius {mean}");
        assert!(radii.iter().all(|r| (r - 1.0).abs() < 0.5));
        assert!(surface.densities.iter().all(|&d| d >= 0.0));
    }

    #[test]
    fn test_rejects_bad_input() {
        let solver = PoissonSolver::new(16, 50, 1e-5);
        assert!(matches!(
            solver.reconstruct(&[], &[]),
            Err(DepthmeshError::ReconstructionFailed(_))
        ));
        assert!(matches!(
            solver.reconstruct(&[Vec3::ZERO], &[]),
            Err(DepthmeshError::SizeMismatch { .. })
        ));
        assert!(matches!(
            solver.reconstruct(&[Vec3::ONE; 5], &[Vec3::Z; 5]),
            Err(DepthmeshError::ReconstructionFailed(_))
        ));
        assert!(matches!(
            solver.reconstruct(&[Vec3::ZERO, Vec3::splat(f32::NAN)], &[Vec3::Z; 2]),
            Err(DepthmeshError::ReconstructionFailed(_))
        ));
    }
}
