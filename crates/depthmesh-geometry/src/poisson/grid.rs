//! Uniform cubic grid over a point set's bounding box.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]

use glam::Vec3;

/// A cubic lattice of `n^3` nodes covering a padded bounding box.
///
/// Node (x, y, z) is stored at `(z * n + y) * n + x`, the layout
/// [`extract_isosurface`](depthmesh_core::extract_isosurface) expects.
#[derive(Debug, Clone, Copy)]
pub struct Lattice {
    pub origin: Vec3,
    pub spacing: f32,
    pub n: usize,
}

impl Lattice {
    /// Fits a lattice around `points`, padding each side by `padding` times the
    /// largest extent. Returns `None` for empty or degenerate (single point) input.
    pub fn fit(points: &[Vec3], n: usize, padding: f32) -> Option<Self> {
        let first = *points.first()?;
        let (lo, hi) = points
            .iter()
            .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p)));
        let extent = (hi - lo).max_element();
        if !extent.is_finite() || extent <= f32::EPSILON || n < 2 {
            return None;
        }
        let size = extent * (1.0 + 2.0 * padding);
        let center = (lo + hi) * 0.5;
        Some(Self {
            origin: center - Vec3::splat(size * 0.5),
            spacing: size / (n - 1) as f32,
            n,
        })
    }

    pub fn node_count(&self) -> usize {
        self.n * self.n * self.n
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.n + y) * self.n + x
    }

    /// Continuous lattice coordinates of a world-space point.
    #[inline]
    pub fn to_lattice(&self, p: Vec3) -> Vec3 {
        (p - self.origin) / self.spacing
    }

    /// The eight nodes around `g` (lattice coordinates) with trilinear weights.
    ///
    /// Coordinates are clamped into the lattice.
    pub fn trilinear(&self, g: Vec3) -> [(usize, f32); 8] {
        let max = (self.n - 1) as f32;
        let g = g.clamp(Vec3::ZERO, Vec3::splat(max));
        let base = g.floor().min(Vec3::splat(max - 1.0));
        let f = g - base;
        let (bx, by, bz) = (base.x as usize, base.y as usize, base.z as usize);

        let mut out = [(0, 0.0); 8];
        for (i, slot) in out.iter_mut().enumerate() {
            let (dx, dy, dz) = (i & 1, (i >> 1) & 1, (i >> 2) & 1);
            let w = if dx == 1 { f.x } else { 1.0 - f.x }
                * if dy == 1 { f.y } else { 1.0 - f.y }
                * if dz == 1 { f.z } else { 1.0 - f.z };
            *slot = (self.index(bx + dx, by + dy, bz + dz), w);
        }
        out
    }

    /// Trilinearly interpolates `field` at lattice coordinates `g`.
    pub fn sample(&self, field: &[f32], g: Vec3) -> f32 {
        self.trilinear(g)
            .iter()
            .map(|&(index, w)| field[index] * w)
            .sum()
    }

    /// Whether the node lies on the lattice boundary.
    #[inline]
    pub fn is_boundary(&self, x: usize, y: usize, z: usize) -> bool {
        let last = self.n - 1;
        x == 0 || y == 0 || z == 0 || x == last || y == last || z == last
    }
}

/// Smooths a scalar field in place with a separable `[1, 2, 1] / 4` kernel.
pub fn smooth(lattice: &Lattice, field: &mut [f32]) {
    let n = lattice.n;
    let mut scratch = vec![0.0_f32; field.len()];
    for axis in 0..3 {
        let stride = [1, n, n * n][axis];
        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    let coord = [x, y, z][axis];
                    let i = lattice.index(x, y, z);
                    let prev = if coord > 0 { field[i - stride] } else { field[i] };
                    let next = if coord + 1 < n { field[i + stride] } else { field[i] };
                    scratch[i] = 0.25 * prev + 0.5 * field[i] + 0.25 * next;
                }
            }
        }
        field.copy_from_slice(&scratch);
    }
}
