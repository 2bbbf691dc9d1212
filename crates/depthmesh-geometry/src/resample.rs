//! Nearest-neighbour color transfer onto reconstructed vertices.

use depthmesh_core::{DepthmeshError, Result};
use glam::Vec3;
use rstar::primitives::GeomWithData;
use rstar::RTree;

type IndexedPoint = GeomWithData<[f32; 3], usize>;

/// Colors vertices from the closest sample of a colored point set.
///
/// Output colors are copied, never blended, so every output color exists in
/// the source set.
pub struct ColorResampler<'a> {
    tree: RTree<IndexedPoint>,
    colors: &'a [[u8; 3]],
}

impl<'a> ColorResampler<'a> {
    /// Indexes `points`; `colors[i]` belongs to `points[i]`.
    pub fn new(points: &[Vec3], colors: &'a [[u8; 3]]) -> Result<Self> {
        if points.len() != colors.len() {
            return Err(DepthmeshError::SizeMismatch {
                expected: points.len(),
                actual: colors.len(),
            });
        }
        if points.is_empty() {
            return Err(DepthmeshError::ReconstructionFailed(
                "no colored samples to resample from".to_string(),
            ));
        }
        let entries = points
            .iter()
            .enumerate()
            .map(|(i, p)| IndexedPoint::new(p.to_array(), i))
            .collect();
        Ok(Self {
            tree: RTree::bulk_load(entries),
            colors,
        })
    }

    /// Index of the sample nearest to `query` (Euclidean).
    pub fn nearest(&self, query: Vec3) -> Option<usize> {
        self.tree
            .nearest_neighbor(&query.to_array())
            .map(|entry| entry.data)
    }

    /// One color per vertex, taken from its nearest sample.
    pub fn resample(&self, vertices: &[Vec3]) -> Result<Vec<[u8; 3]>> {
        vertices
            .iter()
            .map(|&v| {
                self.nearest(v).map(|i| self.colors[i]).ok_or_else(|| {
                    DepthmeshError::ReconstructionFailed(format!(
                        "no nearest sample for vertex {v}"
                    ))
                })
            })
            .collect()
    }
}
