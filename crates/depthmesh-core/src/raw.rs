//! Raw outputs produced by inference engines.
//!
//! Every engine reduces its model's native output to one of the shapes in
//! [`RawModelOutput`]. The geometry builder matches on the variant instead of
//! probing for fields, so an output can never be two shapes at once.

use glam::Vec3;

use crate::error::{DepthmeshError, Result};
use crate::grid::Grid;

/// Per-pixel points, normals and validity from a point-map model.
///
/// All three grids share the processed image's pixel layout.
#[derive(Debug, Clone)]
pub struct PointMap {
    points: Grid<Vec3>,
    normals: Grid<Vec3>,
    mask: Grid<bool>,
}

impl PointMap {
    /// Creates a point map, checking that the three grids are pixel-aligned.
    pub fn new(points: Grid<Vec3>, normals: Grid<Vec3>, mask: Grid<bool>) -> Result<Self> {
        for other in [normals.len(), mask.len()] {
            if other != points.len() {
                return Err(DepthmeshError::SizeMismatch {
                    expected: points.len(),
                    actual: other,
                });
            }
        }
        if !points.same_shape(&normals) || !points.same_shape(&mask) {
            return Err(DepthmeshError::InvalidDimensions {
                width: normals.width(),
                height: normals.height(),
            });
        }
        Ok(Self {
            points,
            normals,
            mask,
        })
    }

    pub fn points(&self) -> &Grid<Vec3> {
        &self.points
    }

    pub fn normals(&self) -> &Grid<Vec3> {
        &self.normals
    }

    /// Pixels for which the model produced a valid point.
    pub fn mask(&self) -> &Grid<bool> {
        &self.mask
    }
}

/// An unordered point cloud with optional per-point colors.
#[derive(Debug, Clone, Default)]
pub struct PointSet {
    pub points: Vec<Vec3>,
    pub colors: Option<Vec<[u8; 3]>>,
}

impl PointSet {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self {
            points,
            colors: None,
        }
    }

    /// Attaches one color per point.
    #[must_use]
    pub fn with_colors(mut self, colors: Vec<[u8; 3]>) -> Self {
        self.colors = Some(colors);
        self
    }
}

/// The raw data an engine hands to the geometry builder.
#[derive(Debug, Clone)]
pub enum RawModelOutput {
    /// Scalar depth per pixel of the processed image.
    DepthMap(Grid<f32>),
    /// Pixel-aligned points with unit normals and a validity mask.
    PointsAndNormals(PointMap),
    /// Bare points, possibly colored.
    PointsOnly(PointSet),
    /// The engine produced something the builder has no strategy for.
    Unrecognized,
}

impl RawModelOutput {
    /// Whether the output carries a point field.
    pub fn has_points(&self) -> bool {
        matches!(self, Self::PointsAndNormals(_) | Self::PointsOnly(_))
    }

    /// Short name used in log messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::DepthMap(_) => "depth map",
            Self::PointsAndNormals(_) => "points and normals",
            Self::PointsOnly(_) => "points only",
            Self::Unrecognized => "unrecognized",
        }
    }
}
