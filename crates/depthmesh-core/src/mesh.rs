//! Output mesh value objects.

use glam::Vec3;

use crate::error::{DepthmeshError, Result};

/// A colored triangle mesh or point cloud.
///
/// `colors` always has one entry per vertex. `faces` is empty for point clouds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vec3>,
    faces: Vec<[u32; 3]>,
    colors: Vec<[u8; 3]>,
}

impl Mesh {
    /// Creates a mesh, validating colors and face indices.
    pub fn new(vertices: Vec<Vec3>, faces: Vec<[u32; 3]>, colors: Vec<[u8; 3]>) -> Result<Self> {
        if colors.len() != vertices.len() {
            return Err(DepthmeshError::SizeMismatch {
                expected: vertices.len(),
                actual: colors.len(),
            });
        }
        if let Some(&index) = faces
            .iter()
            .flatten()
            .find(|&&i| i as usize >= vertices.len())
        {
            return Err(DepthmeshError::FaceIndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }
        Ok(Self {
            vertices,
            faces,
            colors,
        })
    }

    /// Creates an unconnected colored point cloud.
    pub fn point_cloud(vertices: Vec<Vec3>, colors: Vec<[u8; 3]>) -> Result<Self> {
        Self::new(vertices, Vec::new(), colors)
    }

    /// Creates a point cloud, painting every vertex white when no colors are given.
    pub fn point_cloud_with_default_color(
        vertices: Vec<Vec3>,
        colors: Option<Vec<[u8; 3]>>,
    ) -> Result<Self> {
        let colors = colors.unwrap_or_else(|| vec![[255, 255, 255]; vertices.len()]);
        Self::point_cloud(vertices, colors)
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of triangles.
    #[must_use]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    #[must_use]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    #[must_use]
    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    #[must_use]
    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    /// True when the mesh has no connectivity.
    #[must_use]
    pub fn is_point_cloud(&self) -> bool {
        self.faces.is_empty()
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for an empty mesh.
    #[must_use]
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
        )
    }

    /// Splits the mesh into its parts.
    pub fn into_parts(self) -> (Vec<Vec3>, Vec<[u32; 3]>, Vec<[u8; 3]>) {
        (self.vertices, self.faces, self.colors)
    }
}

/// Why a build produced less than the requested surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    /// Too few valid points survived masking to attempt reconstruction.
    InsufficientPoints { found: usize, required: usize },
    /// The surface solver failed; the message carries the cause.
    SolverFailed(String),
}

/// How a [`Reconstruction`] was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildQuality {
    /// A reconstructed triangle surface.
    Surface,
    /// A point cloud, which is what the selected strategy produces.
    PointCloud,
    /// A point cloud returned in place of a surface.
    Degraded(DegradeReason),
}

/// The result of a geometry build: the mesh and how it was obtained.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub mesh: Mesh,
    pub quality: BuildQuality,
}

impl Reconstruction {
    pub fn surface(mesh: Mesh) -> Self {
        Self {
            mesh,
            quality: BuildQuality::Surface,
        }
    }

    pub fn point_cloud(mesh: Mesh) -> Self {
        Self {
            mesh,
            quality: BuildQuality::PointCloud,
        }
    }

    pub fn degraded(mesh: Mesh, reason: DegradeReason) -> Self {
        Self {
            mesh,
            quality: BuildQuality::Degraded(reason),
        }
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self.quality, BuildQuality::Degraded(_))
    }

    pub fn into_mesh(self) -> Mesh {
        self.mesh
    }
}
