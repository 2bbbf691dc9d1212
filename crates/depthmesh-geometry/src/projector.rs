//! Pinhole back-projection of depth maps.

use depthmesh_core::Grid;
use glam::{Vec2, Vec3};

/// Pinhole camera intrinsics in pixel units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeIntrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

impl PinholeIntrinsics {
    /// Heuristic intrinsics for an uncalibrated image: square pixels, focal
    /// length `focal_factor * width`, principal point at the image center.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_image_size(width: u32, height: u32, focal_factor: f32) -> Self {
        let f = focal_factor * width as f32;
        Self {
            fx: f,
            fy: f,
            cx: width as f32 / 2.0,
            cy: height as f32 / 2.0,
        }
    }

    /// Horizontal field of view in degrees for an image `width` pixels wide.
    #[allow(clippy::cast_precision_loss)]
    pub fn horizontal_fov_degrees(&self, width: u32) -> f32 {
        (2.0 * (width as f32 / (2.0 * self.fx)).atan()).to_degrees()
    }

    /// Planar camera-space coordinates of pixel (`row`, `col`) at `depth`.
    #[allow(clippy::cast_precision_loss)]
    pub fn unproject_planar(&self, row: u32, col: u32, depth: f32) -> Vec2 {
        Vec2::new(
            (col as f32 - self.cx) * depth / self.fx,
            (row as f32 - self.cy) * depth / self.fy,
        )
    }
}

/// Turns depth maps into point clouds.
#[derive(Debug, Clone, Copy)]
pub struct CameraProjector {
    focal_factor: f32,
}

impl Default for CameraProjector {
    fn default() -> Self {
        Self::new(1.2)
    }
}

impl CameraProjector {
    pub fn new(focal_factor: f32) -> Self {
        Self { focal_factor }
    }

    /// Intrinsics used for a depth map of this size.
    pub fn intrinsics_for(&self, depth: &Grid<f32>) -> PinholeIntrinsics {
        PinholeIntrinsics::from_image_size(depth.width(), depth.height(), self.focal_factor)
    }

    /// Back-projects every pixel, row-major, one point per pixel.
    ///
    /// X and Y use the unscaled depth so the silhouette does not change with
    /// `depth_scale`; only Z is scaled. Z is negated so depth points away from
    /// the viewer.
    pub fn back_project(&self, depth: &Grid<f32>, depth_scale: f32) -> Vec<Vec3> {
        let intrinsics = self.intrinsics_for(depth);
        let width = depth.width().max(1);
        depth
            .iter()
            .enumerate()
            .map(|(index, &d)| {
                #[allow(clippy::cast_possible_truncation)]
                let (row, col) = ((index / width as usize) as u32, (index % width as usize) as u32);
                let planar = intrinsics.unproject_planar(row, col, d);
                planar.extend(-(d * depth_scale))
            })
            .collect()
    }
}
