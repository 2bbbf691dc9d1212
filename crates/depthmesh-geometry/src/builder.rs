//! Dispatch from raw model output to a reconstruction strategy.

use depthmesh_core::{
    DegradeReason, DepthmeshError, GrayImage, Grid, Mesh, OptionSet, PointMap, PointSet,
    RawModelOutput, Reconstruction, ReconstructionSettings, Result, RgbImage,
};
use glam::Vec3;

use crate::mask::MaskCompositor;
use crate::projector::CameraProjector;
use crate::resample::ColorResampler;
use crate::surface::SurfaceReconstructor;

/// Builds meshes from whatever shape an engine produced.
///
/// A builder holds only configuration; every call owns its intermediate data,
/// so one builder can serve any number of callers.
#[derive(Debug, Clone)]
pub struct GeometryBuilder {
    settings: ReconstructionSettings,
    projector: CameraProjector,
    compositor: MaskCompositor,
    reconstructor: SurfaceReconstructor,
}

impl Default for GeometryBuilder {
    fn default() -> Self {
        Self::new(ReconstructionSettings::default())
    }
}

impl GeometryBuilder {
    pub fn new(settings: ReconstructionSettings) -> Self {
        Self {
            projector: CameraProjector::new(settings.focal_factor),
            compositor: MaskCompositor::new(settings.mask_threshold),
            reconstructor: SurfaceReconstructor::from_settings(&settings),
            settings,
        }
    }

    pub fn settings(&self) -> &ReconstructionSettings {
        &self.settings
    }

    /// Builds a mesh from `raw`.
    ///
    /// Strategy order, first match wins:
    /// 1. `render_mode` with a point map: masked colored point cloud
    /// 2. depth map: back-projected point cloud
    /// 3. points with normals: Poisson surface
    /// 4. bare points: passthrough point cloud
    ///
    /// Returns `Ok(None)` for unrecognized output. Surface failures degrade to
    /// a point cloud instead of failing. Errors mean the inputs disagree in
    /// size (image vs. depth map, colors vs. points).
    pub fn build(
        &self,
        raw: &RawModelOutput,
        image: &RgbImage,
        fg_mask: Option<&GrayImage>,
        options: &OptionSet,
    ) -> Result<Option<Reconstruction>> {
        log::info!("building geometry from {}", raw.kind_name());

        let reconstruction = match raw {
            RawModelOutput::PointsAndNormals(map) if options.render_mode() => {
                log::info!("point cloud mode requested, skipping surface reconstruction");
                self.build_masked_point_cloud(map, image, fg_mask)?
            }
            RawModelOutput::DepthMap(depth) => {
                if options.render_mode() {
                    log::debug!("point cloud mode has no effect on depth maps");
                }
                self.build_from_depth_map(depth, image, options)?
            }
            RawModelOutput::PointsAndNormals(map) => {
                self.build_surface(map, image, fg_mask, options)?
            }
            RawModelOutput::PointsOnly(set) => Self::build_from_points(set)?,
            RawModelOutput::Unrecognized => {
                log::error!("unrecognized raw model output, no geometry built");
                return Ok(None);
            }
        };
        Ok(Some(reconstruction))
    }

    fn build_masked_point_cloud(
        &self,
        map: &PointMap,
        image: &RgbImage,
        fg_mask: Option<&GrayImage>,
    ) -> Result<Reconstruction> {
        let (points, _, colors) = self.select_valid(map, image, fg_mask, false)?;
        Ok(Reconstruction::point_cloud(Mesh::point_cloud(points, colors)?))
    }

    fn build_from_depth_map(
        &self,
        depth: &Grid<f32>,
        image: &RgbImage,
        options: &OptionSet,
    ) -> Result<Reconstruction> {
        let colors = pixel_colors(image, depth.dimensions())?;
        let depth_scale = options
            .depth_scale()
            .unwrap_or(self.settings.default_depth_scale);
        log::info!(
            "back-projecting {}x{} depth map (depth scale {depth_scale})",
            depth.width(),
            depth.height()
        );
        let points = self.projector.back_project(depth, depth_scale);
        Ok(Reconstruction::point_cloud(Mesh::point_cloud(
            points,
            colors.into_vec(),
        )?))
    }

    fn build_from_points(set: &PointSet) -> Result<Reconstruction> {
        log::info!("building from a bare point cloud ({} points)", set.points.len());
        let mesh = Mesh::point_cloud_with_default_color(set.points.clone(), set.colors.clone())?;
        Ok(Reconstruction::point_cloud(mesh))
    }

    fn build_surface(
        &self,
        map: &PointMap,
        image: &RgbImage,
        fg_mask: Option<&GrayImage>,
        options: &OptionSet,
    ) -> Result<Reconstruction> {
        let (points, normals, colors) = self.select_valid(map, image, fg_mask, true)?;

        let required = self.settings.min_surface_points;
        if points.len() < required {
            log::warn!(
                "only {} valid points (need {required}), returning a point cloud",
                points.len()
            );
            let found = points.len();
            return Ok(Reconstruction::degraded(
                Mesh::point_cloud(points, colors)?,
                DegradeReason::InsufficientPoints { found, required },
            ));
        }

        log::info!("running Poisson reconstruction on {} points", points.len());
        match self.reconstruct_colored(&points, &normals, &colors, options.quality_filters()) {
            Ok(mesh) => {
                log::info!(
                    "surface mesh built: {} vertices, {} faces",
                    mesh.num_vertices(),
                    mesh.num_faces()
                );
                Ok(Reconstruction::surface(mesh))
            }
            Err(err) => {
                log::error!("surface reconstruction failed: {err}; returning a point cloud");
                Ok(Reconstruction::degraded(
                    Mesh::point_cloud(points, colors)?,
                    DegradeReason::SolverFailed(err.to_string()),
                ))
            }
        }
    }

    fn reconstruct_colored(
        &self,
        points: &[Vec3],
        normals: &[Vec3],
        colors: &[[u8; 3]],
        quality_filters: bool,
    ) -> Result<Mesh> {
        let surface = self
            .reconstructor
            .reconstruct(points, normals, quality_filters)?;
        let vertex_colors = ColorResampler::new(points, colors)?.resample(&surface.vertices)?;
        Mesh::new(surface.vertices, surface.triangles, vertex_colors)
    }

    /// Points, normals (when wanted) and colors of pixels passing the combined mask.
    fn select_valid(
        &self,
        map: &PointMap,
        image: &RgbImage,
        fg_mask: Option<&GrayImage>,
        with_normals: bool,
    ) -> Result<(Vec<Vec3>, Vec<Vec3>, Vec<[u8; 3]>)> {
        let mask = self.compositor.combine(map.mask(), fg_mask);
        let colors = pixel_colors(image, mask.dimensions())?;
        let points = map.points().select(&mask)?;
        let normals = if with_normals {
            map.normals().select(&mask)?
        } else {
            Vec::new()
        };
        Ok((points, normals, colors.select(&mask)?))
    }
}

/// The image's pixels as a color grid, which must match `dimensions`.
fn pixel_colors(image: &RgbImage, dimensions: (u32, u32)) -> Result<Grid<[u8; 3]>> {
    if image.dimensions() != dimensions {
        return Err(DepthmeshError::SizeMismatch {
            expected: (dimensions.0 as usize) * (dimensions.1 as usize),
            actual: (image.width() as usize) * (image.height() as usize),
        });
    }
    Grid::from_vec(
        image.width(),
        image.height(),
        image.pixels().map(|p| p.0).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poisson::tests::sphere_samples;
    use depthmesh_core::BuildQuality;

    fn test_settings() -> ReconstructionSettings {
        ReconstructionSettings {
            poisson_depth: 5,
            solver_max_iterations: 300,
            solver_tolerance: 1e-5,
            ..Default::default()
        }
    }

    fn gradient_image(width: u32, height: u32) -> RgbImage {
        #[allow(clippy::cast_possible_truncation)]
        RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    /// A point map whose pixels sample a sphere; pixel i holds sample i.
    fn sphere_point_map(width: u32, height: u32) -> PointMap {
        let (points, normals) = sphere_samples((width * height) as usize, Vec3::ZERO, 1.0);
        PointMap::new(
            Grid::from_vec(width, height, points).unwrap(),
            Grid::from_vec(width, height, normals).unwrap(),
            Grid::filled(width, height, true),
        )
        .unwrap()
    }

    #[test]
    fn test_depth_map_path() {
        let depth = Grid::filled(64, 64, 0.5_f32);
        let raw = RawModelOutput::DepthMap(depth);
        let options = OptionSet::new().with("depth_scale", 2.0);
        let result = GeometryBuilder::default()
            .build(&raw, &gradient_image(64, 64), None, &options)
            .unwrap()
            .unwrap();

        assert_eq!(result.quality, BuildQuality::PointCloud);
        let mesh = result.mesh;
        assert_eq!(mesh.num_vertices(), 64 * 64);
        assert_eq!(mesh.num_faces(), 0);
        assert!(mesh.vertices().iter().all(|v| (v.z + 1.0).abs() < 1e-6));
        // Row-major: vertex (row 3, col 5) carries pixel (x 5, y 3)
        assert_eq!(mesh.colors()[3 * 64 + 5], [35, 39, 8]);
    }

    #[test]
    fn test_depth_map_default_scale() {
        let raw = RawModelOutput::DepthMap(Grid::filled(4, 4, 0.5_f32));
        let mesh = GeometryBuilder::default()
            .build(&raw, &gradient_image(4, 4), None, &OptionSet::new())
            .unwrap()
            .unwrap()
            .into_mesh();
        assert!(mesh.vertices().iter().all(|v| (v.z + 5.0).abs() < 1e-6));
    }

    #[test]
    fn test_render_mode_depth_map_still_back_projects() {
        let raw = RawModelOutput::DepthMap(Grid::filled(8, 6, 0.25_f32));
        let options = OptionSet::new()
            .with("render_mode", true)
            .with("depth_scale", 4.0);
        let result = GeometryBuilder::default()
            .build(&raw, &gradient_image(8, 6), None, &options)
            .unwrap()
            .unwrap();

        assert_eq!(result.quality, BuildQuality::PointCloud);
        assert_eq!(result.mesh.num_vertices(), 8 * 6);
        assert_eq!(result.mesh.num_faces(), 0);
        assert!(result.mesh.vertices().iter().all(|v| (v.z + 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_depth_map_image_size_mismatch_is_error() {
        let raw = RawModelOutput::DepthMap(Grid::filled(4, 4, 1.0_f32));
        let result =
            GeometryBuilder::default().build(&raw, &gradient_image(5, 4), None, &OptionSet::new());
        assert!(matches!(result, Err(DepthmeshError::SizeMismatch { .. })));
    }

    #[test]
    fn test_points_only_passthrough() {
        let raw = RawModelOutput::PointsOnly(PointSet::new(vec![Vec3::ZERO]));
        let result = GeometryBuilder::default()
            .build(&raw, &gradient_image(1, 1), None, &OptionSet::new())
            .unwrap()
            .unwrap();
        assert_eq!(result.mesh.num_vertices(), 1);
        assert_eq!(result.mesh.num_faces(), 0);
        assert_eq!(result.quality, BuildQuality::PointCloud);
    }

    #[test]
    fn test_points_only_keeps_colors() {
        let set = PointSet::new(vec![Vec3::ZERO, Vec3::X]).with_colors(vec![[1, 2, 3], [4, 5, 6]]);
        let mesh = GeometryBuilder::default()
            .build(
                &RawModelOutput::PointsOnly(set),
                &gradient_image(1, 1),
                None,
                &OptionSet::new().with("render_mode", true),
            )
            .unwrap()
            .unwrap()
            .into_mesh();
        assert_eq!(mesh.colors(), &[[1, 2, 3], [4, 5, 6]]);
    }

    #[test]
    fn test_unrecognized_returns_none() {
        let result = GeometryBuilder::default()
            .build(
                &RawModelOutput::Unrecognized,
                &gradient_image(1, 1),
                None,
                &OptionSet::new(),
            )
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_render_mode_selects_masked_points() {
        let map = sphere_point_map(20, 10);
        // Foreground covers the left half of a 40x20 mask
        let fg = GrayImage::from_fn(40, 20, |x, _| image::Luma([if x < 20 { 255 } else { 0 }]));
        let options = OptionSet::new().with("render_mode", true);
        let result = GeometryBuilder::new(test_settings())
            .build(
                &RawModelOutput::PointsAndNormals(map.clone()),
                &gradient_image(20, 10),
                Some(&fg),
                &options,
            )
            .unwrap()
            .unwrap();

        assert_eq!(result.quality, BuildQuality::PointCloud);
        assert_eq!(result.mesh.num_faces(), 0);
        assert_eq!(result.mesh.num_vertices(), 10 * 10);
        assert_eq!(result.mesh.vertices()[0], *map.points().get(0, 0).unwrap());
        assert_eq!(result.mesh.vertices()[10], *map.points().get(1, 0).unwrap());
    }

    #[test]
    fn test_few_points_fall_back_to_cloud() {
        let full = sphere_point_map(20, 10);
        // Only 50 valid pixels
        let mask = Grid::from_fn(20, 10, |row, col| row < 5 && col < 10);
        let map = PointMap::new(full.points().clone(), full.normals().clone(), mask).unwrap();

        let result = GeometryBuilder::new(test_settings())
            .build(
                &RawModelOutput::PointsAndNormals(map),
                &gradient_image(20, 10),
                None,
                &OptionSet::new(),
            )
            .unwrap()
            .unwrap();

        assert_eq!(
            result.quality,
            BuildQuality::Degraded(DegradeReason::InsufficientPoints {
                found: 50,
                required: 100
            })
        );
        assert_eq!(result.mesh.num_faces(), 0);
        assert_eq!(result.mesh.num_vertices(), 50);
    }

    #[test]
    fn test_surface_path_colors_from_input() {
        let image = gradient_image(40, 30);
        let result = GeometryBuilder::new(test_settings())
            .build(
                &RawModelOutput::PointsAndNormals(sphere_point_map(40, 30)),
                &image,
                None,
                &OptionSet::new(),
            )
            .unwrap()
            .unwrap();

        assert_eq!(result.quality, BuildQuality::Surface);
        let mesh = result.mesh;
        assert!(mesh.num_faces() > 0);
        assert_eq!(mesh.colors().len(), mesh.num_vertices());
        let input: Vec<[u8; 3]> = image.pixels().map(|p| p.0).collect();
        assert!(mesh.colors().iter().all(|c| input.contains(c)));
    }

    #[test]
    fn test_solver_failure_degrades() {
        // 120 coincident points: enough to try, no extent to solve on
        let map = PointMap::new(
            Grid::filled(12, 10, Vec3::ONE),
            Grid::filled(12, 10, Vec3::Z),
            Grid::filled(12, 10, true),
        )
        .unwrap();
        let result = GeometryBuilder::new(test_settings())
            .build(
                &RawModelOutput::PointsAndNormals(map),
                &gradient_image(12, 10),
                None,
                &OptionSet::new(),
            )
            .unwrap()
            .unwrap();

        assert!(result.is_degraded());
        assert!(matches!(
            result.quality,
            BuildQuality::Degraded(DegradeReason::SolverFailed(_))
        ));
        assert_eq!(result.mesh.num_vertices(), 120);
        assert_eq!(result.mesh.num_faces(), 0);
    }
}
