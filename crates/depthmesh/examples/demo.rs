//! Demo showing basic depthmesh usage.
//!
//! Two synthetic engines stand in for real models: one predicts a depth map
//! with a bump in the middle, the other a point map sampling a sphere. Both
//! results are written as PLY files to the current directory.

use depthmesh::*;

/// Depth map of a plane with a bump in the middle.
struct BumpDepth;

impl Engine for BumpDepth {
    fn name(&self) -> &str {
        "bump"
    }

    fn process(&mut self, image: &RgbImage, _: &OptionSet) -> Result<RawModelOutput> {
        let (w, h) = (image.width() as f32, image.height() as f32);
        let depth = Grid::from_fn(image.width(), image.height(), |row, col| {
            let dx = col as f32 / w - 0.5;
            let dy = row as f32 / h - 0.5;
            1.0 - 0.3 * (-(dx * dx + dy * dy) * 20.0).exp()
        });
        Ok(RawModelOutput::DepthMap(normalize_depth(&depth)))
    }
}

/// Point map of a unit sphere, one sample per pixel, with outward normals.
struct SpherePoints;

impl Engine for SpherePoints {
    fn name(&self) -> &str {
        "sphere"
    }

    fn process(&mut self, image: &RgbImage, _: &OptionSet) -> Result<RawModelOutput> {
        let (w, h) = image.dimensions();
        let normals = Grid::from_fn(w, h, |row, col| {
            let theta = std::f32::consts::PI * (row as f32 + 0.5) / h as f32;
            let phi = 2.0 * std::f32::consts::PI * col as f32 / w as f32;
            Vec3::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos())
        });
        let map = PointMap::new(normals.clone(), normals, Grid::filled(w, h, true))?;
        Ok(RawModelOutput::PointsAndNormals(map))
    }
}

fn main() -> Result<()> {
    init_logging();

    let engines = EngineRegistry::new()
        .with(Box::new(BumpDepth))?
        .with(Box::new(SpherePoints))?;
    let config = PipelineConfig {
        settings: ReconstructionSettings {
            poisson_depth: 6,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut pipeline = Pipeline::new(config, engines);

    let image = RgbImage::from_fn(128, 96, |x, y| {
        image::Rgb([(x * 2) as u8, (y * 2) as u8, 180])
    });
    let options = OptionSet::new().with("depth_scale", 5.0);

    for engine in ["bump", "sphere"] {
        let result = pipeline.process_image("demo", image.clone(), engine, &options)?;
        println!(
            "{engine}: {} vertices, {} faces, quality {:?}",
            result.mesh.num_vertices(),
            result.mesh.num_faces(),
            result.quality
        );
        save_ply(&result.mesh, format!("demo_{engine}.ply"))?;
    }

    Ok(())
}
