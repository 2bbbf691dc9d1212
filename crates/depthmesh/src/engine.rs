//! The engine abstraction: anything that turns an image into raw model output.

use depthmesh_core::{Grid, OptionSchema, OptionSet, RawModelOutput, Result, RgbImage, Vec3};

/// What kind of input an engine accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub single_image: bool,
    pub scene_folder: bool,
}

impl Capabilities {
    /// Accepts one image at a time.
    pub const SINGLE_IMAGE: Self = Self {
        single_image: true,
        scene_folder: false,
    };
}

/// A depth or geometry estimation model.
///
/// Engines load their weights lazily: the pipeline calls
/// [`load_if_needed`](Engine::load_if_needed) right before the first
/// [`process`](Engine::process), so registering an engine is cheap.
pub trait Engine: Send {
    /// Unique name the engine is registered and cached under.
    fn name(&self) -> &str;

    fn capabilities(&self) -> Capabilities {
        Capabilities::SINGLE_IMAGE
    }

    /// Options that change this engine's inference result.
    ///
    /// Only these options take part in the raw-output cache key, so options
    /// that only affect geometry building never force a new inference.
    fn option_schema(&self) -> OptionSchema {
        OptionSchema::new()
    }

    /// Loads model weights if that has not happened yet.
    fn load_if_needed(&mut self) -> Result<()> {
        Ok(())
    }

    /// Runs inference on an RGB image.
    fn process(&mut self, image: &RgbImage, options: &OptionSet) -> Result<RawModelOutput>;
}

/// Min-max normalizes a depth map into `[0, 1]`; a flat map becomes all zeros.
pub fn normalize_depth(depth: &Grid<f32>) -> Grid<f32> {
    let (min, max) = depth
        .iter()
        .filter(|d| d.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &d| {
            (lo.min(d), hi.max(d))
        });
    let range = max - min;
    if range > 0.0 {
        depth.map(|&d| (d - min) / range)
    } else {
        depth.map(|_| 0.0)
    }
}

/// Colors points along a blue (lowest z) to red (highest z) ramp.
///
/// Points with no z spread are all black.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn height_colors(points: &[Vec3]) -> Vec<[u8; 3]> {
    let (min, max) = points
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.z), hi.max(p.z))
        });
    if max <= min {
        return vec![[0, 0, 0]; points.len()];
    }
    points
        .iter()
        .map(|p| {
            let t = (p.z - min) / (max - min);
            [(255.0 * t) as u8, 0, (255.0 * (1.0 - t)) as u8]
        })
        .collect()
}
