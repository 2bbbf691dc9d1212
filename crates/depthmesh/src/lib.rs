//! depthmesh: single-image 3D reconstruction.
//!
//! depthmesh turns a photo into a colored mesh or point cloud. An [`Engine`]
//! (a depth or geometry estimation model) produces [`RawModelOutput`], and the
//! [`GeometryBuilder`] turns that into a [`Mesh`].
//!
//! # Quick Start
//!
//! ```no_run
//! use depthmesh::*;
//!
//! struct FlatDepth;
//!
//! impl Engine for FlatDepth {
//!     fn name(&self) -> &str {
//!         "flat"
//!     }
//!
//!     fn process(&mut self, image: &RgbImage, _: &OptionSet) -> Result<RawModelOutput> {
//!         Ok(RawModelOutput::DepthMap(Grid::filled(image.width(), image.height(), 1.0)))
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     let engines = EngineRegistry::new().with(Box::new(FlatDepth))?;
//!     let mut pipeline = Pipeline::new(PipelineConfig::default(), engines);
//!
//!     let result = pipeline.process("photo.png", "flat", &OptionSet::new())?;
//!     save_ply(&result.mesh, "photo.ply")?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`Pipeline`] loads and preprocesses images, runs engines and caches
//!   both raw outputs and finished meshes
//! - [`GeometryBuilder`] picks a reconstruction strategy per output shape
//! - [`export`] writes PLY files
//! - [`worker`] handles JSON batch jobs

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod config;
pub mod engine;
pub mod export;
pub mod pipeline;
pub mod preprocess;
pub mod registry;
pub mod worker;

// Re-export core types
pub use depthmesh_core::{
    pipeline_schema, BoundedCache, BuildQuality, DegradeReason, DepthmeshError, GrayImage, Grid,
    Mesh, OptionKind, OptionSchema, OptionSet, OptionSpec, OptionValue, PointMap, PointSet,
    RawModelOutput, Reconstruction, ReconstructionSettings, Result, RgbImage, Vec3,
};

// Re-export geometry
pub use depthmesh_geometry::{
    CameraProjector, GeometryBuilder, MaskCompositor, PinholeIntrinsics, SurfaceReconstructor,
};

pub use cache::CacheKey;
pub use config::PipelineConfig;
pub use engine::{height_colors, normalize_depth, Capabilities, Engine};
pub use export::{save_ply, write_ply};
pub use pipeline::Pipeline;
pub use preprocess::{resize_and_pad, Foreground, ForegroundExtractor, ResizeTarget};
pub use registry::EngineRegistry;
pub use worker::{handle_job, JobInput, JobOutput};

/// Installs the `env_logger` logger, configured through `RUST_LOG`.
///
/// Calling this more than once is harmless.
pub fn init_logging() {
    let _ = env_logger::try_init();
}
