//! Core types for depthmesh.
//!
//! This crate provides the value types shared by the reconstruction pipeline:
//! - [`Grid`] for pixel-aligned 2D data
//! - [`RawModelOutput`], the tagged union every inference engine produces
//! - [`Mesh`] and [`Reconstruction`], the pipeline's output
//! - [`OptionSet`] and [`OptionSchema`] for per-request options
//! - [`ReconstructionSettings`] for solver constants
//! - [`BoundedCache`] and the [`marching_cubes`] isosurface extractor

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod error;
pub mod grid;
pub mod marching_cubes;
pub mod mesh;
pub mod options;
pub mod raw;
pub mod settings;

pub use cache::BoundedCache;
pub use error::{DepthmeshError, Result};
pub use grid::Grid;
pub use marching_cubes::{extract_isosurface, IsoSurface};
pub use mesh::{BuildQuality, DegradeReason, Mesh, Reconstruction};
pub use options::{pipeline_schema, OptionKind, OptionSchema, OptionSet, OptionSpec, OptionValue};
pub use raw::{PointMap, PointSet, RawModelOutput};
pub use settings::ReconstructionSettings;

// Re-export glam and image types for convenience
pub use glam::Vec3;
pub use image::{GrayImage, RgbImage};
