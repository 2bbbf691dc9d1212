//! Geometry reconstruction for depthmesh.
//!
//! This crate turns raw model output into meshes:
//! - Back-projection of depth maps through a pinhole camera
//! - Mask composition with an optional foreground mask
//! - Poisson surface reconstruction with density pruning
//! - Nearest-neighbour color transfer onto reconstructed vertices
//!
//! [`GeometryBuilder`] picks the strategy for a given [`RawModelOutput`].
//!
//! [`RawModelOutput`]: depthmesh_core::RawModelOutput

// Numeric code intentionally uses casts for indices, colors, and coordinates
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod builder;
pub mod components;
pub mod mask;
pub mod poisson;
pub mod projector;
pub mod resample;
pub mod surface;

pub use builder::GeometryBuilder;
pub use components::TriMesh;
pub use mask::{mask_to_image, MaskCompositor};
pub use poisson::{PoissonSolver, PoissonSurface};
pub use projector::{CameraProjector, PinholeIntrinsics};
pub use resample::ColorResampler;
pub use surface::{filter_by_density, quantile, SurfaceReconstructor};
