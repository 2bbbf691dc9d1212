//! Error types for depthmesh.

use thiserror::Error;

/// The main error type for depthmesh operations.
#[derive(Error, Debug)]
pub enum DepthmeshError {
    /// Data size mismatch between parallel arrays.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A grid or image has unusable dimensions.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// A face refers to a vertex that does not exist.
    #[error("face index {index} out of range for {vertex_count} vertices")]
    FaceIndexOutOfRange { index: u32, vertex_count: usize },

    /// No engine is registered under the given name.
    #[error("engine '{0}' not found")]
    EngineNotFound(String),

    /// An engine with the given name is already registered.
    #[error("engine '{0}' already registered")]
    EngineExists(String),

    /// An engine failed while loading or running inference.
    #[error("engine '{engine}' failed: {reason}")]
    EngineFailed { engine: String, reason: String },

    /// An engine returned nothing usable.
    #[error("engine '{0}' returned no data")]
    NoEngineOutput(String),

    /// Surface reconstruction could not produce a mesh.
    #[error("surface reconstruction failed: {0}")]
    ReconstructionFailed(String),

    /// The geometry builder did not recognise the raw model output.
    #[error("geometry construction failed for engine '{0}'")]
    GeometryUnavailable(String),

    /// An option value is missing, mistyped, or out of range.
    #[error("invalid option '{name}': {reason}")]
    InvalidOption { name: String, reason: String },

    /// A batch job request is malformed.
    #[error("invalid job: {0}")]
    InvalidJob(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Image decoding or encoding error.
    #[error("image error: {0}")]
    ImageError(#[from] image::ImageError),

    /// Base64 decoding error.
    #[error("base64 error: {0}")]
    DecodeError(#[from] base64::DecodeError),
}

/// A specialized Result type for depthmesh operations.
pub type Result<T> = std::result::Result<T, DepthmeshError>;
