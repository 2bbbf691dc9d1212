//! Batch-worker job handling.
//!
//! A job is a JSON document carrying a base64-encoded image, an engine name
//! and options. The handler never panics on bad input: every failure is
//! reported back as a [`JobOutput::Error`] so the worker keeps serving jobs.
//!
//! Options a job leaves out take the pipeline defaults, except `bg_removal`,
//! which stays off unless the job asks for it.

use std::path::{Path, PathBuf};

use base64::prelude::{Engine as _, BASE64_STANDARD};
use depthmesh_core::{DepthmeshError, OptionSet, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::export::save_ply;
use crate::pipeline::Pipeline;

/// The `input` section of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInput {
    pub image_b64: String,
    pub engine_name: String,
    #[serde(default)]
    pub options: OptionSet,
}

impl JobInput {
    /// Extracts and checks the input of a job.
    ///
    /// Accepts either `{"input": {...}}` or the bare input object.
    pub fn from_job(job: &Value) -> Result<Self> {
        let input = job.get("input").unwrap_or(job);
        let present = |key: &str| {
            input
                .get(key)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.is_empty())
        };
        if !present("image_b64") || !present("engine_name") {
            return Err(DepthmeshError::InvalidJob(
                "the keys 'image_b64' and 'engine_name' are required".to_string(),
            ));
        }
        Ok(Self::deserialize(input)?)
    }
}

/// What a job produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobOutput {
    Mesh {
        path: PathBuf,
        vertices: usize,
        faces: usize,
        degraded: bool,
    },
    Error {
        error: String,
    },
}

impl JobOutput {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Runs one job and writes the resulting mesh as a PLY file into `out_dir`.
pub fn handle_job(pipeline: &mut Pipeline, job: &Value, out_dir: &Path) -> JobOutput {
    match run_job(pipeline, job, out_dir) {
        Ok(output) => output,
        Err(err) => {
            log::error!("job failed: {err}");
            JobOutput::Error {
                error: err.to_string(),
            }
        }
    }
}

fn run_job(pipeline: &mut Pipeline, job: &Value, out_dir: &Path) -> Result<JobOutput> {
    let mut input = JobInput::from_job(job)?;
    // Background removal is opt-in for jobs
    if !input.options.contains("bg_removal") {
        input.options.set("bg_removal", false);
    }
    let bytes = BASE64_STANDARD.decode(input.image_b64.trim())?;
    let image = image::load_from_memory(&bytes)?.to_rgb8();
    log::info!(
        "job for '{}' with a {}x{} image",
        input.engine_name,
        image.width(),
        image.height()
    );

    // Identical uploads share cache entries
    let source = format!("job:{}", blake3::hash(&bytes).to_hex());
    let reconstruction =
        pipeline.process_image(&source, image, &input.engine_name, &input.options)?;

    let file = tempfile::Builder::new()
        .prefix("depthmesh-")
        .suffix(".ply")
        .tempfile_in(out_dir)?;
    let (_, path) = file.keep().map_err(|err| DepthmeshError::IoError(err.error))?;
    save_ply(&reconstruction.mesh, &path)?;

    Ok(JobOutput::Mesh {
        path,
        vertices: reconstruction.mesh.num_vertices(),
        faces: reconstruction.mesh.num_faces(),
        degraded: reconstruction.is_degraded(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_input_from_envelope() {
        let job = json!({"input": {"image_b64": "AAAA", "engine_name": "E", "options": {"num_steps": 3}}});
        let input = JobInput::from_job(&job).unwrap();
        assert_eq!(input.engine_name, "E");
        assert_eq!(input.options.get_f64("num_steps"), Some(3.0));
    }

    #[test]
    fn test_input_without_options() {
        let job = json!({"image_b64": "AAAA", "engine_name": "E"});
        assert!(JobInput::from_job(&job).unwrap().options.is_empty());
    }

    #[test]
    fn test_missing_keys_rejected() {
        for job in [
            json!({}),
            json!({"input": {}}),
            json!({"input": {"image_b64": "AAAA"}}),
            json!({"input": {"engine_name": "E"}}),
            json!({"input": {"image_b64": "", "engine_name": "E"}}),
            json!({"input": {"image_b64": 5, "engine_name": "E"}}),
        ] {
            assert!(matches!(
                JobInput::from_job(&job),
                Err(DepthmeshError::InvalidJob(_))
            ));
        }
    }

    #[test]
    fn test_error_output_shape() {
        let output = JobOutput::Error {
            error: "boom".to_string(),
        };
        assert!(output.is_error());
        assert_eq!(serde_json::to_value(&output).unwrap(), json!({"error": "boom"}));
    }
}
