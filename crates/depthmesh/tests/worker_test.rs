//! Integration tests for batch jobs and PLY export.

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use base64::prelude::{Engine as _, BASE64_STANDARD};
use depthmesh::*;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};
use serde_json::json;

/// Depth map proportional to column index.
struct Ramp;

impl Engine for Ramp {
    fn name(&self) -> &str {
        "ramp"
    }

    fn process(&mut self, image: &RgbImage, _: &OptionSet) -> Result<RawModelOutput> {
        Ok(RawModelOutput::DepthMap(Grid::from_fn(
            image.width(),
            image.height(),
            |_, col| col as f32 / 10.0,
        )))
    }
}

/// Keeps the whole image and counts its calls.
struct CountingExtractor(Arc<AtomicUsize>);

impl ForegroundExtractor for CountingExtractor {
    fn extract(&mut self, image: &RgbImage) -> Result<Foreground> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(Foreground {
            image: image.clone(),
            mask: GrayImage::from_pixel(image.width(), image.height(), image::Luma([255])),
        })
    }
}

fn pipeline() -> Pipeline {
    let registry = EngineRegistry::new().with(Box::new(Ramp)).unwrap();
    Pipeline::new(PipelineConfig::default(), registry)
}

fn encoded_png(width: u32, height: u32) -> String {
    encoded_png_of_color(width, height, [10, 20, 30])
}

fn encoded_png_of_color(width: u32, height: u32, color: [u8; 3]) -> String {
    let image = RgbImage::from_pixel(width, height, image::Rgb(color));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    BASE64_STANDARD.encode(bytes)
}

fn read_ply(path: &std::path::Path) -> ply_rs::ply::Ply<DefaultElement> {
    let mut reader = BufReader::new(File::open(path).unwrap());
    Parser::<DefaultElement>::new().read_ply(&mut reader).unwrap()
}

#[test]
fn test_job_writes_ply() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = pipeline();
    let job = json!({
        "input": {
            "image_b64": encoded_png(12, 6),
            "engine_name": "ramp",
            "options": {"depth_scale": 2.0, "bg_removal": false}
        }
    });

    let output = handle_job(&mut pipeline, &job, dir.path());
    let JobOutput::Mesh {
        path,
        vertices,
        faces,
        degraded,
    } = output.clone()
    else {
        panic!("job failed: {output:?}");
    };
    assert_eq!(vertices, 72);
    assert_eq!(faces, 0);
    assert!(!degraded);
    assert!(path.starts_with(dir.path()));
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("ply"));

    let ply = read_ply(&path);
    let vertex_rows = &ply.payload["vertex"];
    assert_eq!(vertex_rows.len(), 72);
    assert_eq!(vertex_rows[0]["red"], Property::UChar(10));
    assert_eq!(vertex_rows[0]["blue"], Property::UChar(30));
    // Column 5 of row 0 has depth 0.5, scaled by 2
    match vertex_rows[5]["z"] {
        Property::Float(z) => assert!((z + 1.0).abs() < 1e-6),
        ref other => panic!("unexpected z property {other:?}"),
    }
    assert!(ply.payload.get("face").map_or(true, Vec::is_empty));
}

#[test]
fn test_missing_keys_return_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = pipeline();
    let output = handle_job(&mut pipeline, &json!({"input": {"engine_name": "ramp"}}), dir.path());
    assert!(output.is_error());
    let value = serde_json::to_value(&output).unwrap();
    assert!(value["error"]
        .as_str()
        .unwrap()
        .contains("image_b64"));
}

#[test]
fn test_bad_payloads_return_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = pipeline();
    let jobs = [
        json!({"input": {"image_b64": "***not base64***", "engine_name": "ramp"}}),
        json!({"input": {"image_b64": BASE64_STANDARD.encode(b"not an image"), "engine_name": "ramp"}}),
        json!({"input": {"image_b64": encoded_png(4, 4), "engine_name": "unknown"}}),
        json!({"input": {"image_b64": encoded_png(4, 4), "engine_name": "ramp", "options": {"resize_to": "13"}}}),
    ];
    for job in &jobs {
        assert!(handle_job(&mut pipeline, job, dir.path()).is_error(), "{job}");
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_save_and_reload_surface() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tri.ply");
    let mesh = Mesh::new(
        vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z],
        vec![[0, 1, 2], [0, 2, 3]],
        vec![[1, 2, 3], [4, 5, 6], [7, 8, 9], [10, 11, 12]],
    )
    .unwrap();
    save_ply(&mesh, &path).unwrap();

    let ply = read_ply(&path);
    assert_eq!(ply.payload["vertex"].len(), 4);
    let faces = &ply.payload["face"];
    assert_eq!(faces.len(), 2);
    assert_eq!(faces[1]["vertex_indices"], Property::ListInt(vec![0, 2, 3]));
    assert_eq!(ply.payload["vertex"][3]["green"], Property::UChar(11));
}

#[test]
fn test_identical_uploads_share_cache_entries() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = pipeline();
    let job = |color| json!({"image_b64": encoded_png_of_color(6, 4, color), "engine_name": "ramp"});

    assert!(!handle_job(&mut pipeline, &job([1, 2, 3]), dir.path()).is_error());
    assert!(!handle_job(&mut pipeline, &job([1, 2, 3]), dir.path()).is_error());
    assert_eq!(pipeline.mesh_cache_len(), 1);
    assert_eq!(pipeline.raw_cache_len(), 1);

    assert!(!handle_job(&mut pipeline, &job([3, 2, 1]), dir.path()).is_error());
    assert_eq!(pipeline.mesh_cache_len(), 2);
    assert_eq!(pipeline.raw_cache_len(), 2);
}

#[test]
fn test_job_background_removal_is_opt_in() {
    let dir = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut pipeline = pipeline().with_extractor(Box::new(CountingExtractor(calls.clone())));
    let image_b64 = encoded_png(8, 8);

    let job = json!({"input": {"image_b64": image_b64, "engine_name": "ramp"}});
    assert!(!handle_job(&mut pipeline, &job, dir.path()).is_error());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let job = json!({"input": {
        "image_b64": image_b64,
        "engine_name": "ramp",
        "options": {"bg_removal": true}
    }});
    assert!(!handle_job(&mut pipeline, &job, dir.path()).is_error());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
