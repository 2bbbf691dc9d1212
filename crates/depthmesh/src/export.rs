//! PLY export of meshes and point clouds.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use depthmesh_core::{DepthmeshError, Mesh, Result};
use ply_rs::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
    ScalarType,
};
use ply_rs::writer::Writer;

/// Writes `mesh` as ASCII PLY: a colored `vertex` element and a `face` element.
///
/// The body is always ASCII. The binary writer of ply-rs 0.1 emits the
/// element count as the length prefix of every list, which corrupts faces.
///
/// Returns the number of bytes written.
pub fn write_ply(mesh: &Mesh, mut writer: impl Write) -> Result<usize> {
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = Encoding::Ascii;
    ply.header
        .comments
        .push("Exported from depthmesh".to_string());

    let mut vertex_element = ElementDef::new("vertex".to_string());
    for name in ["x", "y", "z"] {
        vertex_element.properties.add(PropertyDef::new(
            name.to_string(),
            PropertyType::Scalar(ScalarType::Float),
        ));
    }
    for name in ["red", "green", "blue"] {
        vertex_element.properties.add(PropertyDef::new(
            name.to_string(),
            PropertyType::Scalar(ScalarType::UChar),
        ));
    }
    ply.header.elements.add(vertex_element);

    let mut face_element = ElementDef::new("face".to_string());
    face_element.properties.add(PropertyDef::new(
        "vertex_indices".to_string(),
        PropertyType::List(ScalarType::UChar, ScalarType::Int),
    ));
    ply.header.elements.add(face_element);

    let vertices = mesh
        .vertices()
        .iter()
        .zip(mesh.colors())
        .map(|(p, &[r, g, b])| {
            let mut vertex = DefaultElement::new();
            vertex.insert("x".to_string(), Property::Float(p.x));
            vertex.insert("y".to_string(), Property::Float(p.y));
            vertex.insert("z".to_string(), Property::Float(p.z));
            vertex.insert("red".to_string(), Property::UChar(r));
            vertex.insert("green".to_string(), Property::UChar(g));
            vertex.insert("blue".to_string(), Property::UChar(b));
            vertex
        })
        .collect();

    let faces = mesh
        .faces()
        .iter()
        .map(|face| {
            let indices = face
                .iter()
                .map(|&i| {
                    i32::try_from(i).map_err(|_| DepthmeshError::FaceIndexOutOfRange {
                        index: i,
                        vertex_count: mesh.num_vertices(),
                    })
                })
                .collect::<Result<Vec<i32>>>()?;
            let mut element = DefaultElement::new();
            element.insert("vertex_indices".to_string(), Property::ListInt(indices));
            Ok(element)
        })
        .collect::<Result<Vec<_>>>()?;

    ply.payload.insert("vertex".to_string(), vertices);
    ply.payload.insert("face".to_string(), faces);

    let written = Writer::new().write_ply(&mut writer, &mut ply)?;
    writer.flush()?;
    Ok(written)
}

/// Writes `mesh` to a PLY file at `path`.
pub fn save_ply(mesh: &Mesh, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = BufWriter::new(File::create(path)?);
    let bytes = write_ply(mesh, file)?;
    log::info!(
        "exported {} vertices and {} faces to {} ({bytes} bytes)",
        mesh.num_vertices(),
        mesh.num_faces(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use depthmesh_core::Vec3;

    fn triangle() -> Mesh {
        Mesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![[0, 1, 2]],
            vec![[255, 0, 0], [0, 255, 0], [0, 0, 255]],
        )
        .unwrap()
    }

    #[test]
    fn test_ascii_header_and_body() {
        let mut out = Vec::new();
        write_ply(&triangle(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("ply\n"));
        assert!(text.contains("format ascii 1.0"));
        assert!(text.contains("element vertex 3"));
        assert!(text.contains("property uchar red"));
        assert!(text.contains("element face 1"));
        assert!(text.contains("property list uchar int vertex_indices"));
        assert!(text.contains("3 0 1 2"));
    }

    #[test]
    fn test_point_cloud_has_no_faces() {
        let cloud = Mesh::point_cloud(vec![Vec3::ZERO; 4], vec![[9, 9, 9]; 4]).unwrap();
        let mut out = Vec::new();
        write_ply(&cloud, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("element vertex 4"));
        assert!(text.contains("element face 0"));
    }

    #[test]
    fn test_every_face_record_has_three_indices() {
        let quad = Mesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE],
            vec![[0, 1, 2], [1, 3, 2]],
            vec![[0, 0, 0]; 4],
        )
        .unwrap();
        let mut out = Vec::new();
        write_ply(&quad, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let body: Vec<&str> = text
            .split("end_header\n")
            .nth(1)
            .unwrap()
            .lines()
            .map(str::trim_end)
            .collect();
        assert_eq!(body.len(), 6);
        assert_eq!(body[4], "3 0 1 2");
        assert_eq!(body[5], "3 1 3 2");
    }
}
