//! Marching cubes isosurface extraction.
//!
//! Used to turn the implicit function produced by the Poisson solver into a
//! triangle mesh. The triangle table is the public-domain `MarchingCubeCpp`
//! table.

#![allow(clippy::unreadable_literal, clippy::cast_possible_truncation, clippy::cast_precision_loss)]

use glam::Vec3;

use crate::error::{DepthmeshError, Result};

/// Triangles extracted from a scalar field, in grid-index coordinates.
#[derive(Debug, Clone, Default)]
pub struct IsoSurface {
    /// Edge-interpolated vertex positions. Integer coordinates are grid nodes.
    pub vertices: Vec<Vec3>,
    /// Vertex index triples.
    pub triangles: Vec<[u32; 3]>,
}

impl IsoSurface {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Maps grid-index coordinates to world space.
    pub fn transform(&mut self, origin: Vec3, spacing: f32) {
        for v in &mut self.vertices {
            *v = origin + *v * spacing;
        }
    }
}

/// Offsets of the eight cell corners, bit `i` of the configuration index is corner `i`.
const CORNERS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [1, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
];

/// Cell edges as (lower corner, upper corner, axis), numbered as in [`MC_TRIS`].
const EDGES: [(usize, usize, usize); 12] = [
    (0, 1, 0),
    (2, 3, 0),
    (4, 5, 0),
    (6, 7, 0),
    (0, 2, 1),
    (1, 3, 1),
    (4, 6, 1),
    (5, 7, 1),
    (0, 4, 2),
    (1, 5, 2),
    (2, 6, 2),
    (3, 7, 2),
];

const UNSET: u32 = u32::MAX;

/// Extracts the surface `field == iso` from a scalar field.
///
/// `field` is x-fastest: node (x, y, z) is at `(z * ny + y) * nx + x` for
/// `dims = [nx, ny, nz]`. Corners with `field < iso` are inside. Vertices are
/// shared between neighbouring cells, so the output is indexed.
pub fn extract_isosurface(field: &[f32], dims: [usize; 3], iso: f32) -> Result<IsoSurface> {
    let [nx, ny, nz] = dims;
    if nx < 2 || ny < 2 || nz < 2 {
        return Err(DepthmeshError::InvalidDimensions {
            width: nx as u32,
            height: (ny * nz) as u32,
        });
    }
    let node_count = nx * ny * nz;
    if field.len() != node_count {
        return Err(DepthmeshError::SizeMismatch {
            expected: node_count,
            actual: field.len(),
        });
    }

    let node = |x: usize, y: usize, z: usize| (z * ny + y) * nx + x;
    // One slot per (node, axis) edge leaving the node in the positive direction
    let mut edge_vertex = vec![UNSET; node_count * 3];
    let mut surface = IsoSurface::default();
    let mut values = [0.0_f32; 8];
    let mut corner_nodes = [0_usize; 8];

    for z in 0..nz - 1 {
        for y in 0..ny - 1 {
            for x in 0..nx - 1 {
                let mut config = 0_usize;
                for (i, [dx, dy, dz]) in CORNERS.iter().enumerate() {
                    corner_nodes[i] = node(x + dx, y + dy, z + dz);
                    values[i] = field[corner_nodes[i]] - iso;
                    if values[i] < 0.0 {
                        config |= 1 << i;
                    }
                }
                if config == 0 || config == 255 {
                    continue;
                }

                let entry = MC_TRIS[config];
                let n_triangles = (entry & 0xF) as usize;
                for t in 0..n_triangles {
                    let mut tri = [0_u32; 3];
                    for (k, slot) in tri.iter_mut().enumerate() {
                        let shift = 4 * (1 + 3 * t + k);
                        let (a, b, axis) = EDGES[((entry >> shift) & 0xF) as usize];
                        let cache = &mut edge_vertex[corner_nodes[a] * 3 + axis];
                        if *cache == UNSET {
                            let [dx, dy, dz] = CORNERS[a];
                            let mut p = Vec3::new((x + dx) as f32, (y + dy) as f32, (z + dz) as f32);
                            p[axis] += values[a] / (values[a] - values[b]);
                            *cache = surface.vertices.len() as u32;
                            surface.vertices.push(p);
                        }
                        *slot = *cache;
                    }
                    surface.triangles.push(tri);
                }
            }
        }
    }

    Ok(surface)
}


/// Look-up table for triangle configurations (256 entries, one per cube configuration).
///
/// Each entry is a `u64` encoding:
/// - Bits `[3:0]`: Number of triangles (0-5)
/// - Bits `[7:4]`, `[11:8]`, ...: Edge indices (0-11) for each triangle vertex, 4 bits each
///
/// Ported from `MarchingCubeCpp` (public domain).
#[rustfmt::skip]
static MC_TRIS: [u64; 256] = [
    0, 33793, 36945, 159668546,
    18961, 144771090, 5851666, 595283255635,
    20913, 67640146, 193993474, 655980856339,
    88782242, 736732689667, 797430812739, 194554754,
    26657, 104867330, 136709522, 298069416227,
    109224258, 8877909667, 318136408323, 1567994331701604,
    189884450, 350847647843, 559958167731, 3256298596865604,
    447393122899, 651646838401572, 2538311371089956, 737032694307,
    29329, 43484162, 91358498, 374810899075,
    158485010, 178117478419, 88675058979, 433581536604804,
    158486962, 649105605635, 4866906995, 3220959471609924,
    649165714851, 3184943915608436, 570691368417972, 595804498035,
    124295042, 431498018963, 508238522371, 91518530,
    318240155763, 291789778348404, 1830001131721892, 375363605923,
    777781811075, 1136111028516116, 3097834205243396, 508001629971,
    2663607373704004, 680242583802939237, 333380770766129845, 179746658,
    42545, 138437538, 93365810, 713842853011,
    73602098, 69575510115, 23964357683, 868078761575828,
    28681778, 713778574611, 250912709379, 2323825233181284,
    302080811955, 3184439127991172, 1694042660682596, 796909779811,
    176306722, 150327278147, 619854856867, 1005252473234484,
    211025400963, 36712706, 360743481544788, 150627258963,
    117482600995, 1024968212107700, 2535169275963444, 4734473194086550421,
    628107696687956, 9399128243, 5198438490361643573, 194220594,
    104474994, 566996932387, 427920028243, 2014821863433780,
    492093858627, 147361150235284, 2005882975110676, 9671606099636618005,
    777701008947, 3185463219618820, 482784926917540, 2900953068249785909,
    1754182023747364, 4274848857537943333, 13198752741767688709, 2015093490989156,
    591272318771, 2659758091419812, 1531044293118596, 298306479155,
    408509245114388, 210504348563, 9248164405801223541, 91321106,
    2660352816454484, 680170263324308757, 8333659837799955077, 482966828984116,
    4274926723105633605, 3184439197724820, 192104450, 15217,
    45937, 129205250, 129208402, 529245952323,
    169097138, 770695537027, 382310500883, 2838550742137652,
    122763026, 277045793139, 81608128403, 1991870397907988,
    362778151475, 2059003085103236, 2132572377842852, 655681091891,
    58419234, 239280858627, 529092143139, 1568257451898804,
    447235128115, 679678845236084, 2167161349491220, 1554184567314086709,
    165479003923, 1428768988226596, 977710670185060, 10550024711307499077,
    1305410032576132, 11779770265620358997, 333446212255967269, 978168444447012,
    162736434, 35596216627, 138295313843, 891861543990356,
    692616541075, 3151866750863876, 100103641866564, 6572336607016932133,
    215036012883, 726936420696196, 52433666, 82160664963,
    2588613720361524, 5802089162353039525, 214799000387, 144876322,
    668013605731, 110616894681956, 1601657732871812, 430945547955,
    3156382366321172, 7644494644932993285, 3928124806469601813, 3155990846772900,
    339991010498708, 10743689387941597493, 5103845475, 105070898,
    3928064910068824213, 156265010, 1305138421793636, 27185,
    195459938, 567044449971, 382447549283, 2175279159592324,
    443529919251, 195059004769796, 2165424908404116, 1554158691063110021,
    504228368803, 1436350466655236, 27584723588724, 1900945754488837749,
    122971970, 443829749251, 302601798803, 108558722,
    724700725875, 43570095105972, 2295263717447940, 2860446751369014181,
    2165106202149444, 69275726195, 2860543885641537797, 2165106320445780,
    2280890014640004, 11820349930268368933, 8721082628082003989, 127050770,
    503707084675, 122834978, 2538193642857604, 10129,
    801441490467, 2923200302876740, 1443359556281892, 2901063790822564949,
    2728339631923524, 7103874718248233397, 12775311047932294245, 95520290,
    2623783208098404, 1900908618382410757, 137742672547, 2323440239468964,
    362478212387, 727199575803140, 73425410, 34337,
    163101314, 668566030659, 801204361987, 73030562,
    591509145619, 162574594, 100608342969108, 5553,
    724147968595, 1436604830452292, 176259090, 42001,
    143955266, 2385, 18433, 0,
];

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(dims: [usize; 3], f: impl Fn(Vec3) -> f32) -> Vec<f32> {
        let mut field = Vec::with_capacity(dims[0] * dims[1] * dims[2]);
        for z in 0..dims[2] {
            for y in 0..dims[1] {
                for x in 0..dims[0] {
                    field.push(f(Vec3::new(x as f32, y as f32, z as f32)));
                }
            }
        }
        field
    }

    #[test]
    fn test_uniform_field_is_empty() {
        let above = vec![1.0; 27];
        assert!(extract_isosurface(&above, [3, 3, 3], 0.0).unwrap().is_empty());
        let below = vec![-1.0; 27];
        assert!(extract_isosurface(&below, [3, 3, 3], 0.0).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(extract_isosurface(&[0.0; 8], [2, 2, 3], 0.0).is_err());
        assert!(extract_isosurface(&[0.0; 4], [1, 2, 2], 0.0).is_err());
    }

    #[test]
    fn test_plane() {
        let dims = [4, 4, 4];
        let field = sample(dims, |p| p.z - 1.5);
        let surface = extract_isosurface(&field, dims, 0.0).unwrap();

        // Two triangles per crossed cell, 3x3 cells in the crossing layer
        assert_eq!(surface.triangles.len(), 18);
        // Shared vertices: one per crossed z-edge
        assert_eq!(surface.vertices.len(), 16);
        assert!(surface.vertices.iter().all(|v| (v.z - 1.5).abs() < 1e-6));
    }

    #[test]
    fn test_sphere_is_closed() {
        let dims = [20, 20, 20];
        let center = Vec3::splat(9.5);
        let field = sample(dims, |p| (p - center).length() - 5.0);
        let surface = extract_isosurface(&field, dims, 0.0).unwrap();

        assert!(
            surface.triangles.len() > 100,
            "expected >100 triangles, got {}",
            surface.triangles.len()
        );
        for v in &surface.vertices {
            let r = (*v - center).length();
            assert!((r - 5.0).abs() < 0.5, "vertex at radius {r}");
        }

        // Closed surface: every undirected edge is shared by exactly two triangles
        let mut edges = std::collections::HashMap::new();
        for t in &surface.triangles {
            for (a, b) in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
                *edges.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }
        assert!(edges.values().all(|&n| n == 2));
    }

    #[test]
    fn test_transform() {
        let mut surface = IsoSurface {
            vertices: vec![Vec3::new(1.0, 2.0, 3.0)],
            triangles: Vec::new(),
        };
        surface.transform(Vec3::new(-1.0, 0.0, 1.0), 0.5);
        assert_eq!(surface.vertices[0], Vec3::new(-0.5, 1.0, 2.5));
    }
}
