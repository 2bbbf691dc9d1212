//! Triangle soup editing: vertex removal and connected components.

use glam::Vec3;

/// An indexed triangle mesh without attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriMesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

impl TriMesh {
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            triangles,
        }
    }

    /// Drops every vertex with `keep[i] == false` and every triangle touching one.
    ///
    /// Surviving vertices keep their relative order. Returns the old index of
    /// each surviving vertex.
    pub fn retain_vertices(&mut self, keep: &[bool]) -> Vec<usize> {
        let mut remap = vec![u32::MAX; self.vertices.len()];
        let mut kept = Vec::with_capacity(self.vertices.len());
        let mut vertices = Vec::with_capacity(self.vertices.len());
        for (old, v) in self.vertices.iter().enumerate() {
            if keep.get(old).copied().unwrap_or(false) {
                #[allow(clippy::cast_possible_truncation)]
                {
                    remap[old] = vertices.len() as u32;
                }
                vertices.push(*v);
                kept.push(old);
            }
        }

        self.triangles = self
            .triangles
            .iter()
            .filter_map(|t| {
                let mapped = t.map(|i| remap[i as usize]);
                mapped.iter().all(|&i| i != u32::MAX).then_some(mapped)
            })
            .collect();
        self.vertices = vertices;
        kept
    }

    /// Groups triangles that share a vertex, directly or transitively.
    ///
    /// Returns one list of triangle indices per component.
    pub fn connected_components(&self) -> Vec<Vec<usize>> {
        let mut sets = DisjointSets::new(self.vertices.len());
        for t in &self.triangles {
            sets.union(t[0] as usize, t[1] as usize);
            sets.union(t[1] as usize, t[2] as usize);
        }

        let mut component_of_root = vec![usize::MAX; self.vertices.len()];
        let mut components: Vec<Vec<usize>> = Vec::new();
        for (index, t) in self.triangles.iter().enumerate() {
            let root = sets.find(t[0] as usize);
            if component_of_root[root] == usize::MAX {
                component_of_root[root] = components.len();
                components.push(Vec::new());
            }
            components[component_of_root[root]].push(index);
        }
        components
    }

    /// Keeps only the component with the most triangles.
    ///
    /// Vertices not used by that component are dropped. On ties the component
    /// containing the lowest triangle index wins. Returns the old index of each
    /// surviving vertex, or `None` when the mesh has no triangles.
    pub fn keep_largest_component(&mut self) -> Option<Vec<usize>> {
        let components = self.connected_components();
        let largest = components
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.len().cmp(&b.len()).then(ib.cmp(ia)))
            .map(|(_, c)| c)?;
        if components.len() > 1 {
            log::debug!(
                "keeping largest of {} components ({} faces)",
                components.len(),
                largest.len()
            );
        }

        let mut used = vec![false; self.vertices.len()];
        for &t in largest {
            for i in self.triangles[t] {
                used[i as usize] = true;
            }
        }
        Some(self.retain_vertices(&used))
    }
}

/// Union-find with path halving.
struct DisjointSets {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] = self.rank[ra].saturating_add(1);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A strip of `faces` triangles starting at vertex `offset`, laid out along x at height `y`.
    pub(crate) fn strip(faces: u32, offset: u32, y: f32) -> (Vec<Vec3>, Vec<[u32; 3]>) {
        #[allow(clippy::cast_precision_loss)]
        let vertices = (0..faces + 2)
            .map(|i| Vec3::new(i as f32 * 0.5, y + (i % 2) as f32, 0.0))
            .collect();
        let triangles = (0..faces)
            .map(|i| [offset + i, offset + i + 1, offset + i + 2])
            .collect();
        (vertices, triangles)
    }

    fn two_strips(small: u32, large: u32) -> TriMesh {
        let (mut vertices, mut triangles) = strip(small, 0, 0.0);
        let (v2, t2) = strip(large, small + 2, 10.0);
        vertices.extend(v2);
        triangles.extend(t2);
        TriMesh::new(vertices, triangles)
    }

    #[test]
    fn test_components_of_two_strips() {
        let mesh = two_strips(10, 90);
        let mut sizes: Vec<usize> = mesh.connected_components().iter().map(Vec::len).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![10, 90]);
    }

    #[test]
    fn test_keep_largest_component() {
        let mut mesh = two_strips(10, 90);
        let kept = mesh.keep_largest_component().unwrap();
        assert_eq!(mesh.triangles.len(), 90);
        assert_eq!(mesh.vertices.len(), 92);
        assert_eq!(kept.first(), Some(&12));
        assert!(mesh.vertices.iter().all(|v| v.y >= 10.0));
        assert!(mesh
            .triangles
            .iter()
            .flatten()
            .all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn test_keep_largest_regardless_of_order() {
        let (mut vertices, mut triangles) = strip(90, 0, 0.0);
        let (v2, t2) = strip(10, 92, 10.0);
        vertices.extend(v2);
        triangles.extend(t2);
        let mut mesh = TriMesh::new(vertices, triangles);
        mesh.keep_largest_component();
        assert_eq!(mesh.triangles.len(), 90);
        assert!(mesh.vertices.iter().all(|v| v.y < 10.0));
    }

    #[test]
    fn test_empty_mesh_has_no_largest_component() {
        let mut mesh = TriMesh::new(vec![Vec3::ZERO], Vec::new());
        assert!(mesh.keep_largest_component().is_none());
        assert_eq!(mesh.vertices.len(), 1);
    }

    #[test]
    fn test_retain_vertices_drops_touching_faces() {
        let (vertices, triangles) = strip(3, 0, 0.0);
        let mut mesh = TriMesh::new(vertices, triangles);
        // Removing vertex 0 kills face [0,1,2] only
        let kept = mesh.retain_vertices(&[false, true, true, true, true]);
        assert_eq!(kept, vec![1, 2, 3, 4]);
        assert_eq!(mesh.triangles, vec![[0, 1, 2], [1, 2, 3]]);
    }
}
