//! Triangle Mesh

use super::*;
use crate::common::*;

/// An indexed triangle mesh in object space, as handed over by the geometry
/// pipeline.
#[derive(Clone, Debug, Default)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3f>,

    /// Vertex indices, three per triangle.
    pub triangles: Vec<[usize; 3]>,

    /// Optional per-vertex normals. When empty face normals are used.
    pub normals: Vec<Normal3f>,
}

impl TriangleMesh {
    /// Returns a new `TriangleMesh`.
    ///
    /// * `vertices`  - Vertex positions.
    /// * `triangles` - Vertex indices, three per triangle.
    /// * `normals`   - Per-vertex normals (may be empty).
    pub fn new(vertices: Vec<Point3f>, triangles: Vec<[usize; 3]>, normals: Vec<Normal3f>) -> Self {
        debug_assert!(normals.is_empty() || normals.len() == vertices.len());
        Self {
            vertices,
            triangles,
            normals,
        }
    }

    /// Returns the vertex positions of a triangle.
    ///
    /// * `tri` - Triangle index.
    pub fn triangle_vertices(&self, tri: usize) -> [Point3f; 3] {
        let [a, b, c] = self.triangles[tri];
        [self.vertices[a], self.vertices[b], self.vertices[c]]
    }

    /// Returns the area of a triangle. Degenerate triangles have zero area.
    ///
    /// * `tri` - Triangle index.
    pub fn triangle_area(&self, tri: usize) -> Float {
        let [p0, p1, p2] = self.triangle_vertices(tri);
        0.5 * (p1 - p0).cross(&(p2 - p0)).length()
    }

    /// Returns the unit face normal of a triangle, or a zero vector if the
    /// triangle is degenerate.
    ///
    /// * `tri` - Triangle index.
    pub fn face_normal(&self, tri: usize) -> Normal3f {
        let [p0, p1, p2] = self.triangle_vertices(tri);
        (p1 - p0).cross(&(p2 - p0)).normalize()
    }

    /// Returns the total surface area.
    pub fn area(&self) -> Float {
        (0..self.triangles.len()).map(|t| self.triangle_area(t)).sum()
    }

    /// Returns the bounding box of the vertices.
    pub fn bounds(&self) -> Bounds3f {
        self.vertices
            .iter()
            .fold(Bounds3f::default(), |b, p| b.union_point(p))
    }
}
