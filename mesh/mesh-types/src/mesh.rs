//! Indexed triangle surface.

use crate::{Aabb, Dimension, Primitive, PrimitiveStore, Triangle, Vertex};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An indexed triangle surface.
///
/// This is the 3D surface description the engine classifies against. It
/// stores vertices and faces separately, with faces referencing vertices by
/// index. The surface is expected to be closed; the inside/outside test
/// relies on ray parity.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Vertex, PrimitiveStore};
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
///
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.primitive_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexedMesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,

    /// Triangle faces as indices into the vertex array.
    /// Each face is `[v0, v1, v2]` with counter-clockwise winding.
    pub faces: Vec<[u32; 3]>,
}

impl IndexedMesh {
    /// Create a new empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Create a mesh from vertices and faces.
    #[inline]
    #[must_use]
    pub const fn from_parts(vertices: Vec<Vertex>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Create a mesh from raw coordinate and index data.
    ///
    /// Returns an empty mesh if either slice length is not a multiple of 3.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{IndexedMesh, PrimitiveStore};
    ///
    /// let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    /// let indices = [0, 1, 2];
    ///
    /// let mesh = IndexedMesh::from_raw(&positions, &indices);
    /// assert_eq!(mesh.vertex_count(), 3);
    /// assert_eq!(mesh.primitive_count(), 1);
    /// ```
    #[must_use]
    pub fn from_raw(positions: &[f64], indices: &[u32]) -> Self {
        if positions.len() % 3 != 0 || indices.len() % 3 != 0 {
            return Self::new();
        }

        let vertices = positions
            .chunks_exact(3)
            .map(|c| Vertex::from_coords(c[0], c[1], c[2]))
            .collect();

        let faces = indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();

        Self { vertices, faces }
    }

    /// Get a triangle by face index with resolved vertex positions.
    ///
    /// Returns `None` if the face or one of its vertices does not exist.
    #[must_use]
    pub fn triangle(&self, face_index: usize) -> Option<Triangle> {
        let [i0, i1, i2] = *self.faces.get(face_index)?;
        Some(Triangle {
            v0: self.vertices.get(i0 as usize)?.position,
            v1: self.vertices.get(i1 as usize)?.position,
            v2: self.vertices.get(i2 as usize)?.position,
        })
    }

    /// Bounding box of all vertices.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| &v.position))
    }
}

impl PrimitiveStore for IndexedMesh {
    fn dimension(&self) -> Dimension {
        Dimension::Three
    }

    #[inline]
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    fn primitive_count(&self) -> usize {
        self.faces.len()
    }

    fn primitive_indices(&self, index: usize) -> Option<Vec<u32>> {
        self.faces.get(index).map(|f| f.to_vec())
    }

    fn primitive(&self, index: usize) -> Option<Primitive> {
        self.triangle(index).map(Primitive::Triangle)
    }
}

/// Helper function to create a unit cube mesh.
///
/// Creates a cube from (0,0,0) to (1,1,1) with outward-facing normals.
///
/// # Example
///
/// ```
/// use mesh_types::{unit_cube, PrimitiveStore};
///
/// let cube = unit_cube();
/// assert_eq!(cube.vertex_count(), 8);
/// assert_eq!(cube.primitive_count(), 12);
/// ```
#[must_use]
pub fn unit_cube() -> IndexedMesh {
    let mut mesh = IndexedMesh::with_capacity(8, 12);

    mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0)); // 0
    mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0)); // 1
    mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 0.0)); // 2
    mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0)); // 3
    mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 1.0)); // 4
    mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 1.0)); // 5
    mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 1.0)); // 6
    mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 1.0)); // 7

    // Bottom face (z=0) - normal points -Z
    mesh.faces.push([0, 2, 1]);
    mesh.faces.push([0, 3, 2]);

    // Top face (z=1) - normal points +Z
    mesh.faces.push([4, 5, 6]);
    mesh.faces.push([4, 6, 7]);

    // Front face (y=0) - normal points -Y
    mesh.faces.push([0, 1, 5]);
    mesh.faces.push([0, 5, 4]);

    // Back face (y=1) - normal points +Y
    mesh.faces.push([3, 7, 6]);
    mesh.faces.push([3, 6, 2]);

    // Left face (x=0) - normal points -X
    mesh.faces.push([0, 4, 7]);
    mesh.faces.push([0, 7, 3]);

    // Right face (x=1) - normal points +X
    mesh.faces.push([1, 2, 6]);
    mesh.faces.push([1, 6, 5]);

    mesh
}
