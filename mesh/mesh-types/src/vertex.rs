//! Surface vertices and query nodes.

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A vertex of the surface description.
///
/// Surface vertices are owned by a [`PrimitiveStore`](crate::PrimitiveStore)
/// and referenced by index from its faces or segments.
///
/// # Example
///
/// ```
/// use mesh_types::{Vertex, Point3};
///
/// let v = Vertex::from_coords(1.0, 2.0, 3.0);
/// assert_eq!(v.position, Point3::new(1.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    /// Position in space.
    pub position: Point3<f64>,
}

impl Vertex {
    /// Create a vertex at the given position.
    #[inline]
    #[must_use]
    pub const fn new(position: Point3<f64>) -> Self {
        Self { position }
    }

    /// Create a vertex from coordinates.
    #[inline]
    #[must_use]
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }
}

impl From<Point3<f64>> for Vertex {
    fn from(position: Point3<f64>) -> Self {
        Self::new(position)
    }
}

/// A query point of the background mesh.
///
/// The node index is its position in the owning mesh's node list; `id` is
/// the global identifier carried through to diagnostic output.
///
/// # Example
///
/// ```
/// use mesh_types::{Node, Point3};
///
/// let node = Node::new(42, Point3::new(0.5, 0.5, 0.5));
/// assert_eq!(node.id, 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Node {
    /// Global identifier.
    pub id: u64,
    /// Coordinates. 2D meshes keep `z = 0`.
    pub position: Point3<f64>,
}

impl Node {
    /// Create a node.
    #[inline]
    #[must_use]
    pub const fn new(id: u64, position: Point3<f64>) -> Self {
        Self { id, position }
    }
}
