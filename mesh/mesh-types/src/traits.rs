//! Traits the engine reads surfaces and query meshes through.

use crate::{Dimension, Node, Primitive};

/// A surface description made of primitives.
///
/// Implementations own the vertex data; primitives are resolved on demand
/// with concrete positions.
pub trait PrimitiveStore {
    /// Dimension of the surface.
    fn dimension(&self) -> Dimension;

    /// Number of surface vertices.
    fn vertex_count(&self) -> usize;

    /// Number of primitives (triangles or segments).
    fn primitive_count(&self) -> usize;

    /// Check if the store has no primitives.
    fn is_empty(&self) -> bool {
        self.primitive_count() == 0
    }

    /// Vertex indices referenced by a primitive.
    ///
    /// Returns `None` if the primitive index is out of bounds.
    fn primitive_indices(&self, index: usize) -> Option<Vec<u32>>;

    /// Get a primitive with resolved positions.
    ///
    /// Returns `None` if the primitive index, or any vertex index it
    /// references, is out of bounds.
    fn primitive(&self, index: usize) -> Option<Primitive>;
}

/// A set of query points with element connectivity.
///
/// Two nodes are neighbors when they share an element.
pub trait NodeMesh {
    /// Dimension of the node coordinates.
    fn dimension(&self) -> Dimension;

    /// Number of nodes.
    fn node_count(&self) -> usize;

    /// Get a node by index.
    ///
    /// Returns `None` if the index is out of bounds.
    fn node(&self, index: usize) -> Option<&Node>;

    /// Iterate over all nodes in index order.
    fn nodes(&self) -> impl Iterator<Item = &Node>;

    /// Number of elements.
    fn element_count(&self) -> usize;

    /// Node indices of an element.
    ///
    /// Returns `None` if the index is out of bounds.
    fn element(&self, index: usize) -> Option<&[u32]>;

    /// Iterate over all elements in index order.
    fn elements(&self) -> impl Iterator<Item = &[u32]>;
}
