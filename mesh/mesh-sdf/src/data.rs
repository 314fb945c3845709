//! Precomputed bounding data for the surface primitives.
//!
//! Primitives are resolved once from the store into a flat arena together
//! with their axis-aligned bounds. Degenerate primitives are left out of the
//! arena; the mapping back to store indices is kept.

use mesh_types::{Aabb, Dimension, Primitive, PrimitiveStore};
use tracing::{debug, warn};

use crate::error::{SdfError, SdfResult};

/// Relative area below which a triangle counts as a sliver.
const TRIANGLE_DEGENERACY: f64 = 1e-10;

/// Absolute length below which a segment counts as a point.
const SEGMENT_DEGENERACY: f64 = 1e-12;

/// Primitive arena with per-primitive bounding boxes.
///
/// Built once from a [`PrimitiveStore`] and read-only afterwards.
#[derive(Debug, Clone)]
pub struct BoundingData {
    dimension: Dimension,
    primitives: Vec<Primitive>,
    boxes: Vec<Aabb>,
    source: Vec<usize>,
    skipped: Vec<usize>,
    bounds: Aabb,
}

impl BoundingData {
    /// Resolve and bound every usable primitive of `store`.
    ///
    /// # Errors
    ///
    /// - [`SdfError::IndexOutOfRange`] if a primitive references a vertex
    ///   the store does not have.
    /// - [`SdfError::EmptySurface`] if no usable primitive remains.
    pub fn build<S: PrimitiveStore + ?Sized>(store: &S) -> SdfResult<Self> {
        let dimension = store.dimension();
        let count = store.primitive_count();

        let mut primitives = Vec::with_capacity(count);
        let mut boxes = Vec::with_capacity(count);
        let mut source = Vec::with_capacity(count);
        let mut skipped = Vec::new();
        let mut bounds = Aabb::empty();

        for i in 0..count {
            let Some(primitive) = store.primitive(i) else {
                return Err(missing_vertex(store, i));
            };

            if is_negligible(&primitive) {
                debug!(primitive = i, "Skipping degenerate primitive");
                skipped.push(i);
                continue;
            }

            let b = primitive.bounds();
            bounds = bounds.union(&b);
            primitives.push(primitive);
            boxes.push(b);
            source.push(i);
        }

        if !skipped.is_empty() {
            warn!(
                skipped = skipped.len(),
                total = count,
                "Degenerate primitives excluded from the surface"
            );
        }

        if primitives.is_empty() {
            return Err(SdfError::EmptySurface);
        }

        Ok(Self {
            dimension,
            primitives,
            boxes,
            source,
            skipped,
            bounds,
        })
    }

    /// Dimension of the surface.
    #[must_use]
    pub const fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Number of usable primitives in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Whether the arena is empty (never true for a built instance).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Primitive at arena index `i`.
    #[must_use]
    pub fn primitive(&self, i: usize) -> Option<&Primitive> {
        self.primitives.get(i)
    }

    /// All primitives in arena order.
    #[must_use]
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Bounding box of the primitive at arena index `i`.
    #[must_use]
    pub fn bounds_of(&self, i: usize) -> Option<&Aabb> {
        self.boxes.get(i)
    }

    /// All bounding boxes in arena order.
    #[must_use]
    pub fn boxes(&self) -> &[Aabb] {
        &self.boxes
    }

    /// Store index of the primitive at arena index `i`.
    #[must_use]
    pub fn source_index(&self, i: usize) -> Option<usize> {
        self.source.get(i).copied()
    }

    /// Store indices of primitives that were skipped as degenerate.
    #[must_use]
    pub fn skipped(&self) -> &[usize] {
        &self.skipped
    }

    /// Bounding box of the whole surface.
    #[must_use]
    pub const fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Mean bounding-box diagonal of the primitives.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_extent(&self) -> f64 {
        let total: f64 = self.boxes.iter().map(Aabb::diagonal).sum();
        total / self.boxes.len().max(1) as f64
    }
}

fn is_negligible(primitive: &Primitive) -> bool {
    match primitive {
        Primitive::Triangle(_) => {
            let d = primitive.bounds().diagonal();
            primitive.is_degenerate(TRIANGLE_DEGENERACY * d * d)
        }
        Primitive::Segment(_) => primitive.is_degenerate(SEGMENT_DEGENERACY),
    }
}

fn missing_vertex<S: PrimitiveStore + ?Sized>(store: &S, primitive: usize) -> SdfError {
    let len = store.vertex_count();
    let bad = store
        .primitive_indices(primitive)
        .and_then(|indices| indices.into_iter().find(|&v| v as usize >= len));

    match bad {
        Some(v) => SdfError::out_of_range("vertex", v as usize, len),
        None => SdfError::out_of_range("primitive", primitive, store.primitive_count()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::{IndexedMesh, Vertex, unit_cube, unit_square};

    #[test]
    fn boxes_contain_corners() {
        let data = BoundingData::build(&unit_cube()).expect("cube builds");
        assert_eq!(data.len(), 12);
        for (p, b) in data.primitives().iter().zip(data.boxes()) {
            for corner in p.corners() {
                assert!(b.contains(&corner));
            }
        }
        assert!(data.bounds().contains(&mesh_types::Point3::new(1.0, 1.0, 1.0)));
    }

    #[test]
    fn degenerate_triangles_are_skipped() {
        let mut mesh = unit_cube();
        // Collinear and repeated-vertex faces.
        mesh.vertices.push(Vertex::from_coords(2.0, 0.0, 0.0));
        mesh.faces.push([0, 1, 8]);
        mesh.faces.push([3, 3, 3]);

        let data = BoundingData::build(&mesh).expect("cube builds");
        assert_eq!(data.len(), 12);
        assert_eq!(data.skipped(), &[12, 13]);
        assert_eq!(data.source_index(11), Some(11));
    }

    #[test]
    fn empty_surface_rejected() {
        let result = BoundingData::build(&IndexedMesh::new());
        assert!(matches!(result, Err(SdfError::EmptySurface)));

        let mut mesh = IndexedMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.faces.push([0, 0, 0]);
        assert!(matches!(BoundingData::build(&mesh), Err(SdfError::EmptySurface)));
    }

    #[test]
    fn bad_vertex_reference_reported() {
        let mut mesh = unit_cube();
        mesh.faces.push([0, 1, 42]);
        match BoundingData::build(&mesh) {
            Err(SdfError::IndexOutOfRange { what, index, len }) => {
                assert_eq!(what, "vertex");
                assert_eq!(index, 42);
                assert_eq!(len, 8);
            }
            other => panic!("expected out of range, got {other:?}"),
        }
    }

    #[test]
    fn polyline_bounds() {
        let data = BoundingData::build(&unit_square()).expect("square builds");
        assert_eq!(data.dimension(), Dimension::Two);
        assert_eq!(data.len(), 4);
        assert!((data.mean_extent() - 1.0).abs() < 1e-12);
    }
}
