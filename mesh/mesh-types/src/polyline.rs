//! Closed polylines in the plane.

use crate::{Dimension, Primitive, PrimitiveStore, Segment};
use nalgebra::{Point2, Point3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 2D surface made of line segments.
///
/// Vertices are planar; segments reference them by index. Each closed loop
/// bounds a region, and nested loops are allowed (parity decides inside).
///
/// # Example
///
/// ```
/// use mesh_types::{Polyline, Point2, PrimitiveStore};
///
/// let tri = Polyline::closed_loop(vec![
///     Point2::new(0.0, 0.0),
///     Point2::new(1.0, 0.0),
///     Point2::new(0.0, 1.0),
/// ]);
/// assert_eq!(tri.primitive_count(), 3);
/// ```
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Polyline {
    /// Vertex positions.
    pub vertices: Vec<Point2<f64>>,
    /// Segments as index pairs into `vertices`.
    pub segments: Vec<[u32; 2]>,
}

impl Polyline {
    /// Create an empty polyline.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            segments: Vec::new(),
        }
    }

    /// Create a single closed loop through the given points.
    ///
    /// The last point connects back to the first.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    // Truncation: segment indices are u32, loops with > 4B points are unsupported
    pub fn closed_loop(points: Vec<Point2<f64>>) -> Self {
        let n = points.len() as u32;
        let segments = (0..n).map(|i| [i, (i + 1) % n]).collect();
        Self {
            vertices: points,
            segments,
        }
    }

    /// Append another closed loop, offsetting its indices.
    #[allow(clippy::cast_possible_truncation)]
    pub fn push_loop(&mut self, points: &[Point2<f64>]) {
        let offset = self.vertices.len() as u32;
        let n = points.len() as u32;
        self.vertices.extend_from_slice(points);
        self.segments
            .extend((0..n).map(|i| [offset + i, offset + (i + 1) % n]));
    }

    /// Get a segment with resolved positions in the `z = 0` plane.
    #[must_use]
    pub fn segment(&self, index: usize) -> Option<Segment> {
        let [a, b] = *self.segments.get(index)?;
        let a = self.vertices.get(a as usize)?;
        let b = self.vertices.get(b as usize)?;
        Some(Segment::new(
            Point3::new(a.x, a.y, 0.0),
            Point3::new(b.x, b.y, 0.0),
        ))
    }
}

impl PrimitiveStore for Polyline {
    fn dimension(&self) -> Dimension {
        Dimension::Two
    }

    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn primitive_count(&self) -> usize {
        self.segments.len()
    }

    fn primitive_indices(&self, index: usize) -> Option<Vec<u32>> {
        self.segments.get(index).map(|s| s.to_vec())
    }

    fn primitive(&self, index: usize) -> Option<Primitive> {
        self.segment(index).map(Primitive::Segment)
    }
}

/// Helper function to create a unit square loop from (0,0) to (1,1).
///
/// # Example
///
/// ```
/// use mesh_types::{unit_square, PrimitiveStore};
///
/// assert_eq!(unit_square().primitive_count(), 4);
/// ```
#[must_use]
pub fn unit_square() -> Polyline {
    Polyline::closed_loop(vec![
        Point2::new(0.0, 0.0),
        Point2::new(1.0, 0.0),
        Point2::new(1.0, 1.0),
        Point2::new(0.0, 1.0),
    ])
}
