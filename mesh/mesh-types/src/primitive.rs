//! Surface primitives: triangles in 3D, segments in 2D.

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Aabb, Triangle};

/// Spatial dimension of a surface or query mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Dimension {
    /// Planar data in the `z = 0` plane; primitives are segments.
    Two,
    /// Volumetric data; primitives are triangles.
    Three,
}

impl Dimension {
    /// Number of coordinate axes (2 or 3).
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::Dimension;
    ///
    /// assert_eq!(Dimension::Two.axis_count(), 2);
    /// assert_eq!(Dimension::Three.axis_count(), 3);
    /// ```
    #[inline]
    #[must_use]
    pub const fn axis_count(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Two => write!(f, "2D"),
            Self::Three => write!(f, "3D"),
        }
    }
}

/// A line segment with concrete endpoint positions.
///
/// # Example
///
/// ```
/// use mesh_types::{Segment, Point3};
///
/// let seg = Segment::new(Point3::new(0.0, 0.0, 0.0), Point3::new(3.0, 4.0, 0.0));
/// assert!((seg.length() - 5.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Segment {
    /// Start point.
    pub a: Point3<f64>,
    /// End point.
    pub b: Point3<f64>,
}

impl Segment {
    /// Create a segment from two points.
    #[inline]
    #[must_use]
    pub const fn new(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self { a, b }
    }

    /// Length of the segment.
    #[inline]
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.b - self.a).norm()
    }

    /// Tight axis-aligned bounding box.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb {
            min: self.a.inf(&self.b),
            max: self.a.sup(&self.b),
        }
    }
}

/// One primitive of a surface description.
///
/// The engine stores primitives in a flat arena and addresses them by index.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Primitive {
    /// A triangle of a 3D surface.
    Triangle(Triangle),
    /// A segment of a 2D polyline.
    Segment(Segment),
}

impl Primitive {
    /// Dimension of the surface this primitive belongs to.
    #[inline]
    #[must_use]
    pub const fn dimension(&self) -> Dimension {
        match self {
            Self::Triangle(_) => Dimension::Three,
            Self::Segment(_) => Dimension::Two,
        }
    }

    /// Tight axis-aligned bounding box.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        match self {
            Self::Triangle(t) => t.bounds(),
            Self::Segment(s) => s.bounds(),
        }
    }

    /// Area of a triangle or length of a segment.
    #[must_use]
    pub fn measure(&self) -> f64 {
        match self {
            Self::Triangle(t) => t.area(),
            Self::Segment(s) => s.length(),
        }
    }

    /// Check whether the primitive has (near) zero area or length.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Primitive, Segment, Point3};
    ///
    /// let p = Primitive::Segment(Segment::new(Point3::origin(), Point3::origin()));
    /// assert!(p.is_degenerate(1e-12));
    /// ```
    #[inline]
    #[must_use]
    pub fn is_degenerate(&self, tolerance: f64) -> bool {
        self.measure() <= tolerance
    }

    /// Corner points of the primitive.
    #[must_use]
    pub fn corners(&self) -> Vec<Point3<f64>> {
        match self {
            Self::Triangle(t) => t.vertices().to_vec(),
            Self::Segment(s) => vec![s.a, s.b],
        }
    }
}
