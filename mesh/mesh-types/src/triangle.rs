//! Triangle type for geometric calculations.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Aabb;

/// A triangle with concrete vertex positions.
///
/// Winding is **counter-clockwise (CCW) when viewed from the front**
/// (normal points toward viewer).
///
/// # Example
///
/// ```
/// use mesh_types::{Triangle, Point3};
///
/// let tri = Triangle::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// );
///
/// // Area of a right triangle with legs 1 and 1
/// assert!((tri.area() - 0.5).abs() < 1e-10);
///
/// // Normal points in +Z direction
/// let normal = tri.normal().unwrap();
/// assert!((normal.z - 1.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Triangle {
    /// First vertex.
    pub v0: Point3<f64>,
    /// Second vertex.
    pub v1: Point3<f64>,
    /// Third vertex.
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Create a new triangle from three points.
    #[inline]
    #[must_use]
    pub const fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// Create a triangle from coordinate arrays.
    #[inline]
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Point3::new is not const in nalgebra
    pub fn from_arrays(v0: [f64; 3], v1: [f64; 3], v2: [f64; 3]) -> Self {
        Self {
            v0: Point3::from(v0),
            v1: Point3::from(v1),
            v2: Point3::from(v2),
        }
    }

    /// The three corners in order.
    #[inline]
    #[must_use]
    pub const fn vertices(&self) -> [Point3<f64>; 3] {
        [self.v0, self.v1, self.v2]
    }

    /// Compute the (unnormalized) face normal via cross product.
    ///
    /// The direction follows the right-hand rule with CCW winding.
    /// The magnitude equals twice the triangle's area.
    #[inline]
    #[must_use]
    pub fn normal_unnormalized(&self) -> Vector3<f64> {
        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;
        e1.cross(&e2)
    }

    /// Compute the unit face normal.
    ///
    /// Returns `None` for degenerate triangles (zero area).
    #[must_use]
    pub fn normal(&self) -> Option<Vector3<f64>> {
        let n = self.normal_unnormalized();
        let len_sq = n.norm_squared();
        if len_sq > f64::EPSILON * f64::EPSILON {
            Some(n / len_sq.sqrt())
        } else {
            None
        }
    }

    /// Coefficients `(n, d)` of the supporting plane `n · x = d`, with `n`
    /// of unit length.
    ///
    /// Returns `None` for degenerate triangles.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Triangle, Point3};
    ///
    /// let tri = Triangle::from_arrays([0.0, 0.0, 2.0], [1.0, 0.0, 2.0], [0.0, 1.0, 2.0]);
    /// let (n, d) = tri.plane().unwrap();
    /// assert!((n.z - 1.0).abs() < 1e-12);
    /// assert!((d - 2.0).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn plane(&self) -> Option<(Vector3<f64>, f64)> {
        self.normal().map(|n| (n, n.dot(&self.v0.coords)))
    }

    /// Compute the area of the triangle.
    #[inline]
    #[must_use]
    pub fn area(&self) -> f64 {
        self.normal_unnormalized().norm() * 0.5
    }

    /// Check whether the triangle's area is below `tolerance`.
    #[inline]
    #[must_use]
    pub fn is_degenerate(&self, tolerance: f64) -> bool {
        self.area() <= tolerance
    }

    /// Smallest coordinate of the three corners along `axis`.
    #[inline]
    #[must_use]
    pub fn min_coord(&self, axis: usize) -> f64 {
        self.v0[axis].min(self.v1[axis]).min(self.v2[axis])
    }

    /// Largest coordinate of the three corners along `axis`.
    #[inline]
    #[must_use]
    pub fn max_coord(&self, axis: usize) -> f64 {
        self.v0[axis].max(self.v1[axis]).max(self.v2[axis])
    }

    /// Tight axis-aligned bounding box.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb {
            min: self.v0.inf(&self.v1).inf(&self.v2),
            max: self.v0.sup(&self.v1).sup(&self.v2),
        }
    }
}
