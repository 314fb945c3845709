//! Axis-aligned bounding box.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box (AABB).
///
/// Represents a 3D box aligned with the coordinate axes, defined by
/// minimum and maximum corner points.
///
/// # Example
///
/// ```
/// use mesh_types::{Aabb, Point3};
///
/// let aabb = Aabb::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(10.0, 10.0, 10.0),
/// );
///
/// assert_eq!(aabb.size(), Point3::new(10.0, 10.0, 10.0).coords);
/// assert!(aabb.contains(&Point3::new(5.0, 5.0, 5.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner (smallest x, y, z values).
    pub min: Point3<f64>,
    /// Maximum corner (largest x, y, z values).
    pub max: Point3<f64>,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    /// Create a new AABB from minimum and maximum corners.
    ///
    /// The corners are automatically corrected if min > max for any axis.
    #[must_use]
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self {
            min: Point3::new(min.x.min(max.x), min.y.min(max.y), min.z.min(max.z)),
            max: Point3::new(min.x.max(max.x), min.y.max(max.y), min.z.max(max.z)),
        }
    }

    /// Create an empty (invalid) AABB.
    ///
    /// An empty AABB has min > max, which is useful as a starting point
    /// for expanding to include points.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Aabb, Point3};
    ///
    /// let mut aabb = Aabb::empty();
    /// assert!(aabb.is_empty());
    ///
    /// aabb.expand_to_include(&Point3::new(1.0, 2.0, 3.0));
    /// assert!(!aabb.is_empty());
    /// ```
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Point3::new is not const in nalgebra
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Create an AABB from an iterator of points.
    ///
    /// Returns an empty AABB if the iterator is empty.
    #[must_use]
    pub fn from_points<'a>(points: impl Iterator<Item = &'a Point3<f64>>) -> Self {
        let mut aabb = Self::empty();
        for point in points {
            aabb.expand_to_include(point);
        }
        aabb
    }

    /// Create a cube-shaped AABB centered on a point.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Aabb, Point3};
    ///
    /// let aabb = Aabb::around(Point3::new(1.0, 1.0, 1.0), 0.5);
    /// assert_eq!(aabb.min, Point3::new(0.5, 0.5, 0.5));
    /// assert_eq!(aabb.max, Point3::new(1.5, 1.5, 1.5));
    /// ```
    #[must_use]
    pub fn around(center: Point3<f64>, half_width: f64) -> Self {
        let h = Vector3::repeat(half_width.abs());
        Self {
            min: center - h,
            max: center + h,
        }
    }

    /// Check if the AABB is empty (has no valid volume).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Get the size (dimensions) of the AABB.
    #[inline]
    #[must_use]
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Get the diagonal length of the AABB.
    #[inline]
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.size().norm()
    }

    /// Lower bound along one axis (0 = X, 1 = Y, 2 = Z).
    #[inline]
    #[must_use]
    pub fn axis_min(&self, axis: usize) -> f64 {
        self.min[axis]
    }

    /// Upper bound along one axis (0 = X, 1 = Y, 2 = Z).
    #[inline]
    #[must_use]
    pub fn axis_max(&self, axis: usize) -> f64 {
        self.max[axis]
    }

    /// Check if the AABB contains a point.
    ///
    /// Points on the boundary are considered inside.
    #[inline]
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|axis| point[axis] >= self.min[axis] && point[axis] <= self.max[axis])
    }

    /// Check if this AABB intersects another AABB.
    ///
    /// Touching AABBs are considered intersecting.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Aabb, Point3};
    ///
    /// let a = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 10.0, 10.0));
    /// let b = Aabb::new(Point3::new(5.0, 5.0, 5.0), Point3::new(15.0, 15.0, 15.0));
    /// let c = Aabb::new(Point3::new(20.0, 20.0, 20.0), Point3::new(30.0, 30.0, 30.0));
    ///
    /// assert!(a.intersects(&b));
    /// assert!(!a.intersects(&c));
    /// ```
    #[inline]
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.max[axis] && self.max[axis] >= other.min[axis])
    }

    /// Euclidean distance from a point to the box (zero inside).
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Aabb, Point3};
    ///
    /// let aabb = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
    /// assert!((aabb.distance_to_point(&Point3::new(4.0, 0.5, 0.5)) - 3.0).abs() < 1e-12);
    /// assert_eq!(aabb.distance_to_point(&Point3::new(0.5, 0.5, 0.5)), 0.0);
    /// ```
    #[must_use]
    pub fn distance_to_point(&self, point: &Point3<f64>) -> f64 {
        let mut sq = 0.0;
        for axis in 0..3 {
            let below = self.min[axis] - point[axis];
            let above = point[axis] - self.max[axis];
            let d = below.max(above).max(0.0);
            sq += d * d;
        }
        sq.sqrt()
    }

    /// Expand the AABB to include a point.
    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    /// Compute the union (enclosing AABB) of two AABBs.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Return a copy grown by `margin` on every side.
    #[must_use]
    pub fn expanded(&self, margin: f64) -> Self {
        let m = Vector3::repeat(margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_orders_corners() {
        let aabb = Aabb::new(Point3::new(1.0, 0.0, 5.0), Point3::new(0.0, 2.0, 3.0));
        assert_eq!(aabb.min, Point3::new(0.0, 0.0, 3.0));
        assert_eq!(aabb.max, Point3::new(1.0, 2.0, 5.0));
    }

    #[test]
    fn empty_has_zero_diagonal() {
        assert!(Aabb::empty().diagonal().abs() < f64::EPSILON);
    }

    #[test]
    fn union_with_empty() {
        let a = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        assert_eq!(a.union(&Aabb::empty()), a);
        assert_eq!(Aabb::empty().union(&a), a);
    }

    #[test]
    fn distance_to_corner() {
        let a = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let d = a.distance_to_point(&Point3::new(2.0, 2.0, 2.0));
        assert!((d - 3.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn expanded_contains_neighbors() {
        let a = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)).expanded(0.1);
        assert!(a.contains(&Point3::new(-0.05, 1.05, 0.5)));
        assert!(!a.contains(&Point3::new(-0.2, 0.5, 0.5)));
    }
}
