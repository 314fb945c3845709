//! Geometric query utilities for SDF computation.
//!
//! Provides closest-point distances to primitives and the axis-aligned ray
//! crossing tests used for parity counting: a tolerant one that flags
//! edge and vertex hits, and an exact half-open one that settles them.

use mesh_types::{Primitive, Segment, Triangle};
use nalgebra::{Point3, Vector2};

/// Compute the closest point on a triangle to a query point.
///
/// This implements the algorithm from "Real-Time Collision Detection" by Christer Ericson.
///
/// # Arguments
///
/// * `point` - The query point
/// * `v0`, `v1`, `v2` - The triangle vertices
///
/// # Returns
///
/// The closest point on the triangle.
#[must_use]
pub fn closest_point_on_triangle(
    point: Point3<f64>,
    v0: Point3<f64>,
    v1: Point3<f64>,
    v2: Point3<f64>,
) -> Point3<f64> {
    let ab = v1 - v0;
    let ac = v2 - v0;
    let ap = point - v0;

    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);

    // Vertex region A
    if d1 <= 0.0 && d2 <= 0.0 {
        return v0;
    }

    let bp = point - v1;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);

    // Vertex region B
    if d3 >= 0.0 && d4 <= d3 {
        return v1;
    }

    // Edge region AB
    let vc = d1.mul_add(d4, -(d3 * d2));
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return v0 + ab * v;
    }

    let cp = point - v2;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);

    // Vertex region C
    if d6 >= 0.0 && d5 <= d6 {
        return v2;
    }

    // Edge region AC
    let vb = d5.mul_add(d2, -(d1 * d6));
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return v0 + ac * w;
    }

    // Edge region BC
    let va = d3.mul_add(d6, -(d5 * d4));
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return v1 + (v2 - v1) * w;
    }

    // Face region
    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;

    v0 + ab * v + ac * w
}

/// Compute the squared distance from a point to a line segment.
///
/// # Arguments
///
/// * `point` - The query point
/// * `a`, `b` - Line segment endpoints
///
/// # Returns
///
/// The squared distance to the segment.
#[must_use]
pub fn point_segment_distance_squared(point: Point3<f64>, a: Point3<f64>, b: Point3<f64>) -> f64 {
    let ab = b - a;
    let ap = point - a;

    let t = ap.dot(&ab) / ab.norm_squared().max(f64::EPSILON);
    let t_clamped = t.clamp(0.0, 1.0);

    let closest = a + ab * t_clamped;
    (point - closest).norm_squared()
}

/// Squared distance from a point to the finite extent of a primitive.
///
/// # Example
///
/// ```
/// use mesh_sdf::primitive_distance_squared;
/// use mesh_types::{Primitive, Triangle, Point3};
///
/// let tri = Primitive::Triangle(Triangle::from_arrays(
///     [0.0, 0.0, 0.0],
///     [1.0, 0.0, 0.0],
///     [0.0, 1.0, 0.0],
/// ));
/// let d2 = primitive_distance_squared(Point3::new(0.25, 0.25, 2.0), &tri);
/// assert!((d2 - 4.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn primitive_distance_squared(point: Point3<f64>, primitive: &Primitive) -> f64 {
    match primitive {
        Primitive::Triangle(t) => {
            let closest = closest_point_on_triangle(point, t.v0, t.v1, t.v2);
            (point - closest).norm_squared()
        }
        Primitive::Segment(s) => point_segment_distance_squared(point, s.a, s.b),
    }
}

/// Where an axis-aligned ray meets a primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisHit {
    /// The ray passes cleanly through the interior of the primitive at the
    /// given coordinate along the ray axis.
    Crossing(f64),
    /// The ray passes within tolerance of an edge or vertex (or runs along a
    /// segment) at the given coordinate; parity cannot be trusted.
    Degenerate(f64),
}

impl AxisHit {
    /// Coordinate of the hit along the ray axis.
    #[must_use]
    pub const fn coordinate(self) -> f64 {
        match self {
            Self::Crossing(c) | Self::Degenerate(c) => c,
        }
    }
}

/// Intersect the infinite line through `point` along `axis` with a primitive.
///
/// The caller decides which side of the point a hit lies on; this only
/// reports where the supporting line meets the primitive and whether the
/// meeting is robust. Rays parallel to a triangle's plane never hit it.
///
/// `epsilon` is the distance (measured perpendicular to the ray) within which
/// an edge or vertex counts as touched.
#[must_use]
pub fn axis_ray_hit(point: &Point3<f64>, axis: usize, primitive: &Primitive, epsilon: f64) -> Option<AxisHit> {
    match primitive {
        Primitive::Triangle(t) => triangle_hit(point, axis, t, epsilon),
        Primitive::Segment(s) => segment_hit(point, axis, s, epsilon),
    }
}

fn cross2(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x.mul_add(b.y, -(a.y * b.x))
}

fn triangle_hit(point: &Point3<f64>, axis: usize, tri: &Triangle, epsilon: f64) -> Option<AxisHit> {
    let b = (axis + 1) % 3;
    let c = (axis + 2) % 3;
    let project = |v: &Point3<f64>| Vector2::new(v[b], v[c]);

    let v = tri.vertices();
    let q = [project(&v[0]), project(&v[1]), project(&v[2])];
    let p = project(point);

    let edges = [q[2] - q[1], q[0] - q[2], q[1] - q[0]];
    let starts = [q[1], q[2], q[0]];

    let area2 = cross2(&edges[2], &(q[2] - q[0]));
    let scale = edges.iter().map(Vector2::norm_squared).fold(0.0, f64::max);
    if area2.abs() <= 1e-12 * scale {
        return None;
    }

    // Barycentrics in the projected plane, and signed distance of the ray to
    // each edge line (positive inside).
    let mut lambda = [0.0; 3];
    let mut min_edge_distance = f64::INFINITY;
    for i in 0..3 {
        lambda[i] = cross2(&edges[i], &(p - starts[i])) / area2;
        let distance = lambda[i] * area2.abs() / edges[i].norm();
        min_edge_distance = min_edge_distance.min(distance);
    }

    if min_edge_distance < -epsilon {
        return None;
    }

    let coordinate = lambda[0].mul_add(v[0][axis], lambda[1].mul_add(v[1][axis], lambda[2] * v[2][axis]));
    if min_edge_distance <= epsilon {
        Some(AxisHit::Degenerate(coordinate))
    } else {
        Some(AxisHit::Crossing(coordinate))
    }
}

fn segment_hit(point: &Point3<f64>, axis: usize, seg: &Segment, epsilon: f64) -> Option<AxisHit> {
    // Segments live in the xy-plane; the other in-plane axis is the only
    // perpendicular one.
    let perp = 1 - axis.min(1);
    let (a, b) = (&seg.a, &seg.b);
    let span = b[perp] - a[perp];

    if span.abs() <= f64::EPSILON * (b - a).norm().max(1.0) {
        // Parallel to the ray: only a collinear segment matters.
        if (point[perp] - a[perp]).abs() > epsilon {
            return None;
        }
        let lo = a[axis].min(b[axis]);
        let hi = a[axis].max(b[axis]);
        return Some(AxisHit::Degenerate(point[axis].clamp(lo, hi)));
    }

    let da = (point[perp] - a[perp]).abs();
    let db = (point[perp] - b[perp]).abs();
    if da <= epsilon || db <= epsilon {
        let coordinate = if da <= db { a[axis] } else { b[axis] };
        return Some(AxisHit::Degenerate(coordinate));
    }

    let t = (point[perp] - a[perp]) / span;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    Some(AxisHit::Crossing(t.mul_add(b[axis] - a[axis], a[axis])))
}

/// Half-open crossing test for the line through `point` along `axis`.
///
/// Returns the hit coordinate along the axis, or `None` when the line misses.
/// Unlike [`axis_ray_hit`] there is no tolerance band: a line through an edge
/// or vertex shared by several primitives of a closed surface is counted by
/// exactly one of them, as if `point` were nudged by an infinitesimal fixed
/// offset. Edge functions are evaluated with the edge's endpoints in a
/// canonical order so neighbors sharing an edge agree bit for bit.
#[must_use]
pub fn axis_ray_owned_hit(point: &Point3<f64>, axis: usize, primitive: &Primitive) -> Option<f64> {
    match primitive {
        Primitive::Triangle(t) => triangle_owned_hit(point, axis, t),
        Primitive::Segment(s) => segment_owned_hit(point, axis, s),
    }
}

/// Edge function of `p` against the directed edge `from -> to`, computed
/// the same way for both directions of the edge.
fn canonical_edge_function(from: &Vector2<f64>, to: &Vector2<f64>, p: &Vector2<f64>) -> f64 {
    if (from.x, from.y) <= (to.x, to.y) {
        cross2(&(to - from), &(p - from))
    } else {
        -cross2(&(from - to), &(p - to))
    }
}

/// Whether a counter-clockwise edge with direction `d` owns the points on
/// it. Matches a nudge of the query point towards `(1, tiny)`.
fn owns_edge(d: &Vector2<f64>) -> bool {
    d.y < 0.0 || (d.y == 0.0 && d.x > 0.0)
}

fn triangle_owned_hit(point: &Point3<f64>, axis: usize, tri: &Triangle) -> Option<f64> {
    let b = (axis + 1) % 3;
    let c = (axis + 2) % 3;
    let project = |v: &Point3<f64>| Vector2::new(v[b], v[c]);

    let v = tri.vertices();
    let q = [project(&v[0]), project(&v[1]), project(&v[2])];
    let p = project(point);

    let area2 = cross2(&(q[1] - q[0]), &(q[2] - q[0]));
    if area2 == 0.0 || !area2.is_finite() {
        return None;
    }
    let orientation = area2.signum();

    // weights[i] belongs to the edge opposite vertex i.
    let mut weights = [0.0; 3];
    for (i, weight) in weights.iter_mut().enumerate() {
        let from = q[(i + 1) % 3];
        let to = q[(i + 2) % 3];
        let w = orientation * canonical_edge_function(&from, &to, &p);
        if w < 0.0 || (w == 0.0 && !owns_edge(&((to - from) * orientation))) {
            return None;
        }
        *weight = w;
    }

    let total = weights[0] + weights[1] + weights[2];
    if total <= 0.0 {
        return None;
    }
    let coordinate = weights.iter().zip(&v).map(|(w, vertex)| w / total * vertex[axis]).sum();
    Some(coordinate)
}

fn segment_owned_hit(point: &Point3<f64>, axis: usize, seg: &Segment) -> Option<f64> {
    let perp = 1 - axis.min(1);
    let (lo, hi) = if seg.a[perp] <= seg.b[perp] {
        (&seg.a, &seg.b)
    } else {
        (&seg.b, &seg.a)
    };

    // Lower endpoint included, upper excluded; collinear segments never count.
    if !(lo[perp] <= point[perp] && point[perp] < hi[perp]) {
        return None;
    }
    let t = (point[perp] - lo[perp]) / (hi[perp] - lo[perp]);
    Some(t.mul_add(hi[axis] - lo[axis], lo[axis]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn simple_triangle() -> (Point3<f64>, Point3<f64>, Point3<f64>) {
        (
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(5.0, 10.0, 0.0),
        )
    }

    fn flat_triangle() -> Primitive {
        let (v0, v1, v2) = simple_triangle();
        Primitive::Triangle(Triangle::new(v0, v1, v2))
    }

    #[test]
    fn closest_point_inside_triangle() {
        let (v0, v1, v2) = simple_triangle();
        let point = Point3::new(5.0, 3.0, 5.0);

        let closest = closest_point_on_triangle(point, v0, v1, v2);

        assert_relative_eq!(closest.z, 0.0, epsilon = 1e-10);
        assert_relative_eq!(closest.x, 5.0, epsilon = 1e-10);
        assert_relative_eq!(closest.y, 3.0, epsilon = 1e-10);
    }

    #[test]
    fn closest_point_vertex_region() {
        let (v0, v1, v2) = simple_triangle();

        let point = Point3::new(-5.0, -5.0, 0.0);
        let closest = closest_point_on_triangle(point, v0, v1, v2);

        assert_relative_eq!(closest.x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(closest.y, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn closest_point_edge_region() {
        let (v0, v1, v2) = simple_triangle();

        let point = Point3::new(5.0, -5.0, 0.0);
        let closest = closest_point_on_triangle(point, v0, v1, v2);

        assert_relative_eq!(closest.y, 0.0, epsilon = 1e-10);
        assert_relative_eq!(closest.x, 5.0, epsilon = 1e-10);
    }

    #[test]
    fn segment_distance_midpoint() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(10.0, 0.0, 0.0);
        let point = Point3::new(5.0, 5.0, 0.0);

        assert_relative_eq!(point_segment_distance_squared(point, a, b), 25.0, epsilon = 1e-10);
    }

    #[test]
    fn segment_distance_endpoint() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(10.0, 0.0, 0.0);
        let point = Point3::new(-5.0, 0.0, 0.0);

        assert_relative_eq!(point_segment_distance_squared(point, a, b), 25.0, epsilon = 1e-10);
    }

    #[test]
    fn ray_crosses_triangle_interior() {
        let hit = axis_ray_hit(&Point3::new(5.0, 3.0, -2.0), 2, &flat_triangle(), 1e-6);
        match hit {
            Some(AxisHit::Crossing(c)) => assert_relative_eq!(c, 0.0, epsilon = 1e-12),
            other => panic!("expected crossing, got {other:?}"),
        }
    }

    #[test]
    fn ray_crossing_coordinate_on_tilted_triangle() {
        let tri = Primitive::Triangle(Triangle::from_arrays(
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 1.0],
            [0.0, 1.0, 0.0],
        ));
        // Plane z = x.
        let hit = axis_ray_hit(&Point3::new(0.25, 0.25, -5.0), 2, &tri, 1e-6);
        assert_relative_eq!(hit.map_or(f64::NAN, AxisHit::coordinate), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn ray_misses_triangle() {
        let hit = axis_ray_hit(&Point3::new(100.0, 100.0, 5.0), 2, &flat_triangle(), 1e-6);
        assert!(hit.is_none());
    }

    #[test]
    fn ray_parallel_to_triangle() {
        let hit = axis_ray_hit(&Point3::new(-5.0, 3.0, 0.0), 0, &flat_triangle(), 1e-6);
        assert!(hit.is_none());
    }

    #[test]
    fn ray_through_edge_is_degenerate() {
        // Edge v0-v1 lies on y = 0.
        let hit = axis_ray_hit(&Point3::new(5.0, 0.001, 3.0), 2, &flat_triangle(), 0.01);
        assert!(matches!(hit, Some(AxisHit::Degenerate(_))));

        let hit = axis_ray_hit(&Point3::new(5.0, -0.001, 3.0), 2, &flat_triangle(), 0.01);
        assert!(matches!(hit, Some(AxisHit::Degenerate(_))));

        let hit = axis_ray_hit(&Point3::new(5.0, -0.1, 3.0), 2, &flat_triangle(), 0.01);
        assert!(hit.is_none());
    }

    #[test]
    fn ray_through_vertex_is_degenerate() {
        let hit = axis_ray_hit(&Point3::new(0.0, 0.0, 1.0), 2, &flat_triangle(), 1e-3);
        assert!(matches!(hit, Some(AxisHit::Degenerate(_))));
    }

    #[test]
    fn segment_crossing() {
        let seg = Primitive::Segment(Segment::new(Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 2.0, 0.0)));

        let hit = axis_ray_hit(&Point3::new(0.0, 0.5, 0.0), 0, &seg, 1e-3);
        assert_eq!(hit, Some(AxisHit::Crossing(1.0)));

        let hit = axis_ray_hit(&Point3::new(0.0, 2.0, 0.0), 0, &seg, 1e-3);
        assert_eq!(hit, Some(AxisHit::Degenerate(1.0)));

        let hit = axis_ray_hit(&Point3::new(0.0, 3.0, 0.0), 0, &seg, 1e-3);
        assert!(hit.is_none());
    }

    #[test]
    fn segment_collinear_with_ray() {
        let seg = Primitive::Segment(Segment::new(Point3::new(2.0, 1.0, 0.0), Point3::new(4.0, 1.0, 0.0)));

        let hit = axis_ray_hit(&Point3::new(0.0, 1.0, 0.0), 0, &seg, 1e-3);
        assert_eq!(hit, Some(AxisHit::Degenerate(2.0)));

        let hit = axis_ray_hit(&Point3::new(3.0, 1.0, 0.0), 0, &seg, 1e-3);
        assert_eq!(hit, Some(AxisHit::Degenerate(3.0)));

        let hit = axis_ray_hit(&Point3::new(0.0, 1.5, 0.0), 0, &seg, 1e-3);
        assert!(hit.is_none());
    }

    /// Square `[0, 2]²` at height `z` split along both diagonals around the
    /// center vertex `(1, 1)`.
    fn square_fan(z: f64) -> Vec<Primitive> {
        let corner = |x: f64, y: f64| Point3::new(x, y, z);
        let center = corner(1.0, 1.0);
        let ring = [corner(0.0, 0.0), corner(2.0, 0.0), corner(2.0, 2.0), corner(0.0, 2.0)];
        (0..4)
            .map(|i| Primitive::Triangle(Triangle::new(ring[i], ring[(i + 1) % 4], center)))
            .collect()
    }

    fn owned_count(point: &Point3<f64>, axis: usize, primitives: &[Primitive]) -> usize {
        primitives
            .iter()
            .filter(|p| axis_ray_owned_hit(point, axis, p).is_some())
            .count()
    }

    #[test]
    fn owned_hit_counts_shared_edges_once() {
        let fan = square_fan(3.0);
        // Interior, on a diagonal, on the shared center vertex.
        for (x, y) in [(0.7, 0.4), (0.5, 0.5), (1.5, 0.5), (1.0, 1.0), (0.25, 1.75)] {
            let p = Point3::new(x, y, 0.0);
            assert_eq!(owned_count(&p, 2, &fan), 1, "({x}, {y})");
        }
        let hit = fan.iter().find_map(|t| axis_ray_owned_hit(&Point3::new(0.5, 0.5, 0.0), 2, t));
        assert_relative_eq!(hit.unwrap_or(f64::NAN), 3.0);
    }

    #[test]
    fn owned_hit_is_orientation_independent() {
        let flipped: Vec<Primitive> = square_fan(3.0)
            .into_iter()
            .map(|p| match p {
                Primitive::Triangle(t) => Primitive::Triangle(Triangle::new(t.v0, t.v2, t.v1)),
                other @ Primitive::Segment(_) => other,
            })
            .collect();
        assert_eq!(owned_count(&Point3::new(0.5, 0.5, 0.0), 2, &flipped), 1);
        assert_eq!(owned_count(&Point3::new(1.0, 1.0, 0.0), 2, &flipped), 1);
    }

    #[test]
    fn owned_hit_on_outer_boundary_is_consistent() {
        // Two stacked copies seen along the same line: a line along the
        // boundary is owned by both or neither, never one.
        let mut stacked = square_fan(1.0);
        stacked.extend(square_fan(3.0));
        for (x, y) in [(0.0, 0.5), (2.0, 0.5), (0.5, 0.0), (0.5, 2.0), (0.0, 0.0), (2.0, 2.0)] {
            let count = owned_count(&Point3::new(x, y, 0.0), 2, &stacked);
            assert_eq!(count % 2, 0, "({x}, {y}) counted {count} times");
        }
        assert_eq!(owned_count(&Point3::new(2.5, 0.5, 0.0), 2, &stacked), 0);
    }

    #[test]
    fn owned_segment_hit_is_half_open() {
        let lower = Primitive::Segment(Segment::new(Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 2.0, 0.0)));
        let upper = Primitive::Segment(Segment::new(Point3::new(1.0, 2.0, 0.0), Point3::new(1.0, 4.0, 0.0)));
        let at_joint = Point3::new(0.0, 2.0, 0.0);

        assert_eq!(axis_ray_owned_hit(&at_joint, 0, &lower), None);
        assert_eq!(axis_ray_owned_hit(&at_joint, 0, &upper), Some(1.0));
        assert_eq!(axis_ray_owned_hit(&Point3::new(0.0, 1.0, 0.0), 0, &lower), Some(1.0));

        let flat = Primitive::Segment(Segment::new(Point3::new(2.0, 1.0, 0.0), Point3::new(4.0, 1.0, 0.0)));
        assert_eq!(axis_ray_owned_hit(&Point3::new(0.0, 1.0, 0.0), 0, &flat), None);
    }

    #[test]
    fn primitive_distance_dispatch() {
        let seg = Primitive::Segment(Segment::new(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 4.0, 0.0)));
        assert_relative_eq!(primitive_distance_squared(Point3::new(3.0, 2.0, 0.0), &seg), 9.0, epsilon = 1e-12);
        assert_relative_eq!(
            primitive_distance_squared(Point3::new(5.0, 3.0, -4.0), &flat_triangle()),
            16.0,
            epsilon = 1e-10
        );
    }
}
