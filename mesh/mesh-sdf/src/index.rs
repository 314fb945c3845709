//! Spatial candidate index over primitive bounding intervals.
//!
//! Each active axis (x and y in 2D, x, y and z in 3D) gets a uniform binning
//! of the surface's coordinate range. A primitive is registered in every bin
//! its padded bounding interval overlaps, so a lookup never misses a
//! primitive whose interval lies within the padding of the query coordinate.
//!
//! Queries look up one bin per relevant axis, scan the smallest one, and
//! filter by the exact bounding boxes.

use mesh_types::{Aabb, Dimension, Point3};
use tracing::debug;

use crate::data::BoundingData;

/// Upper limit on bins per axis.
const MAX_BINS: usize = 1024;

/// Uniform bins over one coordinate axis.
#[derive(Debug, Clone)]
struct AxisBins {
    origin: f64,
    width: f64,
    bins: Vec<Vec<u32>>,
}

impl AxisBins {
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn build(boxes: &[Aabb], axis: usize, lo: f64, hi: f64, count: usize, padding: f64) -> Self {
        let count = count.max(1);
        let span = hi - lo;
        let (count, width) = if span > 0.0 {
            (count, span / count as f64)
        } else {
            (1, 1.0)
        };

        let mut axis_bins = Self {
            origin: lo,
            width,
            bins: vec![Vec::new(); count],
        };

        for (i, b) in boxes.iter().enumerate() {
            let range = axis_bins.range(b.min[axis] - padding, b.max[axis] + padding);
            for bin in &mut axis_bins.bins[range] {
                bin.push(i as u32);
            }
        }

        axis_bins
    }

    fn upper(&self) -> f64 {
        self.width.mul_add(self.bins.len() as f64, self.origin)
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn clamp_bin(&self, x: f64) -> usize {
        let last = self.bins.len() - 1;
        let t = ((x - self.origin) / self.width).floor();
        if t <= 0.0 {
            0
        } else if t >= last as f64 {
            last
        } else {
            t as usize
        }
    }

    /// Bin holding `x`, or `None` if `x` lies outside the binned range.
    fn bin_of(&self, x: f64) -> Option<&[u32]> {
        if x < self.origin || x > self.upper() {
            return None;
        }
        self.bins.get(self.clamp_bin(x)).map(Vec::as_slice)
    }

    /// Bins overlapping `[lo, hi]`, empty if the interval misses the range.
    fn range(&self, lo: f64, hi: f64) -> std::ops::Range<usize> {
        if hi < self.origin || lo > self.upper() {
            return 0..0;
        }
        self.clamp_bin(lo)..self.clamp_bin(hi) + 1
    }
}

/// Binned lookup of primitives by axis-aligned ray or box.
#[derive(Debug, Clone)]
pub struct CandidateIndex {
    dimension: Dimension,
    axes: Vec<AxisBins>,
    padding: f64,
    cell_size: f64,
    bounds: Aabb,
}

impl CandidateIndex {
    /// Bin the primitives of `data` along every active axis.
    ///
    /// `padding` widens each primitive's interval before registration and is
    /// the largest tolerance [`ray_candidates`](Self::ray_candidates) may be
    /// called with.
    #[must_use]
    pub fn build(data: &BoundingData, padding: f64) -> Self {
        let padding = padding.abs();
        let bounds = data.bounds().expanded(padding);
        let bin_count = data.len().clamp(1, MAX_BINS);
        let axis_count = data.dimension().axis_count();

        let axes = (0..axis_count)
            .map(|axis| {
                AxisBins::build(
                    data.boxes(),
                    axis,
                    bounds.min[axis],
                    bounds.max[axis],
                    bin_count,
                    padding,
                )
            })
            .collect();

        let cell_size = data.mean_extent().max(padding).max(f64::EPSILON);

        debug!(
            primitives = data.len(),
            bins_per_axis = bin_count,
            cell_size,
            "Built candidate index"
        );

        Self {
            dimension: data.dimension(),
            axes,
            padding,
            cell_size,
            bounds,
        }
    }

    /// Dimension of the indexed surface.
    #[must_use]
    pub const fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Typical primitive extent; the sweep grows its search box in these steps.
    #[must_use]
    pub const fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Padded bounding box of the whole surface.
    #[must_use]
    pub const fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Axes perpendicular to a ray along `axis`.
    fn perpendicular(&self, axis: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.axes.len()).filter(move |&a| a != axis)
    }

    /// Primitives whose bounding box can meet the ray from `point` towards
    /// `+axis`, within `epsilon` of its start.
    ///
    /// A point outside the surface's range on any perpendicular axis gets an
    /// empty set. The result is sorted by arena index.
    #[must_use]
    pub fn ray_candidates(&self, data: &BoundingData, point: &Point3<f64>, axis: usize, epsilon: f64) -> Vec<u32> {
        let epsilon = epsilon.min(self.padding);

        let mut smallest: Option<&[u32]> = None;
        for perp in self.perpendicular(axis) {
            let Some(bin) = self.axes[perp].bin_of(point[perp]) else {
                return Vec::new();
            };
            if smallest.is_none_or(|s| bin.len() < s.len()) {
                smallest = Some(bin);
            }
        }

        let Some(bin) = smallest else {
            return Vec::new();
        };

        bin.iter()
            .copied()
            .filter(|&i| {
                data.bounds_of(i as usize).is_some_and(|b| {
                    b.max[axis] >= point[axis] - epsilon
                        && self
                            .perpendicular(axis)
                            .all(|p| b.min[p] - epsilon <= point[p] && point[p] <= b.max[p] + epsilon)
                })
            })
            .collect()
    }

    /// Primitives whose bounding box intersects `query`, sorted by arena index.
    #[must_use]
    pub fn box_candidates(&self, data: &BoundingData, query: &Aabb) -> Vec<u32> {
        let mut best: Option<(usize, std::ops::Range<usize>)> = None;
        let mut best_len = usize::MAX;

        for (axis, bins) in self.axes.iter().enumerate() {
            let range = bins.range(query.min[axis], query.max[axis]);
            if range.is_empty() {
                return Vec::new();
            }
            let len: usize = bins.bins[range.clone()].iter().map(Vec::len).sum();
            if len < best_len {
                best_len = len;
                best = Some((axis, range));
            }
        }

        let Some((axis, range)) = best else {
            return Vec::new();
        };

        let mut found: Vec<u32> = self.axes[axis].bins[range].iter().flatten().copied().collect();
        found.sort_unstable();
        found.dedup();
        found.retain(|&i| data.bounds_of(i as usize).is_some_and(|b| b.intersects(query)));
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::{IndexedMesh, unit_cube, unit_square};

    fn cube_index() -> (BoundingData, CandidateIndex) {
        let data = BoundingData::build(&unit_cube()).expect("cube builds");
        let index = CandidateIndex::build(&data, 0.01);
        (data, index)
    }

    fn brute_ray(data: &BoundingData, p: &Point3<f64>, axis: usize, eps: f64) -> Vec<u32> {
        (0..data.len())
            .filter(|&i| {
                let b = data.boxes()[i];
                b.max[axis] >= p[axis] - eps
                    && (0..3)
                        .filter(|&a| a != axis)
                        .all(|a| b.min[a] - eps <= p[a] && p[a] <= b.max[a] + eps)
            })
            .map(|i| i as u32)
            .collect()
    }

    #[test]
    fn ray_candidates_match_brute_force() {
        let (data, index) = cube_index();
        let points = [
            Point3::new(0.5, 0.5, 0.5),
            Point3::new(0.3, 0.7, 0.1),
            Point3::new(-0.5, 0.2, 0.9),
            Point3::new(0.995, 0.0, 1.0),
        ];
        for p in &points {
            for axis in 0..3 {
                assert_eq!(index.ray_candidates(&data, p, axis, 0.01), brute_ray(&data, p, axis, 0.01));
            }
        }
    }

    #[test]
    fn ray_from_centroid_sees_top_face_only() {
        let (data, index) = cube_index();
        let found = index.ray_candidates(&data, &Point3::new(0.5, 0.5, 0.5), 2, 0.01);
        // Side faces are flat across the ray, the bottom is behind it.
        assert_eq!(found, vec![2, 3]);
    }

    #[test]
    fn far_point_has_no_ray_candidates() {
        let (data, index) = cube_index();
        let far = Point3::new(50.0, 50.0, 50.0);
        for axis in 0..3 {
            assert!(index.ray_candidates(&data, &far, axis, 0.01).is_empty());
        }
        // Beyond the surface along the ray axis itself.
        assert!(index.ray_candidates(&data, &Point3::new(5.0, 0.5, 0.5), 0, 0.01).is_empty());
    }

    #[test]
    fn box_candidates_filter_by_overlap() {
        let (data, index) = cube_index();
        let near_bottom = Aabb::new(Point3::new(0.4, 0.4, -0.2), Point3::new(0.6, 0.6, 0.1));
        let found = index.box_candidates(&data, &near_bottom);
        assert!(found.contains(&0) || found.contains(&1));
        assert!(!found.contains(&2) && !found.contains(&3));

        let everything = Aabb::around(Point3::new(0.5, 0.5, 0.5), 10.0);
        assert_eq!(index.box_candidates(&data, &everything).len(), 12);

        let nowhere = Aabb::around(Point3::new(9.0, 9.0, 9.0), 0.5);
        assert!(index.box_candidates(&data, &nowhere).is_empty());
    }

    #[test]
    fn planar_surface_gets_bins() {
        let mut mesh = IndexedMesh::new();
        mesh.vertices.push(mesh_types::Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(mesh_types::Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(mesh_types::Vertex::from_coords(0.0, 1.0, 0.0));
        mesh.faces.push([0, 1, 2]);

        let data = BoundingData::build(&mesh).expect("triangle builds");
        let index = CandidateIndex::build(&data, 0.01);
        assert_eq!(index.ray_candidates(&data, &Point3::new(0.2, 0.2, -1.0), 2, 0.01), vec![0]);
    }

    #[test]
    fn two_dimensional_index_uses_two_axes() {
        let data = BoundingData::build(&unit_square()).expect("square builds");
        let index = CandidateIndex::build(&data, 0.01);
        assert_eq!(index.dimension(), Dimension::Two);

        // Ray along +x from the middle crosses the right edge only.
        let found = index.ray_candidates(&data, &Point3::new(0.5, 0.5, 0.0), 0, 0.01);
        assert_eq!(found, vec![1]);
    }
}
