//! Axis-aligned raycasting and parity classification.
//!
//! Every query point shoots one ray per active axis towards `+infinity`.
//! Crossings ahead of the point are counted; an odd count votes inside, an
//! even count votes outside. A hit within tolerance of the point itself
//! marks it as on the surface. A hit near an edge or vertex makes the
//! tolerant count untrustworthy; that axis is recounted with the half-open
//! edge-ownership rule, so a ray through an edge shared by two primitives
//! counts once, or abstains if resolution is disabled. The per-axis votes
//! are then combined.

use mesh_types::Point3;
use rayon::prelude::*;
use tracing::{debug, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::SdfConfig;
use crate::data::BoundingData;
use crate::index::CandidateIndex;
use crate::query::{AxisHit, axis_ray_hit, axis_ray_owned_hit};

/// Inside/outside label of a query point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PointClass {
    /// Strictly inside the closed surface.
    Inside,
    /// Strictly outside the closed surface.
    Outside,
    /// On the surface, within tolerance.
    Surface,
    /// Not (yet) determined.
    #[default]
    Unsure,
}

impl PointClass {
    /// Sign multiplier for the distance: `-1` inside, `+1` outside, `0` on
    /// the surface.
    ///
    /// Unsure points carry `+1`, matching the outside bias.
    #[must_use]
    pub const fn sign_value(self) -> f64 {
        match self {
            Self::Inside => -1.0,
            Self::Outside | Self::Unsure => 1.0,
            Self::Surface => 0.0,
        }
    }

    /// Whether the label is a confident inside/outside label.
    #[must_use]
    pub const fn is_confident(self) -> bool {
        matches!(self, Self::Inside | Self::Outside)
    }

    /// Short lowercase name used in diagnostic output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inside => "inside",
            Self::Outside => "outside",
            Self::Surface => "surface",
            Self::Unsure => "unsure",
        }
    }

    /// Integer code used in VTK output (`-1`, `1`, `0`, `2`).
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Inside => -1,
            Self::Outside => 1,
            Self::Surface => 0,
            Self::Unsure => 2,
        }
    }
}

impl std::fmt::Display for PointClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single ray.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisVote {
    /// Odd number of crossings ahead.
    Inside,
    /// Even number of crossings ahead (including none).
    Outside,
    /// A hit lies at the ray's origin.
    OnSurface,
    /// A hit ahead grazes an edge or vertex and was not resolved.
    Unsure,
}

/// Result of casting a single ray.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisRay {
    /// How this axis votes.
    pub vote: AxisVote,
    /// Arena indices of the candidate primitives that were tested.
    pub candidates: Vec<u32>,
    /// Number of clean crossings ahead of the point.
    pub crossings: usize,
    /// Whether a hit ahead came within tolerance of an edge or vertex.
    pub grazed: bool,
}

/// Raycast outcome for one query point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRaycast {
    /// Combined label.
    pub class: PointClass,
    /// Vote of each active axis, in axis order.
    pub votes: Vec<AxisVote>,
    /// Union of the per-axis candidate sets, sorted.
    pub candidates: Vec<u32>,
}

/// Raycast labels for a whole point set.
///
/// This is the first phase output; the sweep seeds its search from
/// `candidates`, and the flood fill resolves the `Unsure` entries.
#[derive(Debug, Clone, Default)]
pub struct RaycastPhase {
    /// Label per point.
    pub classes: Vec<PointClass>,
    /// Union of ray candidates per point (arena indices).
    pub candidates: Vec<Vec<u32>>,
}

impl RaycastPhase {
    /// Indices of the points left unsure by raycasting.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn unsure(&self) -> Vec<u32> {
        self.classes
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == PointClass::Unsure)
            .map(|(i, _)| i as u32)
            .collect()
    }

    /// Number of points carrying `class`.
    #[must_use]
    pub fn count(&self, class: PointClass) -> usize {
        self.classes.iter().filter(|c| **c == class).count()
    }
}

/// Cast one ray from `point` towards `+axis` with the tolerant hit test.
///
/// A grazing hit leaves the vote [`AxisVote::Unsure`]; see
/// [`resolve_grazing`] for settling it.
#[must_use]
pub fn cast_axis(
    data: &BoundingData,
    index: &CandidateIndex,
    point: &Point3<f64>,
    axis: usize,
    epsilon: f64,
) -> AxisRay {
    let candidates = index.ray_candidates(data, point, axis, epsilon);
    let origin = point[axis];

    let mut crossings = 0;
    let mut grazed = false;
    let mut on_surface = false;

    for &i in &candidates {
        let Some(primitive) = data.primitive(i as usize) else {
            continue;
        };
        let Some(hit) = axis_ray_hit(point, axis, primitive, epsilon) else {
            continue;
        };

        let c = hit.coordinate();
        if (c - origin).abs() <= epsilon {
            on_surface = true;
            break;
        }
        if c > origin {
            match hit {
                AxisHit::Crossing(_) => crossings += 1,
                AxisHit::Degenerate(_) => grazed = true,
            }
        }
    }

    let vote = if on_surface {
        AxisVote::OnSurface
    } else if grazed {
        AxisVote::Unsure
    } else if crossings % 2 == 1 {
        AxisVote::Inside
    } else {
        AxisVote::Outside
    };

    AxisRay {
        vote,
        candidates,
        crossings,
        grazed,
    }
}

/// Recount a grazed ray with the half-open edge-ownership rule.
///
/// Only the candidates of `ray` are tested. The count equals that of a ray
/// nudged off every edge and vertex by the same infinitesimal offset, so on
/// a closed surface the parity is exact. Rays whose vote is not
/// [`AxisVote::Unsure`] are returned unchanged.
#[must_use]
pub fn resolve_grazing(data: &BoundingData, point: &Point3<f64>, axis: usize, mut ray: AxisRay) -> AxisRay {
    if ray.vote != AxisVote::Unsure {
        return ray;
    }

    let origin = point[axis];
    let mut crossings = 0;
    for &i in &ray.candidates {
        let Some(primitive) = data.primitive(i as usize) else {
            continue;
        };
        match axis_ray_owned_hit(point, axis, primitive) {
            Some(c) if !c.is_finite() => return ray,
            Some(c) if c > origin => crossings += 1,
            _ => {}
        }
    }

    ray.crossings = crossings;
    ray.vote = if crossings % 2 == 1 {
        AxisVote::Inside
    } else {
        AxisVote::Outside
    };
    ray
}

/// Combine per-axis votes into one label.
///
/// Any on-surface vote wins. Otherwise confident votes must not disagree and
/// at least `required` of them must be present.
#[must_use]
pub fn combine_votes(votes: &[AxisVote], required: usize) -> PointClass {
    if votes.contains(&AxisVote::OnSurface) {
        return PointClass::Surface;
    }

    let inside = votes.iter().filter(|v| **v == AxisVote::Inside).count();
    let outside = votes.iter().filter(|v| **v == AxisVote::Outside).count();

    match (inside, outside) {
        (n, 0) if n >= required => PointClass::Inside,
        (0, n) if n >= required => PointClass::Outside,
        _ => PointClass::Unsure,
    }
}

/// Classify a single point by casting rays along every active axis.
#[must_use]
pub fn classify_point(
    data: &BoundingData,
    index: &CandidateIndex,
    point: &Point3<f64>,
    config: &SdfConfig,
) -> PointRaycast {
    let axis_count = data.dimension().axis_count();
    let required = config.min_agreeing_axes.clamp(1, axis_count);
    let epsilon = config.candidate_search_epsilon;

    let mut votes = Vec::with_capacity(axis_count);
    let mut candidates = Vec::new();
    let mut any_candidates = false;

    for axis in 0..axis_count {
        let mut ray = cast_axis(data, index, point, axis, epsilon);
        if config.resolve_grazing_rays && ray.vote == AxisVote::Unsure {
            ray = resolve_grazing(data, point, axis, ray);
            debug!(axis, vote = ?ray.vote, "Grazing ray settled by edge ownership");
        }
        any_candidates |= !ray.candidates.is_empty();
        votes.push(ray.vote);
        candidates.extend(ray.candidates);
    }
    candidates.sort_unstable();
    candidates.dedup();

    // Nothing in reach along any axis: leave it to the neighbors.
    let class = if any_candidates {
        combine_votes(&votes, required)
    } else {
        PointClass::Unsure
    };

    if class == PointClass::Unsure && any_candidates {
        debug!(?votes, x = point.x, y = point.y, z = point.z, "Axis votes inconclusive");
    }

    PointRaycast {
        class,
        votes,
        candidates,
    }
}

/// Raycast every point.
///
/// Points are independent; with `config.parallel` the work is spread over
/// the rayon pool.
#[must_use]
pub fn run(
    data: &BoundingData,
    index: &CandidateIndex,
    points: &[Point3<f64>],
    config: &SdfConfig,
) -> RaycastPhase {
    let results: Vec<PointRaycast> = if config.parallel {
        points
            .par_iter()
            .map(|p| classify_point(data, index, p, config))
            .collect()
    } else {
        points
            .iter()
            .map(|p| classify_point(data, index, p, config))
            .collect()
    };

    let (classes, candidates) = results.into_iter().map(|r| (r.class, r.candidates)).unzip();
    let phase = RaycastPhase {
        classes,
        candidates,
    };

    info!(
        points = points.len(),
        inside = phase.count(PointClass::Inside),
        outside = phase.count(PointClass::Outside),
        surface = phase.count(PointClass::Surface),
        unsure = phase.count(PointClass::Unsure),
        "Raycast complete"
    );

    phase
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::{unit_cube, unit_square};

    fn cube() -> (BoundingData, CandidateIndex, SdfConfig) {
        let config = SdfConfig::default();
        let data = BoundingData::build(&unit_cube()).expect("cube builds");
        let index = CandidateIndex::build(&data, config.candidate_search_epsilon);
        (data, index, config)
    }

    #[test]
    fn sign_values() {
        assert!((PointClass::Inside.sign_value() + 1.0).abs() < f64::EPSILON);
        assert!((PointClass::Outside.sign_value() - 1.0).abs() < f64::EPSILON);
        assert!(PointClass::Surface.sign_value().abs() < f64::EPSILON);
        assert!(!PointClass::Unsure.is_confident());
        assert_eq!(PointClass::Surface.to_string(), "surface");
    }

    #[test]
    fn interior_point_odd_parity() {
        let (data, index, config) = cube();
        let p = Point3::new(0.3, 0.6, 0.45);
        for axis in 0..3 {
            let ray = cast_axis(&data, &index, &p, axis, config.candidate_search_epsilon);
            assert_eq!(ray.vote, AxisVote::Inside, "axis {axis}");
            assert_eq!(ray.crossings, 1);
        }
        assert_eq!(classify_point(&data, &index, &p, &config).class, PointClass::Inside);
    }

    #[test]
    fn exterior_point_even_parity() {
        let (data, index, config) = cube();
        let p = Point3::new(-0.4, 0.3, 0.65);
        let result = classify_point(&data, &index, &p, &config);
        // The x ray passes through the cube (two crossings), the others miss.
        assert_eq!(result.votes, vec![AxisVote::Outside; 3]);
        assert_eq!(result.class, PointClass::Outside);

        let ray = cast_axis(&data, &index, &p, 0, config.candidate_search_epsilon);
        assert_eq!(ray.crossings, 2);
    }

    #[test]
    fn centroid_rays_graze_diagonals() {
        let (data, index, config) = cube();
        let centroid = Point3::new(0.5, 0.5, 0.5);
        for axis in 0..3 {
            let ray = cast_axis(&data, &index, &centroid, axis, config.candidate_search_epsilon);
            assert!(ray.grazed, "axis {axis}");
            assert_eq!(ray.vote, AxisVote::Unsure);

            // The far face's diagonal is owned by one of its two triangles.
            let settled = resolve_grazing(&data, &centroid, axis, ray);
            assert_eq!(settled.vote, AxisVote::Inside);
            assert_eq!(settled.crossings, 1);
        }

        let result = classify_point(&data, &index, &centroid, &config);
        assert_eq!(result.votes, vec![AxisVote::Inside; 3]);
        assert_eq!(result.class, PointClass::Inside);
    }

    #[test]
    fn centroid_abstains_without_resolution() {
        let (data, index, config) = cube();
        let config = config.with_resolve_grazing_rays(false);
        let result = classify_point(&data, &index, &Point3::new(0.5, 0.5, 0.5), &config);
        assert_eq!(result.votes, vec![AxisVote::Unsure; 3]);
        assert_eq!(result.class, PointClass::Unsure);
        assert!(!result.candidates.is_empty());
    }

    #[test]
    fn ray_along_cube_edge_stays_outside() {
        let (data, index, config) = cube();
        // The x ray runs along the bottom front edge of the cube.
        let p = Point3::new(-0.25, 0.0, 0.0);
        let ray = cast_axis(&data, &index, &p, 0, config.candidate_search_epsilon);
        assert!(ray.grazed);
        let settled = resolve_grazing(&data, &p, 0, ray);
        assert_eq!(settled.vote, AxisVote::Outside);
        assert_eq!(classify_point(&data, &index, &p, &config).class, PointClass::Outside);
    }

    #[test]
    fn clean_rays_are_left_alone() {
        let (data, index, config) = cube();
        let p = Point3::new(0.3, 0.6, 0.45);
        let ray = cast_axis(&data, &index, &p, 1, config.candidate_search_epsilon);
        assert!(!ray.grazed);
        assert_eq!(resolve_grazing(&data, &p, 1, ray.clone()), ray);
    }

    #[test]
    fn point_on_face_is_surface() {
        let (data, index, config) = cube();
        let result = classify_point(&data, &index, &Point3::new(0.3, 0.6, 1.0), &config);
        assert_eq!(result.class, PointClass::Surface);

        // Just inside the tolerance band.
        let result = classify_point(&data, &index, &Point3::new(0.3, 0.6, 0.995), &config);
        assert_eq!(result.class, PointClass::Surface);
    }

    #[test]
    fn far_point_is_unsure() {
        let (data, index, config) = cube();
        let result = classify_point(&data, &index, &Point3::new(40.0, -30.0, 25.0), &config);
        assert_eq!(result.class, PointClass::Unsure);
        assert!(result.candidates.is_empty());
    }

    #[test]
    fn vote_combination() {
        use AxisVote::{Inside, OnSurface, Outside, Unsure};
        assert_eq!(combine_votes(&[Inside, Inside, Unsure], 2), PointClass::Inside);
        assert_eq!(combine_votes(&[Inside, Unsure, Unsure], 2), PointClass::Unsure);
        assert_eq!(combine_votes(&[Inside, Outside, Inside], 2), PointClass::Unsure);
        assert_eq!(combine_votes(&[Outside, Unsure, OnSurface], 3), PointClass::Surface);
        assert_eq!(combine_votes(&[Outside, Unsure], 1), PointClass::Outside);
    }

    #[test]
    fn polyline_square() {
        let config = SdfConfig::default();
        let data = BoundingData::build(&unit_square()).expect("square builds");
        let index = CandidateIndex::build(&data, config.candidate_search_epsilon);

        let inside = classify_point(&data, &index, &Point3::new(0.3, 0.7, 0.0), &config);
        assert_eq!(inside.class, PointClass::Inside);
        assert_eq!(inside.votes.len(), 2);

        let outside = classify_point(&data, &index, &Point3::new(-0.5, 0.4, 0.0), &config);
        assert_eq!(outside.class, PointClass::Outside);

        let edge = classify_point(&data, &index, &Point3::new(0.6, 0.0, 0.0), &config);
        assert_eq!(edge.class, PointClass::Surface);
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let (data, index, config) = cube();
        let points: Vec<_> = (0..50)
            .map(|i| {
                let t = f64::from(i) / 50.0;
                Point3::new(1.4f64.mul_add(t, -0.2), 0.37, 0.61)
            })
            .collect();

        let parallel = run(&data, &index, &points, &config);
        let sequential = run(&data, &index, &points, &config.clone().with_parallel(false));
        assert_eq!(parallel.classes, sequential.classes);
        assert_eq!(parallel.candidates, sequential.candidates);
    }
}
