//! Unsigned-distance sweep.
//!
//! The primitives a point's rays happened to meet are not necessarily the
//! closest ones. The sweep seeds the distance from those candidates and then
//! scans growing boxes around the point until the best distance found is
//! provably no larger than the radius searched.
//!
//! A box of half-width `r` contains the ball of radius `r`, so every
//! primitive closer than `r` has a bounding box meeting the box. Once the
//! best distance is at most `r` (plus the configured slack), nothing outside
//! the box can beat it.

use std::cmp::Ordering;

use mesh_types::{Aabb, Point3};
use rayon::prelude::*;
use tracing::{debug, info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::SdfConfig;
use crate::data::BoundingData;
use crate::index::CandidateIndex;
use crate::query::primitive_distance_squared;

/// How a sweep distance was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SweepStatus {
    /// The distance is the global minimum, within the configured slack.
    #[default]
    Exact,
    /// The search depth ran out; the distance is an upper bound.
    BestEffort,
}

/// Sweep outcome for one query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSweep {
    /// Unsigned distance to the closest primitive found.
    pub distance: f64,
    /// Arena index of that primitive, `None` only for non-finite input.
    pub closest: Option<u32>,
    /// Whether the distance is proven minimal.
    pub status: SweepStatus,
    /// Number of search boxes scanned.
    pub rings: u32,
}

/// Distances for a whole point set.
#[derive(Debug, Clone, Default)]
pub struct SweepPhase {
    /// Unsigned distance per point.
    pub distances: Vec<f64>,
    /// Arena index of the closest primitive per point.
    pub closest: Vec<Option<u32>>,
    /// Status per point.
    pub statuses: Vec<SweepStatus>,
}

impl SweepPhase {
    /// Number of points whose search ran out of depth.
    #[must_use]
    pub fn best_effort_count(&self) -> usize {
        self.statuses
            .iter()
            .filter(|s| **s == SweepStatus::BestEffort)
            .count()
    }
}

struct Nearest {
    distance_squared: f64,
    primitive: Option<u32>,
}

impl Nearest {
    const fn new() -> Self {
        Self {
            distance_squared: f64::INFINITY,
            primitive: None,
        }
    }

    fn scan(&mut self, data: &BoundingData, point: &Point3<f64>, candidates: &[u32]) {
        for &i in candidates {
            let Some(primitive) = data.primitive(i as usize) else {
                continue;
            };
            let d2 = primitive_distance_squared(*point, primitive);
            // Ties go to the lower index so results do not depend on scan order.
            let better = match d2.partial_cmp(&self.distance_squared) {
                Some(Ordering::Less) => true,
                Some(Ordering::Equal) => self.primitive.is_some_and(|p| i < p),
                _ => false,
            };
            if better {
                self.distance_squared = d2;
                self.primitive = Some(i);
            }
        }
    }

    fn distance(&self) -> f64 {
        self.distance_squared.sqrt()
    }
}

/// Find the closest primitive to `point`, starting from `seeds`.
///
/// The first box has half-width one index cell. If the seeds found nothing,
/// the first box already reaches the surface's bounding box, so far-away
/// points cost a bounded number of scans however far they are. After
/// `config.candidate_search_depth` rings that found something, the best
/// distance so far is accepted as [`SweepStatus::BestEffort`].
///
/// Any finite point gets a finite distance. A point with a non-finite
/// coordinate gets `f64::INFINITY` and no closest primitive.
#[must_use]
pub fn sweep_point(
    data: &BoundingData,
    index: &CandidateIndex,
    point: &Point3<f64>,
    seeds: &[u32],
    config: &SdfConfig,
) -> PointSweep {
    if !(point.x.is_finite() && point.y.is_finite() && point.z.is_finite()) {
        return PointSweep {
            distance: f64::INFINITY,
            closest: None,
            status: SweepStatus::BestEffort,
            rings: 0,
        };
    }

    let cell = index.cell_size();
    let slack = config.candidate_search_epsilon;
    let depth = config.candidate_search_depth.max(1);

    let mut nearest = Nearest::new();
    nearest.scan(data, point, seeds);

    let mut radius = if nearest.primitive.is_some() {
        cell
    } else {
        index.bounds().distance_to_point(point).max(cell)
    };

    let mut rings: u32 = 0;
    loop {
        let found = index.box_candidates(data, &Aabb::around(*point, radius));
        nearest.scan(data, point, &found);
        rings = rings.saturating_add(1);

        if let Some(closest) = nearest.primitive {
            let distance = nearest.distance();
            if distance <= radius + slack {
                return PointSweep {
                    distance,
                    closest: Some(closest),
                    status: SweepStatus::Exact,
                    rings,
                };
            }
            if rings >= depth {
                debug!(
                    x = point.x,
                    y = point.y,
                    z = point.z,
                    distance,
                    radius,
                    "Sweep depth exhausted, accepting best distance"
                );
                return PointSweep {
                    distance,
                    closest: Some(closest),
                    status: SweepStatus::BestEffort,
                    rings,
                };
            }
        }

        // Far from the origin one cell can fall below the radius' precision.
        radius += cell.max(radius * 4.0 * f64::EPSILON);
    }
}

/// Sweep every point, seeding each with its raycast candidates.
///
/// `seeds` must have one entry per point.
#[must_use]
pub fn run(
    data: &BoundingData,
    index: &CandidateIndex,
    points: &[Point3<f64>],
    seeds: &[Vec<u32>],
    config: &SdfConfig,
) -> SweepPhase {
    let empty = Vec::new();
    let seed_of = |i: usize| seeds.get(i).unwrap_or(&empty);

    let results: Vec<PointSweep> = if config.parallel {
        points
            .par_iter()
            .enumerate()
            .map(|(i, p)| sweep_point(data, index, p, seed_of(i), config))
            .collect()
    } else {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| sweep_point(data, index, p, seed_of(i), config))
            .collect()
    };

    let mut phase = SweepPhase {
        distances: Vec::with_capacity(results.len()),
        closest: Vec::with_capacity(results.len()),
        statuses: Vec::with_capacity(results.len()),
    };
    for r in results {
        phase.distances.push(r.distance);
        phase.closest.push(r.closest);
        phase.statuses.push(r.status);
    }

    let best_effort = phase.best_effort_count();
    if best_effort > 0 {
        warn!(
            points = best_effort,
            depth = config.candidate_search_depth,
            "Sweep accepted best-effort distances; increase candidate_search_depth for exact results"
        );
    }
    info!(points = points.len(), best_effort, "Sweep complete");

    phase
}
