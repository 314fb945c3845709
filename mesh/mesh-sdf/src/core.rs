//! The orchestrator tying the phases together.

use mesh_types::{Dimension, NodeMesh, Point3, PrimitiveStore};
use tracing::{debug, info};

use crate::config::SdfConfig;
use crate::data::BoundingData;
use crate::error::{SdfError, SdfResult};
use crate::flood_fill::{self, FloodFillReport};
use crate::index::CandidateIndex;
use crate::raycast::{self, PointClass, RaycastPhase};
use crate::result::{RaycastResult, SignedField};
use crate::sweep::{self, SweepPhase};

/// Signed distance engine for one surface.
///
/// Construction resolves the surface into a primitive arena and builds the
/// candidate index; both are read-only afterwards, so one core can classify
/// any number of query meshes, from any number of threads.
///
/// # Example
///
/// ```
/// use mesh_sdf::{PointClass, SdfConfig, SdfCore};
/// use mesh_types::{BackgroundMesh, Point3, unit_cube};
///
/// let core = SdfCore::new(&unit_cube(), SdfConfig::default()).unwrap();
/// let grid = BackgroundMesh::grid_3d(
///     Point3::new(-0.25, -0.25, -0.25),
///     Point3::new(1.25, 1.25, 1.25),
///     [6, 6, 6],
/// );
///
/// let field = core.calculate_raycast_and_sdf(&grid).unwrap();
/// assert_eq!(field.len(), 343);
/// // Node 171 is the cube's centroid.
/// assert_eq!(field.class(171).unwrap(), PointClass::Inside);
/// assert!((field.value(171).unwrap() + 0.5).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct SdfCore {
    config: SdfConfig,
    data: BoundingData,
    index: CandidateIndex,
}

impl SdfCore {
    /// Prepare a surface for queries.
    ///
    /// # Errors
    ///
    /// - [`SdfError::InvalidConfig`] if `config` does not validate.
    /// - [`SdfError::IndexOutOfRange`] if a primitive references a missing
    ///   vertex.
    /// - [`SdfError::EmptySurface`] if no usable primitive remains.
    pub fn new<S: PrimitiveStore + ?Sized>(store: &S, config: SdfConfig) -> SdfResult<Self> {
        config.validate()?;

        let data = BoundingData::build(store)?;
        let index = CandidateIndex::build(&data, config.candidate_search_epsilon);

        info!(
            dimension = %data.dimension(),
            primitives = data.len(),
            skipped = data.skipped().len(),
            depth = config.candidate_search_depth,
            epsilon = config.candidate_search_epsilon,
            "Surface prepared"
        );

        Ok(Self {
            config,
            data,
            index,
        })
    }

    /// Prepare a surface with [`SdfConfig::default()`].
    ///
    /// # Errors
    ///
    /// Same as [`SdfCore::new`].
    pub fn with_defaults<S: PrimitiveStore + ?Sized>(store: &S) -> SdfResult<Self> {
        Self::new(store, SdfConfig::default())
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SdfConfig {
        &self.config
    }

    /// Dimension of the surface.
    #[must_use]
    pub const fn dimension(&self) -> Dimension {
        self.data.dimension()
    }

    /// Number of usable primitives.
    #[must_use]
    pub fn primitive_count(&self) -> usize {
        self.data.len()
    }

    /// Store indices of primitives skipped as degenerate.
    #[must_use]
    pub fn skipped_primitives(&self) -> &[usize] {
        self.data.skipped()
    }

    /// Precomputed bounding data.
    #[must_use]
    pub const fn bounding_data(&self) -> &BoundingData {
        &self.data
    }

    /// Candidate index.
    #[must_use]
    pub const fn candidate_index(&self) -> &CandidateIndex {
        &self.index
    }

    /// Store indices of the primitives a ray from `point` towards `+axis`
    /// may meet.
    ///
    /// # Errors
    ///
    /// Returns [`SdfError::IndexOutOfRange`] if `axis` is not an axis of the
    /// surface's dimension.
    pub fn candidates_along(&self, point: &Point3<f64>, axis: usize) -> SdfResult<Vec<usize>> {
        let axis_count = self.dimension().axis_count();
        if axis >= axis_count {
            return Err(SdfError::out_of_range("axis", axis, axis_count));
        }
        let point = self.flatten(point);
        Ok(self
            .index
            .ray_candidates(&self.data, &point, axis, self.config.candidate_search_epsilon)
            .into_iter()
            .filter_map(|i| self.data.source_index(i as usize))
            .collect())
    }

    /// Raycast a single point (no flood fill).
    #[must_use]
    pub fn raycast_point(&self, point: &Point3<f64>) -> PointClass {
        raycast::classify_point(&self.data, &self.index, &self.flatten(point), &self.config).class
    }

    /// Classify a single point.
    ///
    /// Rays through shared edges or vertices are settled by edge ownership,
    /// so symmetric interior points such as a cube's centroid come back
    /// inside. Only a point the axes still cannot agree on (or one with no
    /// primitive in reach of any ray) falls back to outside, since a single
    /// point has no neighbors to take a label from.
    #[must_use]
    pub fn classify_point(&self, point: &Point3<f64>) -> PointClass {
        match self.raycast_point(point) {
            PointClass::Unsure => PointClass::Outside,
            class => class,
        }
    }

    /// Unsigned distance from a single point to the surface.
    #[must_use]
    pub fn unsigned_distance(&self, point: &Point3<f64>) -> f64 {
        let point = self.flatten(point);
        let seeds = raycast::classify_point(&self.data, &self.index, &point, &self.config).candidates;
        sweep::sweep_point(&self.data, &self.index, &point, &seeds, &self.config).distance
    }

    /// Signed distance from a single point: negative inside, positive
    /// outside, the surface value on the surface.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        let point = self.flatten(point);
        let ray = raycast::classify_point(&self.data, &self.index, &point, &self.config);
        match ray.class {
            PointClass::Surface => self.config.surface_value.unwrap_or(0.0),
            class => {
                let d = sweep::sweep_point(&self.data, &self.index, &point, &ray.candidates, &self.config).distance;
                class.sign_value() * d
            }
        }
    }

    /// Raycast every node of `mesh`.
    ///
    /// # Errors
    ///
    /// - [`SdfError::DimensionMismatch`] if the mesh and surface dimensions
    ///   differ.
    /// - [`SdfError::IndexOutOfRange`] if an element references a missing
    ///   node.
    pub fn raycast_phase<M: NodeMesh>(&self, mesh: &M) -> SdfResult<RaycastPhase> {
        let points = self.query_points(mesh)?;
        Ok(raycast::run(&self.data, &self.index, &points, &self.config))
    }

    /// Sweep every node of `mesh`, seeded by a previous raycast phase.
    ///
    /// # Errors
    ///
    /// Same as [`SdfCore::raycast_phase`].
    pub fn sweep_phase<M: NodeMesh>(&self, mesh: &M, raycast: &RaycastPhase) -> SdfResult<SweepPhase> {
        let points = self.query_points(mesh)?;
        Ok(sweep::run(&self.data, &self.index, &points, &raycast.candidates, &self.config))
    }

    /// Resolve the unsure labels of a raycast phase over `mesh`.
    ///
    /// # Errors
    ///
    /// Returns [`SdfError::IndexOutOfRange`] if an element references a node
    /// without a label.
    pub fn flood_fill_phase<M: NodeMesh>(&self, mesh: &M, classes: &[PointClass]) -> SdfResult<FloodFillReport> {
        flood_fill::run(mesh, classes, &self.config)
    }

    /// Label every node and list the elements at the surface and in the
    /// volume. Distances are not computed.
    ///
    /// # Errors
    ///
    /// Same as [`SdfCore::raycast_phase`].
    pub fn calculate_raycast<M: NodeMesh>(&self, mesh: &M) -> SdfResult<RaycastResult> {
        let points = self.query_points(mesh)?;
        let ray = raycast::run(&self.data, &self.index, &points, &self.config);
        let fill = flood_fill::run(mesh, &ray.classes, &self.config)?;

        let result = RaycastResult::from_classes(mesh, fill.classes, fill.initially_unsure);
        self.report(mesh, &points, &result, None);
        Ok(result)
    }

    /// Full pipeline: raycast, sweep, flood fill, signed values.
    ///
    /// # Errors
    ///
    /// Same as [`SdfCore::raycast_phase`].
    pub fn calculate_raycast_and_sdf<M: NodeMesh>(&self, mesh: &M) -> SdfResult<SignedField> {
        let points = self.query_points(mesh)?;
        let ray = raycast::run(&self.data, &self.index, &points, &self.config);
        let swept = sweep::run(&self.data, &self.index, &points, &ray.candidates, &self.config);
        // All points have a provisional label and distance past this line.
        let fill = flood_fill::run(mesh, &ray.classes, &self.config)?;

        let result = RaycastResult::from_classes(mesh, fill.classes, fill.initially_unsure);
        let closest = swept
            .closest
            .iter()
            .map(|c| c.and_then(|i| self.data.source_index(i as usize)))
            .collect();
        let field = SignedField::assemble(
            result,
            swept.distances,
            closest,
            swept.statuses,
            self.config.surface_value,
        );

        self.report(mesh, &points, field.raycast(), Some(field.distances()));
        info!(
            nodes = field.len(),
            inside = field.raycast().count(PointClass::Inside),
            surface = field.raycast().count(PointClass::Surface),
            best_effort = field.best_effort_count(),
            "Signed field assembled"
        );
        Ok(field)
    }

    /// Node coordinates, checked against the surface.
    fn query_points<M: NodeMesh>(&self, mesh: &M) -> SdfResult<Vec<Point3<f64>>> {
        if mesh.dimension() != self.dimension() {
            return Err(SdfError::DimensionMismatch {
                surface: self.dimension(),
                mesh: mesh.dimension(),
            });
        }

        let count = mesh.node_count();
        for element in mesh.elements() {
            if let Some(&bad) = element.iter().find(|&&n| n as usize >= count) {
                return Err(SdfError::out_of_range("node", bad as usize, count));
            }
        }

        debug!(nodes = count, elements = mesh.element_count(), "Query mesh accepted");
        Ok(mesh.nodes().map(|n| self.flatten(&n.position)).collect())
    }

    /// 2D surfaces live in the `z = 0` plane.
    fn flatten(&self, point: &Point3<f64>) -> Point3<f64> {
        match self.dimension() {
            Dimension::Two => Point3::new(point.x, point.y, 0.0),
            Dimension::Three => *point,
        }
    }

    fn report<M: NodeMesh>(&self, mesh: &M, points: &[Point3<f64>], result: &RaycastResult, distances: Option<&[f64]>) {
        info!(
            elements_at_surface = result.elements_at_surface().len(),
            elements_in_volume = result.elements_in_volume().len(),
            unsure_before_fill = result.unsure_before_fill().len(),
            "Classification complete"
        );

        if !self.config.verbose {
            return;
        }
        for ((i, node), p) in mesh.nodes().enumerate().zip(points) {
            let class = result.classes().get(i).copied().unwrap_or_default();
            let distance = distances.and_then(|d| d.get(i)).copied().unwrap_or(f64::NAN);
            info!(
                index = i,
                id = node.id,
                x = p.x,
                y = p.y,
                z = p.z,
                class = %class,
                distance,
                "Node classified"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::{BackgroundMesh, IndexedMesh, Point2, unit_cube, unit_square};

    fn cube_core() -> SdfCore {
        SdfCore::new(&unit_cube(), SdfConfig::default()).expect("cube builds")
    }

    #[test]
    fn rejects_bad_config() {
        let config = SdfConfig {
            candidate_search_depth: 0,
            ..SdfConfig::default()
        };
        assert!(matches!(SdfCore::new(&unit_cube(), config), Err(SdfError::InvalidConfig(_))));
        assert!(matches!(SdfCore::with_defaults(&IndexedMesh::new()), Err(SdfError::EmptySurface)));
    }

    #[test]
    fn single_point_queries() {
        let core = cube_core();
        assert_eq!(core.classify_point(&Point3::new(0.3, 0.6, 0.45)), PointClass::Inside);
        assert_eq!(core.classify_point(&Point3::new(2.0, 0.6, 0.45)), PointClass::Outside);
        assert_eq!(core.classify_point(&Point3::new(0.3, 0.6, 1.0)), PointClass::Surface);
        // Every centroid ray passes through a face diagonal.
        let centroid = Point3::new(0.5, 0.5, 0.5);
        assert_eq!(core.raycast_point(&centroid), PointClass::Inside);
        assert_eq!(core.classify_point(&centroid), PointClass::Inside);
        assert_relative_eq!(core.signed_distance(&centroid), -0.5, epsilon = 1e-12);

        // No rays reach it and no neighbors vouch for it.
        assert_eq!(core.raycast_point(&Point3::new(40.0, 0.5, 0.5)), PointClass::Unsure);
        assert_eq!(core.classify_point(&Point3::new(40.0, 0.5, 0.5)), PointClass::Outside);

        assert_relative_eq!(core.signed_distance(&Point3::new(0.3, 0.6, 0.45)), -0.3, epsilon = 1e-12);
        assert_relative_eq!(core.signed_distance(&Point3::new(2.0, 0.6, 0.45)), 1.0, epsilon = 1e-12);
        assert_relative_eq!(core.unsigned_distance(&Point3::new(0.5, 0.5, 0.5)), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn candidates_far_away_are_empty() {
        let core = cube_core();
        let far = Point3::new(100.0, -100.0, 100.0);
        for axis in 0..3 {
            assert!(core.candidates_along(&far, axis).expect("valid axis").is_empty());
        }
        assert!(core.candidates_along(&far, 3).is_err());
    }

    #[test]
    fn dimension_mismatch() {
        let core = cube_core();
        let grid = BackgroundMesh::grid_2d(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), [2, 2]);
        assert!(matches!(
            core.calculate_raycast(&grid),
            Err(SdfError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn bad_element_index() {
        let core = cube_core();
        let mut grid = BackgroundMesh::grid_3d(Point3::origin(), Point3::new(1.0, 1.0, 1.0), [1, 1, 1]);
        grid.elements.push(vec![0, 99]);
        match core.calculate_raycast_and_sdf(&grid) {
            Err(SdfError::IndexOutOfRange { what, index, len }) => {
                assert_eq!((what, index, len), ("node", 99, 8));
            }
            other => panic!("expected out of range, got {other:?}"),
        }
    }

    #[test]
    fn phases_compose() {
        // Abstaining on grazing rays leaves the fill something to do.
        let config = SdfConfig::default().with_resolve_grazing_rays(false);
        let core = SdfCore::new(&unit_cube(), config).expect("cube builds");
        let grid = BackgroundMesh::grid_3d(
            Point3::new(-0.25, -0.25, -0.25),
            Point3::new(1.25, 1.25, 1.25),
            [6, 6, 6],
        );

        let ray = core.raycast_phase(&grid).expect("raycast");
        let swept = core.sweep_phase(&grid, &ray).expect("sweep");
        let fill = core.flood_fill_phase(&grid, &ray.classes).expect("fill");
        let field = core.calculate_raycast_and_sdf(&grid).expect("field");

        assert_eq!(fill.classes, field.classes());
        assert_eq!(swept.distances, field.distances());
        assert!(!fill.initially_unsure.is_empty());
        assert!(fill.forced_outside.is_empty());
    }

    #[test]
    fn two_dimensional_square() {
        let core = SdfCore::with_defaults(&unit_square()).expect("square builds");
        let grid = BackgroundMesh::grid_2d(Point2::new(-0.5, -0.5), Point2::new(1.5, 1.5), [8, 8]);
        let field = core.calculate_raycast_and_sdf(&grid).expect("field");

        // Node at (0.25, 0.5): i = 3, j = 4.
        let node = 3 + 9 * 4;
        assert_eq!(field.class(node).expect("node"), PointClass::Inside);
        assert_relative_eq!(field.value(node).expect("node"), -0.25, epsilon = 1e-12);

        // Node at (1.5, 1.5) is the last one.
        assert_eq!(field.class(80).expect("node"), PointClass::Outside);
        assert_relative_eq!(field.value(80).expect("node"), 0.5_f64.hypot(0.5), epsilon = 1e-12);
    }
}
