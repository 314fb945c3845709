//! Sign-consistency flood fill.
//!
//! Points the raycast could not label are resolved from their neighbors in
//! the query mesh (two nodes are neighbors when they share an element).
//!
//! The unsure nodes are split into connected components. Each component is
//! resolved independently, so components run in parallel. Within one
//! component the fill proceeds in synchronous rounds: every unsure node looks
//! at the labels its confident neighbors had at the end of the previous round
//! and takes the majority sign (ties go outside). Rounds stop at a fixed
//! point or at the configured cap; whatever is still unsure is forced
//! outside.

use hashbrown::{HashMap, HashSet};
use mesh_types::NodeMesh;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::SdfConfig;
use crate::error::{SdfError, SdfResult};
use crate::raycast::PointClass;

/// Outcome of the flood fill.
#[derive(Debug, Clone, Default)]
pub struct FloodFillReport {
    /// Final label per node; never [`PointClass::Unsure`].
    pub classes: Vec<PointClass>,
    /// Nodes that were unsure on entry, sorted.
    pub initially_unsure: Vec<u32>,
    /// Nodes resolved by propagation.
    pub resolved: usize,
    /// Nodes that could not be resolved and were forced outside, sorted.
    pub forced_outside: Vec<u32>,
    /// Number of times an unsure node saw both inside and outside neighbors.
    pub conflicts: usize,
    /// Number of connected components of unsure nodes.
    pub components: usize,
    /// Largest number of rounds any component needed.
    pub rounds: usize,
    /// Components that hit the round cap before reaching a fixed point.
    pub unconverged_components: usize,
}

impl FloodFillReport {
    /// Whether the fill changed nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.initially_unsure.is_empty()
    }
}

/// Neighbor lists of the unsure nodes.
///
/// Only unsure nodes get an entry; confident nodes are read, never written.
///
/// # Errors
///
/// Returns [`SdfError::IndexOutOfRange`] if an element references a node
/// beyond `classes.len()`.
fn unsure_adjacency<M: NodeMesh>(mesh: &M, classes: &[PointClass]) -> SdfResult<HashMap<u32, Vec<u32>>> {
    let mut adjacency: HashMap<u32, Vec<u32>> = HashMap::new();

    for element in mesh.elements() {
        for &node in element {
            let class = classes
                .get(node as usize)
                .ok_or_else(|| SdfError::out_of_range("node", node as usize, classes.len()))?;
            if *class != PointClass::Unsure {
                continue;
            }
            let neighbors = adjacency.entry(node).or_default();
            neighbors.extend(element.iter().copied().filter(|&n| n != node));
        }
    }

    for neighbors in adjacency.values_mut() {
        neighbors.sort_unstable();
        neighbors.dedup();
    }

    Ok(adjacency)
}

/// Split the unsure nodes into connected components (each sorted).
fn components(unsure: &[u32], classes: &[PointClass], adjacency: &HashMap<u32, Vec<u32>>) -> Vec<Vec<u32>> {
    let mut seen: HashSet<u32> = HashSet::with_capacity(unsure.len());
    let mut result = Vec::new();

    for &start in unsure {
        if !seen.insert(start) {
            continue;
        }
        let mut component = vec![start];
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            for &n in adjacency.get(&node).map_or(&[][..], Vec::as_slice) {
                if classes[n as usize] == PointClass::Unsure && seen.insert(n) {
                    component.push(n);
                    stack.push(n);
                }
            }
        }
        component.sort_unstable();
        result.push(component);
    }

    result
}

#[derive(Debug, Default)]
struct ComponentOutcome {
    labels: Vec<(u32, PointClass)>,
    resolved: usize,
    forced: Vec<u32>,
    conflicts: usize,
    rounds: usize,
    converged: bool,
}

fn resolve_component(
    component: &[u32],
    classes: &[PointClass],
    adjacency: &HashMap<u32, Vec<u32>>,
    max_rounds: usize,
) -> ComponentOutcome {
    let mut local: HashMap<u32, PointClass> = component.iter().map(|&n| (n, PointClass::Unsure)).collect();
    let label_of = |local: &HashMap<u32, PointClass>, n: u32| {
        local
            .get(&n)
            .copied()
            .unwrap_or_else(|| classes[n as usize])
    };

    let mut outcome = ComponentOutcome::default();

    for _ in 0..max_rounds {
        let mut updates = Vec::new();

        for &node in component {
            if label_of(&local, node) != PointClass::Unsure {
                continue;
            }
            let neighbors = adjacency.get(&node).map_or(&[][..], Vec::as_slice);
            let mut inside = 0_usize;
            let mut outside = 0_usize;
            for &n in neighbors {
                match label_of(&local, n) {
                    PointClass::Inside => inside += 1,
                    PointClass::Outside => outside += 1,
                    PointClass::Surface | PointClass::Unsure => {}
                }
            }
            if inside + outside == 0 {
                continue;
            }
            if inside > 0 && outside > 0 {
                outcome.conflicts += 1;
                debug!(node, inside, outside, "Neighbors disagree on sign");
            }
            let label = if inside > outside {
                PointClass::Inside
            } else {
                PointClass::Outside
            };
            updates.push((node, label));
        }

        if updates.is_empty() {
            outcome.converged = true;
            break;
        }
        outcome.rounds += 1;
        outcome.resolved += updates.len();
        for (node, label) in updates {
            local.insert(node, label);
        }
    }

    if !outcome.converged {
        // A final pass decides whether the cap cut anything off.
        outcome.converged = component.iter().all(|&n| label_of(&local, n) != PointClass::Unsure);
    }

    for &node in component {
        match label_of(&local, node) {
            PointClass::Unsure => {
                outcome.forced.push(node);
                outcome.labels.push((node, PointClass::Outside));
            }
            label => outcome.labels.push((node, label)),
        }
    }

    outcome
}

/// Resolve every [`PointClass::Unsure`] entry of `classes`.
///
/// `classes` holds one label per node of `mesh`. Confident and surface
/// labels are never changed. Running the fill on its own output is a no-op.
///
/// # Errors
///
/// Returns [`SdfError::IndexOutOfRange`] if an element of `mesh` references
/// a node that has no label.
pub fn run<M: NodeMesh>(mesh: &M, classes: &[PointClass], config: &SdfConfig) -> SdfResult<FloodFillReport> {
    #[allow(clippy::cast_possible_truncation)]
    let unsure: Vec<u32> = classes
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == PointClass::Unsure)
        .map(|(i, _)| i as u32)
        .collect();

    if unsure.is_empty() {
        debug!("No unsure points, flood fill skipped");
        return Ok(FloodFillReport {
            classes: classes.to_vec(),
            ..FloodFillReport::default()
        });
    }

    let adjacency = unsure_adjacency(mesh, classes)?;
    let groups = components(&unsure, classes, &adjacency);
    let max_rounds = config.max_flood_fill_iterations;

    let outcomes: Vec<ComponentOutcome> = if config.parallel {
        groups
            .par_iter()
            .map(|c| resolve_component(c, classes, &adjacency, max_rounds))
            .collect()
    } else {
        groups
            .iter()
            .map(|c| resolve_component(c, classes, &adjacency, max_rounds))
            .collect()
    };

    let mut report = FloodFillReport {
        classes: classes.to_vec(),
        components: groups.len(),
        ..FloodFillReport::default()
    };
    for outcome in outcomes {
        for (node, label) in outcome.labels {
            report.classes[node as usize] = label;
        }
        report.resolved += outcome.resolved;
        report.forced_outside.extend(outcome.forced);
        report.conflicts += outcome.conflicts;
        report.rounds = report.rounds.max(outcome.rounds);
        report.unconverged_components += usize::from(!outcome.converged);
    }
    report.forced_outside.sort_unstable();
    report.initially_unsure = unsure;

    if report.conflicts > 0 {
        warn!(
            conflicts = report.conflicts,
            "Flood fill saw neighbors with opposite signs; check the surface for gaps"
        );
    }
    if report.unconverged_components > 0 {
        warn!(
            components = report.unconverged_components,
            max_rounds, "Flood fill hit its round cap"
        );
    }
    if !report.forced_outside.is_empty() {
        warn!(
            points = report.forced_outside.len(),
            "Unresolved points forced outside"
        );
    }

    info!(
        unsure = report.initially_unsure.len(),
        components = report.components,
        resolved = report.resolved,
        forced_outside = report.forced_outside.len(),
        rounds = report.rounds,
        "Flood fill complete"
    );

    Ok(report)
}
