//! Two-pass dirty analysis over solution snapshots
//!
//! Pass one validates every project on its own: descriptor comparison
//! against the cached snapshot, then output freshness for styles that
//! track restore outputs. Pass two replaces the cached snapshot and walks
//! the projects in dependency order, pulling in dependents of projects
//! whose descriptor changed. Output staleness never propagates; stale
//! outputs say nothing about a dependent's own resolution result.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use tracing::{debug, info};

use solution_graph::{DependencyGraph, GraphError};

use crate::fingerprint::{ArtifactPaths, OutputFingerprint};
use crate::project::{ProjectDescriptor, ProjectId, SolutionSnapshot};
use crate::state::CheckerState;

/// Outcome of one dirty analysis
#[derive(Debug)]
pub(crate) struct Analysis {
    /// Identifiers whose restore must be re-run
    pub dirty: HashSet<ProjectId>,
    /// Projects whose descriptor changed, before propagation
    pub descriptor_dirty: usize,
    /// Projects whose restore outputs were stale, missing, or failed
    pub output_dirty: usize,
    /// Projects added by reference propagation
    pub propagated: usize,
    /// No prior snapshot existed
    pub cold_start: bool,
    /// Nothing was dirty and the cached snapshot was kept
    pub fast_path: bool,
}

impl Analysis {
    fn cold(dirty: HashSet<ProjectId>) -> Self {
        Self {
            dirty,
            descriptor_dirty: 0,
            output_dirty: 0,
            propagated: 0,
            cold_start: true,
            fast_path: false,
        }
    }

    fn clean() -> Self {
        Self {
            dirty: HashSet::new(),
            descriptor_dirty: 0,
            output_dirty: 0,
            propagated: 0,
            cold_start: false,
            fast_path: true,
        }
    }
}

/// Run the two-pass analysis against `state`, adopting `snapshot` as the
/// new baseline whenever anything was dirty
pub(crate) fn check_for_changes(
    state: &mut CheckerState,
    snapshot: SolutionSnapshot,
) -> Result<Analysis, GraphError> {
    // Cold start: nothing is known yet, so every intended project is
    // presumed to need restoring.
    let Some(cached) = state.snapshot.as_ref() else {
        let dirty: HashSet<ProjectId> = snapshot.intended_restores().iter().cloned().collect();
        info!(
            projects = snapshot.project_count(),
            dirty = dirty.len(),
            "first check, restoring all intended projects"
        );
        state.snapshot = Some(snapshot);
        return Ok(Analysis::cold(dirty));
    };

    // Pass 1: validate each project on its own. Checks are independent,
    // so they run in parallel.
    let failed = &state.failed;
    let fingerprints = &state.fingerprints;
    let descriptors: Vec<&ProjectDescriptor> = snapshot.projects().collect();
    let verdicts: Vec<(ProjectId, bool, bool)> = descriptors
        .par_iter()
        .map(|&descriptor| {
            let id = descriptor.id().clone();
            let descriptor_changed = match cached.project(&id) {
                Some(previous) => previous != descriptor,
                None => true,
            };
            let stale = output_stale(failed, fingerprints, descriptor);
            (id, descriptor_changed, stale)
        })
        .collect();

    let mut descriptor_dirty: HashSet<ProjectId> = HashSet::new();
    let mut output_dirty: HashSet<ProjectId> = HashSet::new();
    for (id, descriptor_changed, stale) in verdicts {
        if descriptor_changed {
            debug!(project = %id, "  ↻ descriptor changed");
            descriptor_dirty.insert(id.clone());
        }
        if stale {
            output_dirty.insert(id);
        }
    }

    // Fast path: the cached snapshot is already equivalent wherever it
    // matters, so it is kept as-is.
    if descriptor_dirty.is_empty() && output_dirty.is_empty() {
        debug!(
            projects = snapshot.project_count(),
            "  ✓ all projects up to date"
        );
        return Ok(Analysis::clean());
    }

    // Pass 2: walk the projects dependencies-first and pull in dependents
    // of descriptor-dirty projects. One linear pass suffices because a
    // project's references are always visited before the project itself.
    let order = reference_order(&snapshot)?;
    let descriptor_count = descriptor_dirty.len();
    let output_count = output_dirty.len();

    let mut dirty = descriptor_dirty;
    for id in &order {
        if dirty.contains(id) {
            continue;
        }
        let Some(descriptor) = snapshot.project(id) else {
            continue;
        };
        if descriptor
            .referenced_projects()
            .any(|reference| dirty.contains(reference))
        {
            debug!(project = %id, "  ↻ references a changed project");
            dirty.insert(id.clone());
        }
    }
    let propagated = dirty.len() - descriptor_count;

    for id in output_dirty {
        dirty.insert(id);
    }

    info!(
        descriptor_dirty = descriptor_count,
        output_dirty = output_count,
        propagated,
        dirty = dirty.len(),
        "restore check found stale projects"
    );

    // Later checks compare against the snapshot just analyzed.
    state.snapshot = Some(snapshot);

    Ok(Analysis {
        dirty,
        descriptor_dirty: descriptor_count,
        output_dirty: output_count,
        propagated,
        cold_start: false,
        fast_path: false,
    })
}

/// Whether a project's restore outputs can no longer be trusted
fn output_stale(
    failed: &HashSet<ProjectId>,
    fingerprints: &HashMap<ProjectId, OutputFingerprint>,
    descriptor: &ProjectDescriptor,
) -> bool {
    if !descriptor.style().tracks_outputs() {
        return false;
    }

    let id = descriptor.id();
    if failed.contains(id) {
        debug!(project = %id, "  ↻ previous restore failed");
        return true;
    }

    match fingerprints.get(id) {
        Some(recorded) => {
            let current = OutputFingerprint::capture(&ArtifactPaths::for_project(descriptor));
            if current != *recorded {
                debug!(project = %id, "  ↻ restore outputs changed on disk");
                true
            } else {
                false
            }
        }
        None => {
            debug!(project = %id, "  ↻ no recorded restore outputs");
            true
        }
    }
}

/// Total order over the snapshot's projects with every project after all
/// projects it references
///
/// Projects are seeded in sorted identifier order so the result is a pure
/// function of the snapshot. References pointing outside the snapshot are
/// skipped; they can never carry dirt.
fn reference_order(snapshot: &SolutionSnapshot) -> Result<Vec<ProjectId>, GraphError> {
    let mut ids: Vec<ProjectId> = snapshot
        .projects()
        .map(|descriptor| descriptor.id().clone())
        .collect();
    ids.sort();

    let mut graph = DependencyGraph::with_capacity(ids.len());
    for id in &ids {
        graph.add_node(id.clone());
    }
    for id in &ids {
        let Some(descriptor) = snapshot.project(id) else {
            continue;
        };
        for reference in descriptor.referenced_projects() {
            if snapshot.contains(reference) {
                graph.depend_on(id, reference)?;
            }
        }
    }

    graph.dependency_order()
}
