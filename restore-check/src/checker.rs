//! Mutex-serialized checker facade and restore outcome recording

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use solution_graph::GraphError;

use crate::analyzer;
use crate::fingerprint::{ArtifactPaths, OutputFingerprint};
use crate::project::{IdentifierCasing, ProjectId, SolutionSnapshot};
use crate::state::CheckerState;

/// Result of one attempted restore, reported back by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The restore completed and its outputs are on disk
    Succeeded(ProjectId),
    /// The restore did not complete
    Failed(ProjectId),
}

impl RestoreOutcome {
    /// Identifier the outcome refers to
    pub fn project(&self) -> &ProjectId {
        match self {
            RestoreOutcome::Succeeded(id) | RestoreOutcome::Failed(id) => id,
        }
    }
}

/// Errors surfaced by the checker facade
#[derive(Debug, Error)]
pub enum CheckError {
    /// An outcome referenced a project outside the cached snapshot
    #[error("outcome reported for unknown project: {0}")]
    UnknownProject(ProjectId),
    /// The snapshot's reference edges admit no dependency order
    #[error("project references admit no restore order: {0}")]
    CyclicReferences(#[from] GraphError),
}

/// Summary of the most recent change check
#[derive(Debug, Clone, Serialize)]
pub struct CheckStats {
    /// Projects examined in the snapshot
    pub projects: usize,
    /// Projects whose descriptor changed
    pub descriptor_dirty: usize,
    /// Projects whose restore outputs were stale, missing, or failed
    pub output_dirty: usize,
    /// Projects pulled in by reference propagation
    pub propagated: usize,
    /// Total projects returned as needing restore
    pub dirty: usize,
    /// No prior snapshot existed
    pub cold_start: bool,
    /// Nothing was dirty and the cached snapshot was kept
    pub fast_path: bool,
    /// Wall-clock time of the check
    pub checked_at: DateTime<Utc>,
    /// Time spent inside the check
    pub elapsed_ms: u64,
}

/// Decides which projects of a solution need their restore re-run
///
/// One instance serves one solution session. It owns the cached snapshot,
/// the recorded output fingerprints, and the failure set, all behind a
/// single lock, so [`check_for_changes`](Self::check_for_changes) and
/// [`record_outcomes`](Self::record_outcomes) never interleave.
#[derive(Clone)]
pub struct RestoreChecker {
    inner: Arc<Mutex<Inner>>,
    casing: IdentifierCasing,
}

struct Inner {
    state: CheckerState,
    last_check: Option<CheckStats>,
}

impl RestoreChecker {
    /// Create a checker using the platform's identifier casing
    pub fn new() -> Self {
        Self::with_casing(IdentifierCasing::platform_default())
    }

    /// Create a checker with an explicit identifier casing strategy
    pub fn with_casing(casing: IdentifierCasing) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: CheckerState::default(),
                last_check: None,
            })),
            casing,
        }
    }

    /// Casing strategy this checker compares identifiers with
    pub fn casing(&self) -> IdentifierCasing {
        self.casing
    }

    /// Mint an identifier under this checker's casing strategy
    pub fn project_id(&self, name: impl Into<String>) -> ProjectId {
        ProjectId::new(name, self.casing)
    }

    /// Decide which projects in `snapshot` need their restore re-run
    ///
    /// The first call adopts the snapshot and returns its intended-restore
    /// list. Later calls validate every project's descriptor and restore
    /// outputs against the recorded baseline, then propagate descriptor
    /// changes to transitive dependents along project-reference edges.
    pub fn check_for_changes(
        &self,
        snapshot: SolutionSnapshot,
    ) -> Result<HashSet<ProjectId>, CheckError> {
        let started = Instant::now();
        let mut inner = self.inner.lock().unwrap();

        let projects = snapshot.project_count();
        let analysis = analyzer::check_for_changes(&mut inner.state, snapshot)?;

        let stats = CheckStats {
            projects,
            descriptor_dirty: analysis.descriptor_dirty,
            output_dirty: analysis.output_dirty,
            propagated: analysis.propagated,
            dirty: analysis.dirty.len(),
            cold_start: analysis.cold_start,
            fast_path: analysis.fast_path,
            checked_at: Utc::now(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            projects = stats.projects,
            dirty = stats.dirty,
            cold_start = stats.cold_start,
            fast_path = stats.fast_path,
            elapsed_ms = stats.elapsed_ms,
            "restore check finished"
        );
        inner.last_check = Some(stats);

        Ok(analysis.dirty)
    }

    /// Record restore outcomes for projects of the last checked snapshot
    ///
    /// Every outcome identifier is validated against the cached snapshot
    /// before any state changes; an unknown identifier fails the whole
    /// batch with [`CheckError::UnknownProject`]. On success the failure
    /// set is rebuilt from this batch alone, and a fresh output fingerprint
    /// is stored for every succeeded project.
    pub fn record_outcomes(&self, outcomes: &[RestoreOutcome]) -> Result<(), CheckError> {
        let mut inner = self.inner.lock().unwrap();
        let state = &mut inner.state;

        for outcome in outcomes {
            let id = outcome.project();
            let known = state
                .snapshot
                .as_ref()
                .is_some_and(|snapshot| snapshot.contains(id));
            if !known {
                return Err(CheckError::UnknownProject(id.clone()));
            }
        }

        state.failed.clear();
        let mut recorded = 0usize;
        let mut failures = 0usize;
        for outcome in outcomes {
            match outcome {
                RestoreOutcome::Succeeded(id) => {
                    let Some(descriptor) =
                        state.snapshot.as_ref().and_then(|snapshot| snapshot.project(id))
                    else {
                        continue; // validated above
                    };
                    let fingerprint =
                        OutputFingerprint::capture(&ArtifactPaths::for_project(descriptor));
                    state.fingerprints.insert(id.clone(), fingerprint);
                    recorded += 1;
                }
                RestoreOutcome::Failed(id) => {
                    state.failed.insert(id.clone());
                    failures += 1;
                }
            }
        }

        info!(
            outcomes = outcomes.len(),
            recorded, failures, "restore outcomes recorded"
        );
        Ok(())
    }

    /// Statistics of the most recent check, if any
    pub fn last_check(&self) -> Option<CheckStats> {
        self.inner.lock().unwrap().last_check.clone()
    }
}

impl Default for RestoreChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{ProjectDescriptor, RestoreStyle};

    #[test]
    fn outcomes_before_any_check_are_unknown() {
        let checker = RestoreChecker::with_casing(IdentifierCasing::Sensitive);
        let outcome = RestoreOutcome::Succeeded(checker.project_id("app"));

        let err = checker.record_outcomes(&[outcome]).unwrap_err();
        assert!(matches!(err, CheckError::UnknownProject(id) if id.name() == "app"));
    }

    #[test]
    fn empty_outcome_batch_is_accepted() {
        let checker = RestoreChecker::with_casing(IdentifierCasing::Sensitive);
        checker.record_outcomes(&[]).unwrap();
    }

    #[test]
    fn last_check_reports_the_cold_start() {
        let checker = RestoreChecker::with_casing(IdentifierCasing::Sensitive);
        assert!(checker.last_check().is_none());

        let app = checker.project_id("app");
        let descriptor = ProjectDescriptor::new(app.clone(), RestoreStyle::Other, "obj");
        let snapshot = SolutionSnapshot::new(vec![descriptor], vec![app]).unwrap();
        let dirty = checker.check_for_changes(snapshot).unwrap();

        assert_eq!(dirty.len(), 1);
        let stats = checker.last_check().unwrap();
        assert!(stats.cold_start);
        assert_eq!(stats.projects, 1);
        assert_eq!(stats.dirty, 1);
    }
}
