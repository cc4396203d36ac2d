//! restore-check - incremental restore decisions for multi-project builds
//!
//! Given a freshly computed snapshot of project descriptors, the checker
//! decides which projects actually need their dependency-resolution
//! ("restore") step re-run, so an orchestrator can skip the expensive work
//! for everything else. It combines:
//! - **Descriptor comparison**: structural equality against the last
//!   accepted snapshot
//! - **Output freshness**: timestamp fingerprints of the four restore
//!   output artifacts, with absent files as a first-class state
//! - **Failure tracking**: a failed restore forces the next check to
//!   return that project again
//! - **Reference propagation**: descriptor changes reach transitive
//!   dependents through a dependencies-first walk over the project graph
//!   (`solution-graph`)
//!
//! The checker never resolves packages, never reads package manifests, and
//! performs no I/O beyond reading modification timestamps of artifact
//! paths derived from the descriptors it is given.
//!
//! ## Usage
//!
//! ```
//! use restore_check::{
//!     ProjectDescriptor, RestoreChecker, RestoreOutcome, RestoreStyle, SolutionSnapshot,
//!     TargetFrameworkInfo,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let checker = RestoreChecker::new();
//! let core = checker.project_id("src/Core/Core.csproj");
//! let app = checker.project_id("src/App/App.csproj");
//!
//! let descriptors = vec![
//!     ProjectDescriptor::new(core.clone(), RestoreStyle::Reference, "src/Core/obj"),
//!     ProjectDescriptor::new(app.clone(), RestoreStyle::Reference, "src/App/obj")
//!         .with_framework(TargetFrameworkInfo::new("net9.0").with_reference(core.clone())),
//! ];
//! let snapshot = SolutionSnapshot::new(descriptors, vec![core.clone(), app.clone()])?;
//!
//! // Nothing is known on the first check, so every intended project is returned.
//! let dirty = checker.check_for_changes(snapshot)?;
//! assert_eq!(dirty.len(), 2);
//!
//! // The orchestrator restores the dirty projects and reports back.
//! checker.record_outcomes(&[
//!     RestoreOutcome::Succeeded(core),
//!     RestoreOutcome::Succeeded(app),
//! ])?;
//! # Ok(())
//! # }
//! ```

mod analyzer;
mod state;

pub mod checker;
pub mod fingerprint;
pub mod project;

// Checker facade
pub use checker::{CheckError, CheckStats, RestoreChecker, RestoreOutcome};

// Output fingerprints
pub use fingerprint::{ArtifactPaths, OutputFingerprint};

// Data model
pub use project::{
    IdentifierCasing, ProjectDescriptor, ProjectId, RestoreStyle, SnapshotError, SolutionSnapshot,
    TargetFrameworkInfo,
};

// Re-export the dependency-ordering graph
pub use solution_graph::{DependencyGraph, GraphError};
