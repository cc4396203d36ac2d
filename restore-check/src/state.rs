//! Mutable state one checker instance carries across calls

use std::collections::{HashMap, HashSet};

use crate::fingerprint::OutputFingerprint;
use crate::project::{ProjectId, SolutionSnapshot};

/// Cached snapshot, output fingerprints, and failure set
///
/// Owned by the checker facade and only ever touched under its lock.
#[derive(Debug, Default)]
pub(crate) struct CheckerState {
    /// Last-accepted snapshot; replaced whole, never merged
    pub snapshot: Option<SolutionSnapshot>,
    /// Fingerprints recorded for projects whose last restore succeeded
    pub fingerprints: HashMap<ProjectId, OutputFingerprint>,
    /// Projects whose most recently reported restore attempt failed
    pub failed: HashSet<ProjectId>,
}
