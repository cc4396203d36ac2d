//! Restore output artifact paths and timestamp fingerprints

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::project::{ProjectDescriptor, RestoreStyle};

/// Locations of the four restore output artifacts of one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Resolved dependency assets file
    pub assets: PathBuf,
    /// Generated build-targets file
    pub targets: PathBuf,
    /// Generated build-props file
    pub props: PathBuf,
    /// Dependency lock file, when the project uses one
    pub lock: Option<PathBuf>,
}

impl ArtifactPaths {
    /// Derive the artifact paths for a project
    ///
    /// The assets file lives under the output directory with a fixed name.
    /// The targets/props file names follow the project stem and the restore
    /// style. The lock path is taken from the descriptor as-is.
    pub fn for_project(descriptor: &ProjectDescriptor) -> Self {
        let out = descriptor.output_dir();
        let stem = descriptor.id().artifact_stem();

        let (targets, props) = match descriptor.style() {
            RestoreStyle::Json => (
                out.join(format!("{stem}.restore.targets")),
                out.join(format!("{stem}.restore.props")),
            ),
            _ => (
                out.join(format!("{stem}.restore.g.targets")),
                out.join(format!("{stem}.restore.g.props")),
            ),
        };

        Self {
            assets: out.join("project.assets.json"),
            targets,
            props,
            lock: descriptor.lock_file_path().map(Path::to_path_buf),
        }
    }
}

/// Last-observed modification times of a project's restore outputs
///
/// `None` is the absent sentinel: the file does not exist, no lock file is
/// configured, or the timestamp could not be read. A file appearing or
/// disappearing therefore always changes the fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputFingerprint {
    /// Assets artifact timestamp
    pub assets: Option<SystemTime>,
    /// Build-targets artifact timestamp
    pub targets: Option<SystemTime>,
    /// Build-props artifact timestamp
    pub props: Option<SystemTime>,
    /// Lock-file timestamp
    pub lock: Option<SystemTime>,
}

impl OutputFingerprint {
    /// Read the current fingerprint for the given artifact paths
    ///
    /// Never fails: an unreadable timestamp degrades to absent.
    pub fn capture(paths: &ArtifactPaths) -> Self {
        Self {
            assets: stamp(&paths.assets),
            targets: stamp(&paths.targets),
            props: stamp(&paths.props),
            lock: paths.lock.as_deref().and_then(stamp),
        }
    }
}

fn stamp(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok().and_then(|meta| meta.modified().ok())
}
