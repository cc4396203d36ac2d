//! Project identity, restore styles, descriptors, and solution snapshots

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Comparison strategy for project identifiers
///
/// Identifiers are commonly normalized project file paths, so comparison
/// must follow the case behavior of the file system they came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierCasing {
    /// Identifiers differing only in case name distinct projects
    Sensitive,
    /// Identifiers differing only in case name the same project
    Insensitive,
}

impl IdentifierCasing {
    /// Strategy matching the platform this checker runs on
    ///
    /// Case-insensitive on Windows and macOS, case-sensitive elsewhere.
    pub fn platform_default() -> Self {
        if cfg!(any(target_os = "windows", target_os = "macos")) {
            IdentifierCasing::Insensitive
        } else {
            IdentifierCasing::Sensitive
        }
    }

    fn fold(self, name: &str) -> String {
        match self {
            IdentifierCasing::Sensitive => name.to_string(),
            IdentifierCasing::Insensitive => name.to_lowercase(),
        }
    }
}

/// Project identifier carrying its own comparison strategy
///
/// Equality, hashing, and ordering all use a key folded through the casing
/// the identifier was created with, so every set or map keyed by
/// `ProjectId` compares identifiers the same way. `Display` shows the
/// original name.
#[derive(Debug, Clone)]
pub struct ProjectId {
    name: String,
    key: String,
}

impl ProjectId {
    /// Create an identifier under the given casing strategy
    pub fn new(name: impl Into<String>, casing: IdentifierCasing) -> Self {
        let name = name.into();
        let key = casing.fold(&name);
        Self { name, key }
    }

    /// Original name as supplied by the orchestrator
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File stem of the identifier, used to name generated artifacts
    ///
    /// For a path-shaped identifier like `src/Web/Web.csproj` this is
    /// `Web`; a bare name is returned unchanged.
    pub(crate) fn artifact_stem(&self) -> String {
        Path::new(&self.name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }
}

impl PartialEq for ProjectId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ProjectId {}

impl Hash for ProjectId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for ProjectId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ProjectId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// How a project expresses its package dependencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestoreStyle {
    /// Reference-style project; restore outputs are tracked
    Reference,
    /// Json-style project; restore outputs are tracked
    Json,
    /// Any other style; produces no tracked restore outputs
    Other,
}

impl RestoreStyle {
    /// Whether this style produces restore output artifacts worth tracking
    pub fn tracks_outputs(self) -> bool {
        matches!(self, RestoreStyle::Reference | RestoreStyle::Json)
    }
}

/// Project-reference edges declared for one target framework
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFrameworkInfo {
    /// Framework name, e.g. `net9.0`
    pub framework: String,
    /// Identifiers of projects this framework depends on
    pub project_references: Vec<ProjectId>,
}

impl TargetFrameworkInfo {
    /// Create a framework entry with no references
    pub fn new(framework: impl Into<String>) -> Self {
        Self {
            framework: framework.into(),
            project_references: Vec::new(),
        }
    }

    /// Add a project reference
    pub fn with_reference(mut self, reference: ProjectId) -> Self {
        self.project_references.push(reference);
        self
    }
}

/// One project's restore-relevant configuration
///
/// Descriptors are compared by full structural equality: any change to any
/// field, including nested framework or reference data, makes two
/// descriptors unequal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    id: ProjectId,
    style: RestoreStyle,
    output_dir: PathBuf,
    lock_file_path: Option<PathBuf>,
    frameworks: Vec<TargetFrameworkInfo>,
}

impl ProjectDescriptor {
    /// Create a descriptor with no frameworks and no lock file
    pub fn new(id: ProjectId, style: RestoreStyle, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            id,
            style,
            output_dir: output_dir.into(),
            lock_file_path: None,
            frameworks: Vec::new(),
        }
    }

    /// Set the dependency lock-file path
    pub fn with_lock_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.lock_file_path = Some(path.into());
        self
    }

    /// Add a target framework
    pub fn with_framework(mut self, framework: TargetFrameworkInfo) -> Self {
        self.frameworks.push(framework);
        self
    }

    /// Project identifier
    pub fn id(&self) -> &ProjectId {
        &self.id
    }

    /// Restore style
    pub fn style(&self) -> RestoreStyle {
        self.style
    }

    /// Directory the restore writes its output artifacts into
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Dependency lock-file path, when the project uses one
    pub fn lock_file_path(&self) -> Option<&Path> {
        self.lock_file_path.as_deref()
    }

    /// Declared target frameworks
    pub fn frameworks(&self) -> &[TargetFrameworkInfo] {
        &self.frameworks
    }

    /// All project-reference edges across every target framework
    pub fn referenced_projects(&self) -> impl Iterator<Item = &ProjectId> {
        self.frameworks
            .iter()
            .flat_map(|framework| framework.project_references.iter())
    }
}

/// Errors raised while assembling a solution snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Two descriptors resolve to the same identifier
    #[error("duplicate project identifier in snapshot: {0}")]
    DuplicateProject(String),
}

/// Immutable snapshot of a solution's project descriptors at one instant
///
/// Projects are keyed by identifier and identifiers are unique within a
/// snapshot; a duplicate is a contract violation rejected at construction.
/// The snapshot also carries the full list of identifiers the orchestrator
/// intends to restore this cycle.
#[derive(Debug, Clone)]
pub struct SolutionSnapshot {
    projects: HashMap<ProjectId, ProjectDescriptor>,
    intended_restores: Vec<ProjectId>,
}

impl SolutionSnapshot {
    /// Build a snapshot from descriptors and the intended-restore list
    pub fn new(
        descriptors: Vec<ProjectDescriptor>,
        intended_restores: Vec<ProjectId>,
    ) -> Result<Self, SnapshotError> {
        let mut projects = HashMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let id = descriptor.id().clone();
            if projects.insert(id.clone(), descriptor).is_some() {
                return Err(SnapshotError::DuplicateProject(id.name().to_string()));
            }
        }
        Ok(Self {
            projects,
            intended_restores,
        })
    }

    /// Number of projects in the snapshot
    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    /// Whether the snapshot contains the identifier
    pub fn contains(&self, id: &ProjectId) -> bool {
        self.projects.contains_key(id)
    }

    /// Descriptor for the identifier, if present
    pub fn project(&self, id: &ProjectId) -> Option<&ProjectDescriptor> {
        self.projects.get(id)
    }

    /// Iterate over all descriptors
    pub fn projects(&self) -> impl Iterator<Item = &ProjectDescriptor> {
        self.projects.values()
    }

    /// Identifiers the orchestrator intends to restore this cycle
    pub fn intended_restores(&self) -> &[ProjectId] {
        &self.intended_restores
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insensitive_identifiers_compare_equal() {
        let a = ProjectId::new("Src/App.csproj", IdentifierCasing::Insensitive);
        let b = ProjectId::new("src/app.csproj", IdentifierCasing::Insensitive);

        assert_eq!(a, b);
        assert_eq!(
            a.to_string(),
            "Src/App.csproj",
            "display keeps the original name"
        );
    }

    #[test]
    fn sensitive_identifiers_compare_by_exact_name() {
        let a = ProjectId::new("App", IdentifierCasing::Sensitive);
        let b = ProjectId::new("app", IdentifierCasing::Sensitive);

        assert_ne!(a, b);
    }

    #[test]
    fn artifact_stem_strips_directories_and_extension() {
        let path_shaped = ProjectId::new("repo/src/Web/Web.csproj", IdentifierCasing::Sensitive);
        assert_eq!(path_shaped.artifact_stem(), "Web");

        let bare = ProjectId::new("Web", IdentifierCasing::Sensitive);
        assert_eq!(bare.artifact_stem(), "Web");
    }

    #[test]
    fn descriptor_equality_is_structural() {
        let id = ProjectId::new("App", IdentifierCasing::Sensitive);
        let base = ProjectDescriptor::new(id, RestoreStyle::Reference, "obj");

        assert_eq!(base, base.clone());

        let extended = base
            .clone()
            .with_framework(TargetFrameworkInfo::new("net9.0"));
        assert_ne!(base, extended, "added framework must change equality");

        let locked = base.clone().with_lock_file("packages.lock.json");
        assert_ne!(base, locked, "added lock file must change equality");
    }

    #[test]
    fn reference_order_affects_descriptor_equality() {
        let casing = IdentifierCasing::Sensitive;
        let id = ProjectId::new("App", casing);
        let lib_a = ProjectId::new("LibA", casing);
        let lib_b = ProjectId::new("LibB", casing);

        let forward = ProjectDescriptor::new(id.clone(), RestoreStyle::Reference, "obj")
            .with_framework(
                TargetFrameworkInfo::new("net9.0")
                    .with_reference(lib_a.clone())
                    .with_reference(lib_b.clone()),
            );
        let reversed = ProjectDescriptor::new(id, RestoreStyle::Reference, "obj").with_framework(
            TargetFrameworkInfo::new("net9.0")
                .with_reference(lib_b)
                .with_reference(lib_a),
        );

        assert_ne!(forward, reversed);
    }

    #[test]
    fn snapshot_rejects_duplicate_identifiers() {
        let casing = IdentifierCasing::Insensitive;
        let first = ProjectDescriptor::new(ProjectId::new("App", casing), RestoreStyle::Reference, "obj");
        let second =
            ProjectDescriptor::new(ProjectId::new("APP", casing), RestoreStyle::Reference, "obj2");

        let err = SolutionSnapshot::new(vec![first, second], Vec::new()).unwrap_err();
        assert!(matches!(err, SnapshotError::DuplicateProject(name) if name == "APP"));
    }

    #[test]
    fn snapshot_lookup_follows_identifier_casing() {
        let casing = IdentifierCasing::Insensitive;
        let descriptor =
            ProjectDescriptor::new(ProjectId::new("App", casing), RestoreStyle::Reference, "obj");
        let snapshot = SolutionSnapshot::new(vec![descriptor], Vec::new()).unwrap();

        assert!(snapshot.contains(&ProjectId::new("app", casing)));
        assert!(snapshot.project(&ProjectId::new("APP", casing)).is_some());
    }

    #[test]
    fn referenced_projects_spans_all_frameworks() {
        let casing = IdentifierCasing::Sensitive;
        let descriptor = ProjectDescriptor::new(
            ProjectId::new("App", casing),
            RestoreStyle::Reference,
            "obj",
        )
        .with_framework(
            TargetFrameworkInfo::new("net9.0").with_reference(ProjectId::new("Core", casing)),
        )
        .with_framework(
            TargetFrameworkInfo::new("net48")
                .with_reference(ProjectId::new("Core", casing))
                .with_reference(ProjectId::new("Compat", casing)),
        );

        let references: Vec<_> = descriptor.referenced_projects().collect();
        assert_eq!(references.len(), 3);
    }
}
