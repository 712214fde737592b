//! Data model shared by every detector: raw candidates, resolved
//! environments, managers and per-detector results.

use crate::{EnvManagerType, PythonEnvironmentCategory};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An on-disk interpreter found by a candidate scan, not yet classified.
///
/// Candidates are produced by [`crate::locators::global_virtualenvs`] and
/// consumed by the resolver chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonEnv {
    /// Absolute path to the interpreter.
    pub executable: PathBuf,

    /// The environment directory containing the interpreter, if known.
    pub env_root: Option<PathBuf>,

    /// Version string, when a cheap probe could determine it.
    pub version: Option<String>,
}

impl PythonEnv {
    /// Create a new candidate.
    pub fn new(executable: PathBuf, env_root: Option<PathBuf>, version: Option<String>) -> Self {
        Self {
            executable,
            env_root,
            version,
        }
    }

    /// Dedup key of the candidate: its executable path.
    pub fn key(&self) -> String {
        path_key(&self.executable)
    }
}

/// A tool that manages environments rather than being one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvManager {
    /// Path to the manager binary; the manager's dedup key.
    pub executable_path: PathBuf,

    /// Version of the manager, if it could be determined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Which tool this is.
    pub tool: EnvManagerType,
}

impl EnvManager {
    /// Create a new manager record.
    pub fn new(executable_path: PathBuf, version: Option<String>, tool: EnvManagerType) -> Self {
        Self {
            executable_path,
            version,
            tool,
        }
    }

    /// Dedup key of the manager.
    pub fn key(&self) -> String {
        path_key(&self.executable_path)
    }
}

/// The normalized, reportable record of a discovered environment.
///
/// At least one of `executable_path` / `env_root` is set by every detector;
/// together they form the dedup key (see [`PythonEnvironment::key`]).
/// Records are built once and never mutated after they leave a detector.
///
/// Field names on the wire follow the consumer's naming
/// (`pythonExecutablePath`, `envPath`, `envManager`, `pythonRunCommand`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PythonEnvironment {
    /// Display label (conda env name, venv folder name, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The interpreter. Absent for environments without a Python binary.
    #[serde(
        rename = "pythonExecutablePath",
        skip_serializing_if = "Option::is_none"
    )]
    pub executable_path: Option<PathBuf>,

    /// Classification of the environment.
    pub category: PythonEnvironmentCategory,

    /// Python version, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Root directory of the environment.
    #[serde(rename = "envPath", skip_serializing_if = "Option::is_none")]
    pub env_root: Option<PathBuf>,

    /// `sys.prefix` of the interpreter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sys_prefix_path: Option<PathBuf>,

    /// The manager that produced this environment. Shared, not owned.
    #[serde(rename = "envManager", skip_serializing_if = "Option::is_none")]
    pub manager: Option<Arc<EnvManager>>,

    /// How to invoke the interpreter, e.g. `[conda, "run", "-n", name, "python"]`.
    #[serde(rename = "pythonRunCommand", skip_serializing_if = "Option::is_none")]
    pub run_command: Option<Vec<String>>,

    /// Project directory associated with a Pipenv environment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_path: Option<PathBuf>,
}

impl PythonEnvironment {
    /// Start an empty record of the given category.
    pub fn new(category: PythonEnvironmentCategory) -> Self {
        Self {
            name: None,
            executable_path: None,
            category,
            version: None,
            env_root: None,
            sys_prefix_path: None,
            manager: None,
            run_command: None,
            project_path: None,
        }
    }

    /// Start a record for an interpreter whose run command is the
    /// interpreter itself.
    pub fn for_executable(category: PythonEnvironmentCategory, executable: &Path) -> Self {
        Self::new(category)
            .with_executable(executable)
            .with_run_command(vec![executable.to_string_lossy().into_owned()])
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_executable(mut self, executable: &Path) -> Self {
        self.executable_path = Some(executable.to_path_buf());
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    /// Set both the environment root and `sys.prefix` to `root`.
    #[must_use]
    pub fn with_env_root(mut self, root: &Path) -> Self {
        self.env_root = Some(root.to_path_buf());
        self.sys_prefix_path = Some(root.to_path_buf());
        self
    }

    #[must_use]
    pub fn with_manager(mut self, manager: Arc<EnvManager>) -> Self {
        self.manager = Some(manager);
        self
    }

    #[must_use]
    pub fn with_run_command(mut self, command: Vec<String>) -> Self {
        self.run_command = Some(command);
        self
    }

    #[must_use]
    pub fn with_project_path(mut self, project: PathBuf) -> Self {
        self.project_path = Some(project);
        self
    }

    /// Dedup key: the executable path, falling back to the environment root.
    ///
    /// Returns `None` only for a record that violates the data model
    /// (neither field set).
    pub fn key(&self) -> Option<String> {
        self.executable_path
            .as_deref()
            .or(self.env_root.as_deref())
            .map(path_key)
    }
}

/// What a single detector's `find()` produced.
///
/// Either list may be empty: a manager can be installed with zero
/// environments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryResult {
    /// Managers found by the detector.
    pub managers: Vec<Arc<EnvManager>>,
    /// Environments found by the detector.
    pub environments: Vec<PythonEnvironment>,
}

impl DiscoveryResult {
    /// A result carrying only the manager.
    pub fn manager_only(manager: Arc<EnvManager>) -> Self {
        Self {
            managers: vec![manager],
            environments: Vec::new(),
        }
    }

    /// A result carrying only environments.
    pub fn environments(environments: Vec<PythonEnvironment>) -> Self {
        Self {
            managers: Vec::new(),
            environments,
        }
    }

    /// `true` when neither managers nor environments were found.
    pub fn is_empty(&self) -> bool {
        self.managers.is_empty() && self.environments.is_empty()
    }
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conda_manager() -> Arc<EnvManager> {
        Arc::new(EnvManager::new(
            PathBuf::from("/opt/conda/bin/conda"),
            Some("24.1.2".to_string()),
            EnvManagerType::Conda,
        ))
    }

    #[test]
    fn test_key_prefers_executable() {
        let env = PythonEnvironment::new(PythonEnvironmentCategory::Venv)
            .with_executable(Path::new("/envs/a/bin/python"))
            .with_env_root(Path::new("/envs/a"));
        assert_eq!(env.key().as_deref(), Some("/envs/a/bin/python"));
    }

    #[test]
    fn test_key_falls_back_to_env_root() {
        let env = PythonEnvironment::new(PythonEnvironmentCategory::Conda)
            .with_env_root(Path::new("/opt/conda/envs/empty"));
        assert_eq!(env.key().as_deref(), Some("/opt/conda/envs/empty"));
    }

    #[test]
    fn test_key_absent_when_nothing_set() {
        let env = PythonEnvironment::new(PythonEnvironmentCategory::System);
        assert!(env.key().is_none());
    }

    #[test]
    fn test_for_executable_sets_run_command() {
        let env = PythonEnvironment::for_executable(
            PythonEnvironmentCategory::System,
            Path::new("/usr/bin/python"),
        );
        assert_eq!(
            env.run_command,
            Some(vec!["/usr/bin/python".to_string()])
        );
    }

    #[test]
    fn test_environment_wire_field_names() {
        let env = PythonEnvironment::new(PythonEnvironmentCategory::Conda)
            .with_name("base")
            .with_executable(Path::new("/opt/conda/bin/python"))
            .with_env_root(Path::new("/opt/conda"))
            .with_manager(conda_manager())
            .with_run_command(vec!["conda".into(), "run".into()]);
        let value = serde_json::to_value(&env).unwrap();

        assert_eq!(value["pythonExecutablePath"], "/opt/conda/bin/python");
        assert_eq!(value["envPath"], "/opt/conda");
        assert_eq!(value["sysPrefixPath"], "/opt/conda");
        assert_eq!(value["category"], "conda");
        assert_eq!(value["envManager"]["tool"], "conda");
        assert_eq!(value["envManager"]["executablePath"], "/opt/conda/bin/conda");
        assert_eq!(value["pythonRunCommand"][1], "run");
        assert!(value.get("projectPath").is_none());
        assert!(value.get("version").is_none());
    }

    #[test]
    fn test_discovery_result_helpers() {
        assert!(DiscoveryResult::default().is_empty());
        let result = DiscoveryResult::manager_only(conda_manager());
        assert!(!result.is_empty());
        assert_eq!(result.managers.len(), 1);
        assert!(result.environments.is_empty());
    }

    #[test]
    fn test_candidate_key() {
        let candidate = PythonEnv::new(PathBuf::from("/home/u/.venvs/x/bin/python"), None, None);
        assert_eq!(candidate.key(), "/home/u/.venvs/x/bin/python");
    }
}
