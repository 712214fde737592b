//! Environments created by Pipenv.
//!
//! Pipenv writes the project directory into `<env>/.project`.

use super::virtualenv::virtualenv_environment;
use super::Locator;
use crate::detection::fs;
use crate::{DiscoveryContext, PythonEnv, PythonEnvironment, PythonEnvironmentCategory};
use std::path::PathBuf;

/// Detector for Pipenv environments.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pipenv;

/// The existing project directory recorded in the environment's `.project`.
async fn pipenv_project(env: &PythonEnv) -> Option<PathBuf> {
    let project_file = env.env_root.as_ref()?.join(".project");
    let contents = fs::read_to_string(&project_file).await.ok()?;
    let project = PathBuf::from(contents.trim());
    if project.as_os_str().is_empty() || !fs::exists(&project).await {
        return None;
    }
    Some(project)
}

impl Locator for Pipenv {
    fn name(&self) -> &'static str {
        "pipenv"
    }

    async fn resolve(&self, _ctx: &DiscoveryContext, env: &PythonEnv) -> Option<PythonEnvironment> {
        let project = pipenv_project(env).await?;
        Some(
            virtualenv_environment(PythonEnvironmentCategory::Pipenv, env)
                .with_project_path(project),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn candidate(root: &std::path::Path) -> PythonEnv {
        PythonEnv::new(root.join("bin").join("python"), Some(root.to_path_buf()), None)
    }

    #[tokio::test]
    async fn test_resolve_pipenv() {
        let env_dir = tempdir().unwrap();
        let project = tempdir().unwrap();
        std::fs::write(
            env_dir.path().join(".project"),
            format!("{}\n", project.path().display()),
        )
        .unwrap();

        let resolved = Pipenv
            .resolve(&DiscoveryContext::new(), &candidate(env_dir.path()))
            .await
            .unwrap();
        assert_eq!(resolved.category, PythonEnvironmentCategory::Pipenv);
        assert_eq!(resolved.project_path.as_deref(), Some(project.path()));
    }

    #[tokio::test]
    async fn test_project_must_exist() {
        let env_dir = tempdir().unwrap();
        std::fs::write(env_dir.path().join(".project"), "/definitely/not/a/project").unwrap();
        assert!(Pipenv
            .resolve(&DiscoveryContext::new(), &candidate(env_dir.path()))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_empty_project_file() {
        let env_dir = tempdir().unwrap();
        std::fs::write(env_dir.path().join(".project"), "  \n").unwrap();
        assert!(Pipenv
            .resolve(&DiscoveryContext::new(), &candidate(env_dir.path()))
            .await
            .is_none());
    }
}
