//! pyenv-managed interpreters and pyenv-virtualenv environments.

use super::Locator;
use crate::detection::{self, fs};
use crate::{
    DiscoveryContext, DiscoveryResult, EnvManager, EnvManagerType, PythonEnvironment,
    PythonEnvironmentCategory,
};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Detector for pyenv.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pyenv;

/// pyenv's root: `PYENV_ROOT`, then `PYENV`, then `~/.pyenv`.
pub(crate) fn pyenv_root(ctx: &DiscoveryContext) -> Option<PathBuf> {
    ctx.var("PYENV_ROOT")
        .or_else(|| ctx.var("PYENV"))
        .map(PathBuf::from)
        .or_else(|| ctx.home().map(|home| home.join(".pyenv")))
}

async fn pyenv_binary(ctx: &DiscoveryContext, root: Option<&Path>) -> Option<PathBuf> {
    if let Some(root) = root {
        let exe = root.join("bin").join("pyenv");
        if fs::exists(&exe).await {
            return Some(exe);
        }
    }
    detection::find_in_dirs(ctx.global_search_locations(), &["pyenv"]).await
}

/// Version of pyenv itself, readable when the binary is a symlink into a
/// versioned install such as `Cellar/pyenv/2.4.0/libexec/pyenv`.
async fn pyenv_manager_version(binary: &Path) -> Option<String> {
    let target = fs::read_link(binary).await.ok()?;
    detection::parse_pyenv_manager_version(&target.to_string_lossy())
}

/// Classify one `versions/<folder>` entry.
async fn version_environment(folder: PathBuf, manager: Arc<EnvManager>) -> Option<PythonEnvironment> {
    let executable = detection::find_python_binary(&folder).await?;
    let folder_name = folder.file_name()?.to_string_lossy().into_owned();

    if let Some(version) = detection::parse_pyenv_folder_version(&folder_name) {
        return Some(
            PythonEnvironment::for_executable(PythonEnvironmentCategory::Pyenv, &executable)
                .with_version(Some(version))
                .with_env_root(&folder)
                .with_manager(manager),
        );
    }

    match detection::find_and_parse_pyvenv_cfg(&executable).await {
        Ok(cfg) => Some(
            PythonEnvironment::for_executable(PythonEnvironmentCategory::PyenvVirtualEnv, &executable)
                .with_name(folder_name)
                .with_version(Some(cfg.version))
                .with_env_root(&folder)
                .with_manager(manager),
        ),
        Err(e) => {
            trace!("Skipping pyenv folder {}: {}", folder.display(), e);
            None
        }
    }
}

impl Locator for Pyenv {
    fn name(&self) -> &'static str {
        "pyenv"
    }

    async fn find(&self, ctx: &DiscoveryContext) -> Option<DiscoveryResult> {
        let root = pyenv_root(ctx);
        let binary = pyenv_binary(ctx, root.as_deref()).await?;
        let version = pyenv_manager_version(&binary).await;
        debug!("Found pyenv at {}", binary.display());
        let manager = Arc::new(EnvManager::new(binary, version, EnvManagerType::Pyenv));

        let folders = match &root {
            Some(root) => fs::list_subdirs(&root.join("versions")).await.unwrap_or_default(),
            None => Vec::new(),
        };
        let environments: Vec<_> = join_all(
            folders
                .into_iter()
                .map(|folder| version_environment(folder, manager.clone())),
        )
        .await
        .into_iter()
        .flatten()
        .collect();

        if environments.is_empty() {
            return Some(DiscoveryResult::manager_only(manager));
        }
        debug!("Found {} pyenv environments", environments.len());
        Some(DiscoveryResult {
            managers: vec![manager],
            environments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    fn pyenv_layout(root: &Path) {
        touch(&root.join("bin").join("pyenv"));
        let versions = root.join("versions");
        touch(&versions.join("3.12.0").join("bin").join("python"));
        touch(&versions.join("3.12-dev").join("bin").join("python"));
        touch(&versions.join("my-venv").join("bin").join("python"));
        std::fs::write(
            versions.join("my-venv").join("pyvenv.cfg"),
            "home = /x\nversion = 3.11.6\n",
        )
        .unwrap();
        touch(&versions.join("no-cfg").join("bin").join("python"));
        std::fs::create_dir_all(versions.join("3.9.1")).unwrap();
    }

    #[test]
    fn test_root_resolution_order() {
        let ctx = DiscoveryContext::new()
            .with_var("PYENV_ROOT", "/a")
            .with_var("PYENV", "/b")
            .with_home("/home/u");
        assert_eq!(pyenv_root(&ctx), Some(PathBuf::from("/a")));

        let ctx = DiscoveryContext::new().with_var("PYENV", "/b").with_home("/home/u");
        assert_eq!(pyenv_root(&ctx), Some(PathBuf::from("/b")));

        let ctx = DiscoveryContext::new().with_home("/home/u");
        assert_eq!(pyenv_root(&ctx), Some(PathBuf::from("/home/u/.pyenv")));

        assert!(pyenv_root(&DiscoveryContext::new()).is_none());
    }

    #[tokio::test]
    async fn test_find_classifies_versions() {
        let dir = tempdir().unwrap();
        pyenv_layout(dir.path());
        let ctx = DiscoveryContext::new().with_var("PYENV_ROOT", dir.path().to_string_lossy());

        let result = Pyenv.find(&ctx).await.unwrap();
        assert_eq!(result.managers.len(), 1);
        assert_eq!(result.managers[0].tool, EnvManagerType::Pyenv);
        assert_eq!(result.environments.len(), 3);

        let by_root = |name: &str| {
            result
                .environments
                .iter()
                .find(|e| e.env_root.as_deref() == Some(dir.path().join("versions").join(name).as_path()))
                .cloned()
                .unwrap()
        };

        let release = by_root("3.12.0");
        assert_eq!(release.category, PythonEnvironmentCategory::Pyenv);
        assert_eq!(release.version.as_deref(), Some("3.12.0"));

        let dev = by_root("3.12-dev");
        assert_eq!(dev.category, PythonEnvironmentCategory::Pyenv);
        assert_eq!(dev.version.as_deref(), Some("3.12-dev"));

        let venv = by_root("my-venv");
        assert_eq!(venv.category, PythonEnvironmentCategory::PyenvVirtualEnv);
        assert_eq!(venv.name.as_deref(), Some("my-venv"));
        assert_eq!(venv.version.as_deref(), Some("3.11.6"));

        for env in &result.environments {
            assert!(Arc::ptr_eq(env.manager.as_ref().unwrap(), &result.managers[0]));
        }
    }

    #[tokio::test]
    async fn test_manager_only_when_no_versions() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("bin").join("pyenv"));
        let ctx = DiscoveryContext::new().with_var("PYENV_ROOT", dir.path().to_string_lossy());

        let result = Pyenv.find(&ctx).await.unwrap();
        assert_eq!(result.managers.len(), 1);
        assert!(result.environments.is_empty());
    }

    #[tokio::test]
    async fn test_binary_from_global_locations() {
        let dir = tempdir().unwrap();
        let global = dir.path().join("usr-local-bin");
        touch(&global.join("pyenv"));
        let ctx = DiscoveryContext::new()
            .with_var("PYENV_ROOT", dir.path().join("missing").to_string_lossy())
            .with_global_search_locations(vec![global.clone()]);

        let result = Pyenv.find(&ctx).await.unwrap();
        assert_eq!(result.managers[0].executable_path, global.join("pyenv"));
    }

    #[tokio::test]
    async fn test_absent_without_binary() {
        let dir = tempdir().unwrap();
        let ctx = DiscoveryContext::new().with_var("PYENV_ROOT", dir.path().to_string_lossy());
        assert!(Pyenv.find(&ctx).await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_manager_version_from_symlink() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("Cellar").join("pyenv").join("2.4.0").join("libexec").join("pyenv");
        touch(&target);
        let root = dir.path().join("root");
        std::fs::create_dir_all(root.join("bin")).unwrap();
        std::os::unix::fs::symlink(&target, root.join("bin").join("pyenv")).unwrap();
        let ctx = DiscoveryContext::new().with_var("PYENV_ROOT", root.to_string_lossy());

        let result = Pyenv.find(&ctx).await.unwrap();
        assert_eq!(result.managers[0].version.as_deref(), Some("2.4.0"));
    }
}
