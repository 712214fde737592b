//! Interpreters on the system PATH.

use super::Locator;
use crate::detection::{fs, probe_version, python_binary_name};
use crate::{DiscoveryContext, DiscoveryResult, PythonEnv, PythonEnvironment, PythonEnvironmentCategory};
use futures::future::join_all;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Detector for bare `python` / `python.exe` binaries on PATH.
#[derive(Debug, Clone, Copy, Default)]
pub struct System;

async fn system_environment(executable: &Path, version: Option<String>) -> PythonEnvironment {
    let version = match version {
        Some(v) => Some(v),
        None => probe_version(executable).await,
    };
    PythonEnvironment::for_executable(PythonEnvironmentCategory::System, executable)
        .with_version(version)
}

impl Locator for System {
    fn name(&self) -> &'static str {
        "system"
    }

    async fn resolve(&self, _ctx: &DiscoveryContext, env: &PythonEnv) -> Option<PythonEnvironment> {
        let file_name = env.executable.file_name()?.to_str()?;
        if file_name != python_binary_name() {
            return None;
        }
        Some(system_environment(&env.executable, env.version.clone()).await)
    }

    async fn find(&self, ctx: &DiscoveryContext) -> Option<DiscoveryResult> {
        let mut seen = HashSet::new();
        let candidates: Vec<_> = ctx
            .path_entries()
            .into_iter()
            .map(|dir| dir.join(python_binary_name()))
            .filter(|exe| seen.insert(exe.clone()))
            .collect();

        let probes = candidates.iter().map(|exe| async move {
            if !fs::exists(exe).await {
                return None;
            }
            Some(system_environment(exe, None).await)
        });
        let environments: Vec<_> = join_all(probes).await.into_iter().flatten().collect();

        debug!("Found {} interpreters on PATH", environments.len());
        if environments.is_empty() {
            return None;
        }
        Some(DiscoveryResult::environments(environments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_find_on_path() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        std::fs::write(a.path().join(python_binary_name()), "").unwrap();
        let path = std::env::join_paths([a.path(), b.path(), a.path()]).unwrap();
        let ctx = DiscoveryContext::new().with_var("PATH", path.to_string_lossy());

        let result = System.find(&ctx).await.unwrap();
        assert!(result.managers.is_empty());
        assert_eq!(result.environments.len(), 1);
        let env = &result.environments[0];
        assert_eq!(env.category, PythonEnvironmentCategory::System);
        assert_eq!(
            env.executable_path.as_deref(),
            Some(a.path().join(python_binary_name()).as_path())
        );
        assert!(env.version.is_none());
    }

    #[tokio::test]
    async fn test_find_without_path_is_absent() {
        assert!(System.find(&DiscoveryContext::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_only_bare_name() {
        let ctx = DiscoveryContext::new();
        let bare = PythonEnv::new(
            PathBuf::from("/usr/bin").join(python_binary_name()),
            None,
            Some("3.10.12".into()),
        );
        let resolved = System.resolve(&ctx, &bare).await.unwrap();
        assert_eq!(resolved.version.as_deref(), Some("3.10.12"));

        let versioned = PythonEnv::new(PathBuf::from("/usr/bin/python3.10"), None, None);
        assert!(System.resolve(&ctx, &versioned).await.is_none());
    }
}
