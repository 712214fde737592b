//! Environments created by `virtualenv`.

use super::Locator;
use crate::detection::fs;
use crate::{DiscoveryContext, PythonEnv, PythonEnvironment, PythonEnvironmentCategory};

/// Detector for virtualenv environments.
#[derive(Debug, Clone, Copy, Default)]
pub struct VirtualEnv;

/// Whether the interpreter's directory carries activate scripts.
///
/// ```text
/// env
/// |__ bin
///     |__ activate, activate.fish, activate.bat, ...  <- any of these
///     |__ python
/// ```
pub(crate) async fn is_virtualenv(env: &PythonEnv) -> bool {
    if env.env_root.is_none() {
        return false;
    }
    let Some(bin_dir) = env.executable.parent() else {
        return false;
    };
    if fs::exists(&bin_dir.join("activate")).await || fs::exists(&bin_dir.join("activate.bat")).await {
        return true;
    }
    match fs::list_dir(bin_dir).await {
        Ok(entries) => entries.iter().any(|entry| {
            entry
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("activate"))
        }),
        Err(_) => false,
    }
}

/// Build the record shared by the virtualenv-style resolvers.
pub(crate) fn virtualenv_environment(
    category: PythonEnvironmentCategory,
    env: &PythonEnv,
) -> PythonEnvironment {
    let mut resolved = PythonEnvironment::for_executable(category, &env.executable)
        .with_version(env.version.clone());
    if let Some(root) = &env.env_root {
        resolved = resolved.with_env_root(root);
        if let Some(name) = root.file_name() {
            resolved = resolved.with_name(name.to_string_lossy());
        }
    }
    resolved
}

impl Locator for VirtualEnv {
    fn name(&self) -> &'static str {
        "virtualenv"
    }

    async fn resolve(&self, _ctx: &DiscoveryContext, env: &PythonEnv) -> Option<PythonEnvironment> {
        if !is_virtualenv(env).await {
            return None;
        }
        Some(virtualenv_environment(PythonEnvironmentCategory::VirtualEnv, env))
    }
}
