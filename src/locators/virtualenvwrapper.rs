//! Environments managed by virtualenvwrapper under `WORKON_HOME`.

use super::virtualenv::{is_virtualenv, virtualenv_environment};
use super::Locator;
use crate::detection::fs;
use crate::{DiscoveryContext, PythonEnv, PythonEnvironment, PythonEnvironmentCategory};
use std::path::{Path, PathBuf};

/// Detector for virtualenvwrapper environments.
#[derive(Debug, Clone, Copy, Default)]
pub struct VirtualEnvWrapper;

async fn default_work_on_home(ctx: &DiscoveryContext) -> Option<PathBuf> {
    let home = ctx.home()?;
    // `Envs` is the documented default on Windows; `virtualenvs` is also
    // accepted there.
    let candidates: &[&str] = if cfg!(windows) {
        &["Envs", "virtualenvs"]
    } else {
        &["virtualenvs"]
    };
    for name in candidates {
        let dir = home.join(name);
        if fs::exists(&dir).await {
            return fs::canonicalize(&dir).await.ok();
        }
    }
    None
}

/// virtualenvwrapper's root: `WORKON_HOME` when it exists, else the
/// platform default. Canonicalized so prefix checks see through symlinks.
pub(crate) async fn work_on_home(ctx: &DiscoveryContext) -> Option<PathBuf> {
    if let Some(dir) = ctx.var("WORKON_HOME") {
        if let Ok(dir) = fs::canonicalize(Path::new(dir)).await {
            return Some(dir);
        }
    }
    default_work_on_home(ctx).await
}

async fn is_virtualenvwrapper(ctx: &DiscoveryContext, env: &PythonEnv) -> bool {
    if env.env_root.is_none() {
        return false;
    }
    let Some(root) = work_on_home(ctx).await else {
        return false;
    };
    // The interpreter is usually a symlink out of the environment, so test
    // the path as given and the environment root's resolved form.
    let mut inside = env.executable.starts_with(&root);
    if !inside {
        if let Some(env_root) = &env.env_root {
            inside = fs::canonicalize(env_root)
                .await
                .is_ok_and(|r| r.starts_with(&root));
        }
    }
    inside && is_virtualenv(env).await
}

impl Locator for VirtualEnvWrapper {
    fn name(&self) -> &'static str {
        "virtualenvwrapper"
    }

    async fn resolve(&self, ctx: &DiscoveryContext, env: &PythonEnv) -> Option<PythonEnvironment> {
        if !is_virtualenvwrapper(ctx, env).await {
            return None;
        }
        Some(virtualenv_environment(
            PythonEnvironmentCategory::VirtualEnvWrapper,
            env,
        ))
    }
}
