//! Environments created by `python -m venv`.

use super::virtualenv::virtualenv_environment;
use super::Locator;
use crate::detection::find_and_parse_pyvenv_cfg;
use crate::{DiscoveryContext, PythonEnv, PythonEnvironment, PythonEnvironmentCategory};

/// Detector for venv environments: a parseable `pyvenv.cfg` next to, or one
/// level above, the interpreter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Venv;

impl Locator for Venv {
    fn name(&self) -> &'static str {
        "venv"
    }

    async fn resolve(&self, _ctx: &DiscoveryContext, env: &PythonEnv) -> Option<PythonEnvironment> {
        env.env_root.as_ref()?;
        let cfg = find_and_parse_pyvenv_cfg(&env.executable).await.ok()?;
        let mut resolved = virtualenv_environment(PythonEnvironmentCategory::Venv, env);
        if resolved.version.is_none() {
            resolved.version = Some(cfg.version);
        }
        Some(resolved)
    }
}
