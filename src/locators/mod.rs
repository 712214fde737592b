//! Per-manager detectors.
//!
//! Every detector implements [`Locator`]: `resolve` classifies a raw
//! candidate, `find` enumerates the manager's own environments. Detectors
//! that only make sense one way leave the other at its default ("absent").
//!
//! | Detector            | `find` | `resolve` |
//! |---------------------|--------|-----------|
//! | [`System`]          | yes    | yes       |
//! | [`Conda`]           | yes    | yes       |
//! | [`Pyenv`]           | yes    |           |
//! | [`Homebrew`]        | yes    |           |
//! | [`Pipenv`]          |        | yes       |
//! | [`VirtualEnvWrapper`] |      | yes       |
//! | [`Venv`]            |        | yes       |
//! | [`VirtualEnv`]      |        | yes       |
//!
//! Candidates from [`global_virtualenvs`] go through the [`Resolver`] chain
//! in the fixed order of [`RESOLVER_CHAIN`].

pub mod conda;
pub mod global_virtualenvs;
pub mod homebrew;
pub mod pipenv;
pub mod pyenv;
pub mod system;
pub mod venv;
pub mod virtualenv;
pub mod virtualenvwrapper;

pub use conda::Conda;
pub use homebrew::Homebrew;
pub use pipenv::Pipenv;
pub use pyenv::Pyenv;
pub use system::System;
pub use venv::Venv;
pub use virtualenv::VirtualEnv;
pub use virtualenvwrapper::VirtualEnvWrapper;

use crate::{DiscoveryContext, DiscoveryResult, PythonEnv, PythonEnvironment};

/// The two-operation detector contract.
///
/// Both operations are read-only with respect to the filesystem and return
/// `None` rather than an error when the manager is absent or the candidate
/// does not match.
#[allow(async_fn_in_trait)]
pub trait Locator {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Classify `env` into this detector's category, if it belongs there.
    async fn resolve(&self, _ctx: &DiscoveryContext, _env: &PythonEnv) -> Option<PythonEnvironment> {
        None
    }

    /// Enumerate this manager's environments without candidates.
    async fn find(&self, _ctx: &DiscoveryContext) -> Option<DiscoveryResult> {
        None
    }
}

/// The resolvers applied to global-virtualenv candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum Resolver {
    /// [`Pipenv`]
    Pipenv,
    /// [`VirtualEnvWrapper`]
    VirtualEnvWrapper,
    /// [`Venv`]
    Venv,
    /// [`VirtualEnv`]
    VirtualEnv,
}

/// Resolver precedence. Venv and VirtualEnv heuristics also match
/// virtualenvwrapper and Pipenv environments, so they come last.
pub const RESOLVER_CHAIN: [Resolver; 4] = [
    Resolver::Pipenv,
    Resolver::VirtualEnvWrapper,
    Resolver::Venv,
    Resolver::VirtualEnv,
];

impl Resolver {
    /// Run this resolver against a candidate.
    pub async fn resolve(self, ctx: &DiscoveryContext, env: &PythonEnv) -> Option<PythonEnvironment> {
        match self {
            Self::Pipenv => Pipenv.resolve(ctx, env).await,
            Self::VirtualEnvWrapper => VirtualEnvWrapper.resolve(ctx, env).await,
            Self::Venv => Venv.resolve(ctx, env).await,
            Self::VirtualEnv => VirtualEnv.resolve(ctx, env).await,
        }
    }
}

/// Run the chain strictly in order; the first match wins.
pub async fn resolve_with_chain(ctx: &DiscoveryContext, env: &PythonEnv) -> Option<PythonEnvironment> {
    for resolver in RESOLVER_CHAIN {
        if let Some(resolved) = resolver.resolve(ctx, env).await {
            tracing::trace!(
                "{:?} claimed {}",
                resolver,
                env.executable.display()
            );
            return Some(resolved);
        }
    }
    None
}
