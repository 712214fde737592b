//! Candidate interpreters from the well-known virtual environment roots.
//!
//! These are raw [`PythonEnv`] values. Classifying them is the job of the
//! resolver chain.

use crate::detection::{self, fs};
use crate::{DiscoveryContext, PythonEnv};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Directories under the home directory where tools keep environments.
const HOME_ENV_DIRS: &[&str] = &[
    "envs",
    ".direnv",
    ".venvs",
    ".virtualenvs",
    ".local/share/virtualenvs",
];

/// Existing global virtualenv roots without duplicates.
///
/// `WORKON_HOME` is canonicalized. Roots under the home directory keep the
/// home path as given so interpreters under a symlinked home carry the same
/// paths PATH reports for them. Duplicates are detected on canonical forms.
pub(crate) async fn global_virtualenv_dirs(ctx: &DiscoveryContext) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = ctx.var("WORKON_HOME") {
        if let Ok(dir) = fs::canonicalize(Path::new(dir)).await {
            candidates.push(dir);
        }
    }
    if let Some(home) = ctx.home() {
        candidates.extend(HOME_ENV_DIRS.iter().map(|d| home.join(d)));
        if cfg!(target_os = "linux") {
            candidates.push(home.join("Envs"));
        }
    }

    let mut dirs: Vec<PathBuf> = Vec::new();
    let mut seen: Vec<PathBuf> = Vec::new();
    for candidate in candidates {
        if !fs::is_dir(&candidate).await {
            continue;
        }
        let Ok(canonical) = fs::canonicalize(&candidate).await else {
            continue;
        };
        if !seen.contains(&canonical) {
            seen.push(canonical);
            dirs.push(candidate);
        }
    }
    dirs
}

async fn list_root(root: &Path) -> Vec<PythonEnv> {
    match detection::list_python_environments(root).await {
        Ok(envs) => envs,
        Err(e) => {
            trace!("Skipping {}: {}", root.display(), e);
            Vec::new()
        }
    }
}

/// Every interpreter one level below a global virtualenv root.
pub async fn list_global_virtualenvs(ctx: &DiscoveryContext) -> Vec<PythonEnv> {
    let dirs = global_virtualenv_dirs(ctx).await;
    let listed = join_all(dirs.iter().map(|dir| list_root(dir))).await;
    let envs: Vec<PythonEnv> = listed.into_iter().flatten().collect();
    debug!("Found {} global virtualenv candidates", envs.len());
    envs
}
