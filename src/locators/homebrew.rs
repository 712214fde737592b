//! Interpreters installed by Homebrew.
//!
//! `$HOMEBREW_PREFIX/bin` holds symlinks (`python3`, `python3.11`, ...) into
//! the Cellar. Several names usually point at the same binary, so results
//! are keyed by the resolved target.

use super::Locator;
use crate::detection::{self, fs};
use crate::{DiscoveryContext, DiscoveryResult, PythonEnvironment, PythonEnvironmentCategory};
use futures::future::join_all;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Detector for Homebrew Python.
#[derive(Debug, Clone, Copy, Default)]
pub struct Homebrew;

fn is_python_entry(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.starts_with("python") && !name.ends_with("-config") && !name.ends_with("-build")
}

/// The real interpreter behind a `python*` symlink in the prefix's `bin`.
async fn symlinked_python(path: PathBuf) -> Option<PathBuf> {
    if !is_python_entry(&path) {
        return None;
    }
    match fs::resolve_symlink(&path).await {
        Ok(target) => Some(target),
        Err(e) => {
            trace!("Ignoring {}: {}", path.display(), e);
            None
        }
    }
}

impl Locator for Homebrew {
    fn name(&self) -> &'static str {
        "homebrew"
    }

    async fn find(&self, ctx: &DiscoveryContext) -> Option<DiscoveryResult> {
        let prefix = ctx.var("HOMEBREW_PREFIX")?;
        let bin = Path::new(prefix).join("bin");
        let mut entries = fs::list_dir(&bin).await.ok()?;
        entries.sort();

        let targets = join_all(entries.into_iter().map(symlinked_python)).await;

        let mut reported = HashSet::new();
        let environments: Vec<_> = targets
            .into_iter()
            .flatten()
            .filter(|target| reported.insert(target.clone()))
            .map(|target| {
                let version = detection::parse_version_segment(&target.to_string_lossy());
                PythonEnvironment::for_executable(PythonEnvironmentCategory::Homebrew, &target)
                    .with_version(version)
            })
            .collect();

        debug!("Found {} Homebrew interpreters", environments.len());
        if environments.is_empty() {
            return None;
        }
        Some(DiscoveryResult::environments(environments))
    }
}
