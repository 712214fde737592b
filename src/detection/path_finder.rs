//! Binary lookup on PATH and in fallback locations.

use super::fs;
use crate::DiscoveryContext;
use std::path::{Path, PathBuf};

/// Find the first of `names` in any of `dirs`, in directory order.
///
/// A hit is a regular file or a symlink; the link is not required to
/// resolve.
///
/// # Arguments
///
/// * `dirs` - Directories to search, highest priority first
/// * `names` - Executable names to try in each directory
///
/// # Returns
///
/// `Some(PathBuf)` for the first hit, `None` otherwise.
pub(crate) async fn find_in_dirs(dirs: &[PathBuf], names: &[&str]) -> Option<PathBuf> {
    for dir in dirs {
        for name in names {
            let candidate = dir.join(name);
            if fs::is_file_or_symlink(&candidate).await {
                return Some(candidate);
            }
        }
    }
    None
}

/// Find the first of `names` on the context's PATH.
pub(crate) async fn find_on_path(ctx: &DiscoveryContext, names: &[&str]) -> Option<PathBuf> {
    find_in_dirs(&ctx.path_entries(), names).await
}

/// Turn a host-supplied interpreter reference into an absolute path.
///
/// Absolute and relative paths are returned unchanged; bare command names
/// (`python3`) are looked up on the context's PATH via the `which` crate,
/// which also honours `PATHEXT` on Windows.
pub(crate) fn resolve_command(ctx: &DiscoveryContext, command: &Path) -> Option<PathBuf> {
    if command.components().count() > 1 || command.is_absolute() {
        return Some(command.to_path_buf());
    }
    let cwd = std::env::current_dir().ok()?;
    which::which_in(command, ctx.var("PATH"), cwd).ok()
}
