//! Async filesystem probes.
//!
//! Every probe is a suspension point. Failures come back as
//! [`ProbeError`] so callers decide what "absent" means for them.

use crate::ProbeError;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Whether `path` exists (following symlinks).
pub(crate) async fn exists(path: &Path) -> bool {
    fs::metadata(path).await.is_ok()
}

/// Whether `path` is a directory (following symlinks).
pub(crate) async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

/// Whether `path` is a regular file or a symlink (the link itself is not
/// followed).
pub(crate) async fn is_file_or_symlink(path: &Path) -> bool {
    match fs::symlink_metadata(path).await {
        Ok(meta) => meta.is_file() || meta.file_type().is_symlink(),
        Err(_) => false,
    }
}

/// Full paths of every entry in `dir`.
pub(crate) async fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, ProbeError> {
    let mut entries = fs::read_dir(dir).await?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        paths.push(entry.path());
    }
    Ok(paths)
}

/// Immediate subdirectories of `dir`.
pub(crate) async fn list_subdirs(dir: &Path) -> Result<Vec<PathBuf>, ProbeError> {
    let mut dirs = Vec::new();
    for path in list_dir(dir).await? {
        if is_dir(&path).await {
            dirs.push(path);
        }
    }
    Ok(dirs)
}

/// Contents of a UTF-8 file.
pub(crate) async fn read_to_string(path: &Path) -> Result<String, ProbeError> {
    Ok(fs::read_to_string(path).await?)
}

/// Fully resolved path with symlinks removed.
pub(crate) async fn canonicalize(path: &Path) -> Result<PathBuf, ProbeError> {
    Ok(fs::canonicalize(path).await?)
}

/// Resolve `path` if it is a symlink; `NotFound` for anything else.
pub(crate) async fn resolve_symlink(path: &Path) -> Result<PathBuf, ProbeError> {
    let meta = fs::symlink_metadata(path).await?;
    if meta.is_file() || !meta.file_type().is_symlink() {
        return Err(ProbeError::NotFound);
    }
    canonicalize(path).await
}

/// Target of a symlink, without resolving further links.
pub(crate) async fn read_link(path: &Path) -> Result<PathBuf, ProbeError> {
    Ok(fs::read_link(path).await?)
}
