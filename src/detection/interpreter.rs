//! Locating the interpreter inside an environment directory.

use super::{fs, pyvenv};
use crate::{ProbeError, PythonEnv};
use futures::future::join_all;
use std::path::{Path, PathBuf};

/// The platform's bare interpreter name.
pub(crate) fn python_binary_name() -> &'static str {
    if cfg!(windows) {
        "python.exe"
    } else {
        "python"
    }
}

/// Find the interpreter of the environment rooted at `env_root`.
///
/// Checked in order: `bin/python`, `Scripts/python.exe`, then the platform
/// binary name directly under the root.
///
/// # Arguments
///
/// * `env_root` - The environment directory
///
/// # Returns
///
/// `Some(PathBuf)` if one of the candidates exists, `None` otherwise.
pub(crate) async fn find_python_binary(env_root: &Path) -> Option<PathBuf> {
    let candidates = [
        env_root.join("bin").join("python"),
        env_root.join("Scripts").join("python.exe"),
        env_root.join(python_binary_name()),
    ];
    for candidate in candidates {
        if fs::exists(&candidate).await {
            return Some(candidate);
        }
    }
    None
}

/// Every immediate subdirectory of `root` that contains an interpreter,
/// as a raw candidate with its version probed.
pub(crate) async fn list_python_environments(root: &Path) -> Result<Vec<PythonEnv>, ProbeError> {
    let dirs = fs::list_subdirs(root).await?;
    let probes = dirs.into_iter().map(|env_root| async move {
        let executable = find_python_binary(&env_root).await?;
        let version = pyvenv::probe_version(&executable).await;
        Some(PythonEnv::new(executable, Some(env_root), version))
    });
    Ok(join_all(probes).await.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    #[tokio::test]
    async fn test_find_in_bin() {
        let dir = tempdir().unwrap();
        let exe = dir.path().join("bin").join("python");
        touch(&exe);
        assert_eq!(find_python_binary(dir.path()).await, Some(exe));
    }

    #[tokio::test]
    async fn test_find_in_scripts() {
        let dir = tempdir().unwrap();
        let exe = dir.path().join("Scripts").join("python.exe");
        touch(&exe);
        assert_eq!(find_python_binary(dir.path()).await, Some(exe));
    }

    #[tokio::test]
    async fn test_find_at_root() {
        let dir = tempdir().unwrap();
        let exe = dir.path().join(python_binary_name());
        touch(&exe);
        assert_eq!(find_python_binary(dir.path()).await, Some(exe));
    }

    #[tokio::test]
    async fn test_find_none() {
        let dir = tempdir().unwrap();
        assert!(find_python_binary(dir.path()).await.is_none());
    }

    #[tokio::test]
    async fn test_list_python_environments() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("with-python").join("bin").join("python"));
        std::fs::write(
            dir.path().join("with-python").join("pyvenv.cfg"),
            "version = 3.11.2\n",
        )
        .unwrap();
        std::fs::create_dir(dir.path().join("empty")).unwrap();
        touch(&dir.path().join("not-a-dir"));

        let envs = list_python_environments(dir.path()).await.unwrap();
        assert_eq!(envs.len(), 1);
        assert_eq!(envs[0].env_root.as_deref(), Some(dir.path().join("with-python").as_path()));
        assert_eq!(envs[0].version.as_deref(), Some("3.11.2"));
    }
}
