//! Regex-based version and name extraction.

use crate::ProbeError;
use regex::Regex;
use std::sync::OnceLock;

/// Compile `pattern` once into `cell`.
pub(super) fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern"))
}

/// Extract the version from a conda-meta package file name.
///
/// Package files are named `<name>-<version>-<build>.json`:
///
/// - `python-3.11.4-h1234.json` -> 3.11.4
/// - `conda-24.1.2-py311h06a4308_0.json` -> 24.1.2
///
/// # Arguments
///
/// * `file_name` - File name of a `conda-meta` entry, without directory
///
/// # Returns
///
/// `Err(ProbeError::Malformed)` if the name does not follow the pattern or
/// carries an empty version.
pub(crate) fn parse_conda_meta_version(file_name: &str) -> Result<String, ProbeError> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = regex(&RE, r"^([\w\-]*)-([\d\.]*)-.*\.json$");

    re.captures(file_name)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ProbeError::Malformed(file_name.to_string()))
}

/// Classify a pyenv `versions/` folder name as a plain CPython build.
///
/// Accepts `X.Y.Z`, `X.Y-dev` and pre-releases such as `3.13.0a1` or
/// `3.12.0rc2`.
pub(crate) fn parse_pyenv_folder_version(folder_name: &str) -> Option<String> {
    static RELEASE: OnceLock<Regex> = OnceLock::new();
    static DEV: OnceLock<Regex> = OnceLock::new();
    static PRERELEASE: OnceLock<Regex> = OnceLock::new();

    let patterns = [
        regex(&RELEASE, r"^(\d+\.\d+\.\d+)$"),
        regex(&DEV, r"^(\d+\.\d+-dev)$"),
        regex(&PRERELEASE, r"^(\d+\.\d+\.\d+[a-z]+\d+)"),
    ];
    patterns.iter().find_map(|re| {
        re.captures(folder_name)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Extract a `/<major>.<minor>.<patch>/` directory segment from a path,
/// e.g. Homebrew's `.../Cellar/python@3.11/3.11.4/...`.
pub(crate) fn parse_version_segment(path: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"/(\d+\.\d+\.\d+)/")
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract pyenv's own version from a symlink target such as
/// `/opt/homebrew/Cellar/pyenv/2.4.0/libexec/pyenv`.
pub(crate) fn parse_pyenv_manager_version(link_target: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"pyenv/(\d+\.\d+\.\d+)/")
        .captures(link_target)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
