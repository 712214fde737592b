//! `pyvenv.cfg` discovery and parsing.

use super::fs;
use super::parser::regex;
use crate::ProbeError;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const PYVENV_CONFIG_FILE: &str = "pyvenv.cfg";

/// The parts of a `pyvenv.cfg` the locator cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PyVenvCfg {
    pub(crate) version: String,
}

/// Locate the `pyvenv.cfg` belonging to an interpreter.
///
/// ```text
/// env
/// |__ pyvenv.cfg      <- second
/// |__ bin
///     |__ pyvenv.cfg  <- first
///     |__ python
/// ```
///
/// # Arguments
///
/// * `executable` - Path to the interpreter, usually `<env>/bin/python`
///
/// # Returns
///
/// The path of the first `pyvenv.cfg` found, or `Err(ProbeError::NotFound)`
/// when neither location has one.
pub(crate) async fn find_pyvenv_cfg(executable: &Path) -> Result<PathBuf, ProbeError> {
    let bin_dir = executable.parent().ok_or(ProbeError::NotFound)?;
    let cfg = bin_dir.join(PYVENV_CONFIG_FILE);
    if fs::exists(&cfg).await {
        return Ok(cfg);
    }

    let env_dir = bin_dir.parent().ok_or(ProbeError::NotFound)?;
    let cfg = env_dir.join(PYVENV_CONFIG_FILE);
    if fs::exists(&cfg).await {
        return Ok(cfg);
    }

    Err(ProbeError::NotFound)
}

/// Find and parse the `pyvenv.cfg` belonging to an interpreter.
///
/// # Returns
///
/// `Err(ProbeError::NotFound)` when there is no file and
/// `Err(ProbeError::Malformed)` when it carries no version line.
pub(crate) async fn find_and_parse_pyvenv_cfg(executable: &Path) -> Result<PyVenvCfg, ProbeError> {
    let cfg = find_pyvenv_cfg(executable).await?;
    let contents = fs::read_to_string(&cfg).await?;
    parse_pyvenv_cfg(&contents)
        .ok_or_else(|| ProbeError::Malformed(cfg.to_string_lossy().into_owned()))
}

/// The shared version probe: the version recorded in the interpreter's
/// `pyvenv.cfg`, if any. Plain system installs have none.
pub(crate) async fn probe_version(executable: &Path) -> Option<String> {
    find_and_parse_pyvenv_cfg(executable)
        .await
        .map(|cfg| cfg.version)
        .ok()
}

/// Parse `version = X.Y.Z` (venv) or `version_info = X.Y.Z...` (virtualenv,
/// uv) out of a `pyvenv.cfg` body.
///
/// # Arguments
///
/// * `contents` - The full text of a `pyvenv.cfg` file
///
/// # Returns
///
/// The first version found, or `None` if no line matches either key.
pub(crate) fn parse_pyvenv_cfg(contents: &str) -> Option<PyVenvCfg> {
    static VERSION: OnceLock<Regex> = OnceLock::new();
    static VERSION_INFO: OnceLock<Regex> = OnceLock::new();
    let version = regex(&VERSION, r"^version\s*=\s*(\d+\.\d+\.\d+)$");
    let version_info = regex(&VERSION_INFO, r"^version_info\s*=\s*(\d+\.\d+\.\d+.*)$");

    contents
        .lines()
        .map(str::trim)
        .filter(|line| line.contains("version"))
        .find_map(|line| {
            version
                .captures(line)
                .or_else(|| version_info.captures(line))
                .and_then(|caps| caps.get(1))
                .map(|m| PyVenvCfg {
                    version: m.as_str().to_string(),
                })
        })
}
