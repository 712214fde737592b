//! The explicit run context threaded through every detector.
//!
//! Detectors never read process environment variables directly. They ask
//! the [`DiscoveryContext`], which holds a snapshot taken at the start of a
//! run, the user's home directory, the known global search locations, and
//! the run's dedup [`Ledger`]. Nothing here outlives the run.

use crate::Ledger;
use std::collections::HashMap;
use std::path::PathBuf;

/// Environment variables consumed by the detectors.
const SNAPSHOT_VARS: &[&str] = &[
    "PATH",
    "WORKON_HOME",
    "PYENV_ROOT",
    "PYENV",
    "HOMEBREW_PREFIX",
    "USERPROFILE",
    "HOME",
    "CONDA_ROOT",
    "CONDA_PREFIX",
    "XDG_CONFIG_HOME",
    "PROGRAMDATA",
    "ALLUSERSPROFILE",
    "HOMEDRIVE",
];

/// Directories where manager binaries commonly live outside PATH.
#[cfg(unix)]
const KNOWN_GLOBAL_SEARCH_LOCATIONS: &[&str] = &[
    "/usr/bin",
    "/usr/local/bin",
    "/bin",
    "/home/bin",
    "/sbin",
    "/usr/sbin",
    "/usr/local/sbin",
    "/home/sbin",
    "/opt",
    "/opt/bin",
    "/opt/sbin",
    "/opt/homebrew/bin",
];

#[cfg(not(unix))]
const KNOWN_GLOBAL_SEARCH_LOCATIONS: &[&str] = &[];

/// Per-run discovery context.
///
/// # Example
///
/// ```rust
/// use python_locator::DiscoveryContext;
///
/// let ctx = DiscoveryContext::new()
///     .with_var("PYENV_ROOT", "/tmp/pyenv")
///     .with_home("/tmp/home");
/// assert_eq!(ctx.var("PYENV_ROOT"), Some("/tmp/pyenv"));
/// assert!(ctx.var("WORKON_HOME").is_none());
/// ```
#[derive(Debug, Default)]
pub struct DiscoveryContext {
    vars: HashMap<String, String>,
    home: Option<PathBuf>,
    global_search_locations: Vec<PathBuf>,
    ledger: Ledger,
}

impl DiscoveryContext {
    /// An empty context: no variables, no home, no global locations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current process environment.
    pub fn from_process() -> Self {
        let vars: HashMap<String, String> = SNAPSHOT_VARS
            .iter()
            .filter_map(|key| {
                std::env::var(key)
                    .ok()
                    .filter(|v| !v.is_empty())
                    .map(|v| (key.to_string(), v))
            })
            .collect();

        let home_var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
        let home = vars.get(home_var).map(PathBuf::from);

        Self {
            vars,
            home,
            global_search_locations: KNOWN_GLOBAL_SEARCH_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .collect(),
            ledger: Ledger::new(),
        }
    }

    /// Set a variable in the snapshot.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Set the user's home directory.
    #[must_use]
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Replace the known global search locations.
    #[must_use]
    pub fn with_global_search_locations(mut self, locations: Vec<PathBuf>) -> Self {
        self.global_search_locations = locations;
        self
    }

    /// Value of a snapshotted variable. Empty values count as unset.
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// The user's home directory.
    pub fn home(&self) -> Option<&PathBuf> {
        self.home.as_ref()
    }

    /// Directories where manager binaries may live outside PATH.
    pub fn global_search_locations(&self) -> &[PathBuf] {
        &self.global_search_locations
    }

    /// Entries of the snapshotted `PATH`, split on the platform delimiter.
    pub fn path_entries(&self) -> Vec<PathBuf> {
        match self.var("PATH") {
            Some(path) => std::env::split_paths(path)
                .filter(|p| !p.as_os_str().is_empty())
                .collect(),
            None => Vec::new(),
        }
    }

    /// The run's dedup ledger.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}
