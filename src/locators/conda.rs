//! Conda installations and their environments.
//!
//! Every installation found is reported as its own manager: the one owning
//! the conda binary on PATH, the well-known install roots, and any
//! `environments.txt` entry that carries an `envs` directory. Each install
//! contributes its base environment and `<root>/envs/*`. Environments living
//! elsewhere (`environments.txt` entries, `~/.conda/envs`, `.condarc`
//! `envs_dirs`) are attached to the install that created them, read from
//! `conda-meta/history`, else to the first install found. A directory is a
//! conda environment when it has a `conda-meta` directory.

use super::Locator;
use crate::detection::{self, fs};
use crate::{
    DiscoveryContext, DiscoveryResult, EnvManager, EnvManagerType, ProbeError, PythonEnv,
    PythonEnvironment, PythonEnvironmentCategory,
};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

const CONDA_META: &str = "conda-meta";

/// Detector for Conda.
#[derive(Debug, Clone, Copy, Default)]
pub struct Conda;

/// A conda environment root and how it should be addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CondaEnv {
    pub(crate) path: PathBuf,
    /// `Some(name)` for environments living directly under a known
    /// environment location; `None` for prefix-addressed environments.
    pub(crate) name: Option<String>,
}

/// One conda installation and the manager record for its binary.
#[derive(Debug, Clone)]
struct CondaInstall {
    root: PathBuf,
    manager: Arc<EnvManager>,
}

fn conda_bin_names() -> &'static [&'static str] {
    if cfg!(windows) {
        &["conda.exe", "conda.bat"]
    } else {
        &["conda"]
    }
}

#[cfg(not(windows))]
fn known_install_roots(ctx: &DiscoveryContext) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = [
        "/opt/anaconda3",
        "/opt/miniconda3",
        "/usr/local/anaconda3",
        "/usr/local/miniconda3",
        "/usr/anaconda3",
        "/usr/miniconda3",
        "/home/anaconda3",
        "/home/miniconda3",
        "/anaconda3",
        "/miniconda3",
        "/miniforge3",
    ]
    .iter()
    .map(PathBuf::from)
    .collect();
    if let Some(home) = ctx.home() {
        for dist in ["anaconda3", "miniconda3", "miniforge3"] {
            roots.push(home.join(dist));
        }
    }
    roots
}

#[cfg(windows)]
fn known_install_roots(ctx: &DiscoveryContext) -> Vec<PathBuf> {
    let mut bases: Vec<PathBuf> = ["USERPROFILE", "PROGRAMDATA", "ALLUSERSPROFILE", "HOMEDRIVE"]
        .iter()
        .filter_map(|var| ctx.var(var))
        .map(PathBuf::from)
        .collect();
    if let Some(home) = ctx.home() {
        bases.push(home.clone());
    }
    let mut roots = Vec::new();
    for base in &bases {
        for dist in ["Anaconda3", "Miniconda3", "miniforge3"] {
            roots.push(base.join(dist));
        }
    }
    roots
}

/// Directories of an install that may hold its conda binary.
fn install_bin_dirs(root: &Path) -> Vec<PathBuf> {
    if cfg!(windows) {
        vec![
            root.join("Scripts"),
            root.join("condabin"),
            root.join("Library").join("bin"),
        ]
    } else {
        vec![root.join("bin"), root.join("condabin")]
    }
}

/// Find the loose conda binary: PATH first, then the global search
/// locations.
pub(crate) async fn find_conda_binary(ctx: &DiscoveryContext) -> Option<PathBuf> {
    if let Some(conda) = detection::find_on_path(ctx, conda_bin_names()).await {
        return Some(conda);
    }
    detection::find_in_dirs(ctx.global_search_locations(), conda_bin_names()).await
}

fn is_python_binary(path: &Path) -> bool {
    matches!(
        path.file_name().and_then(|n| n.to_str()),
        Some("python" | "python.exe")
    )
}

fn is_bin_dir(path: &Path) -> bool {
    matches!(
        path.file_name().and_then(|n| n.to_str()),
        Some("bin" | "Scripts")
    )
}

/// The install root a conda binary belongs to: `<root>/bin/conda`,
/// `<root>/condabin/conda` and `<root>\Library\bin\conda.bat` all map to
/// `<root>`.
fn install_root_of(conda_binary: &Path) -> Option<PathBuf> {
    let mut root = conda_binary.parent()?;
    if is_bin_dir(root) || root.file_name().and_then(|n| n.to_str()) == Some("condabin") {
        root = root.parent()?;
    }
    if root.file_name().and_then(|n| n.to_str()) == Some("Library") {
        root = root.parent()?;
    }
    Some(root.to_path_buf())
}

/// The `conda-meta` directory for any path inside an environment.
///
/// Accepts the environment's interpreter (`<env>/bin/python`), its binary
/// directory (`<env>/bin`) or the environment root itself.
///
/// ```rust
/// use python_locator::locators::conda::conda_meta_path;
/// use std::path::Path;
///
/// assert_eq!(conda_meta_path(Path::new("/env/bin/python")), Path::new("/env/conda-meta"));
/// assert_eq!(conda_meta_path(Path::new("/env/bin")), Path::new("/env/conda-meta"));
/// assert_eq!(conda_meta_path(Path::new("/env")), Path::new("/env/conda-meta"));
/// ```
pub fn conda_meta_path(any_path: &Path) -> PathBuf {
    let root = if is_python_binary(any_path) && any_path.parent().is_some_and(is_bin_dir) {
        any_path.parent().and_then(Path::parent)
    } else if is_bin_dir(any_path) {
        any_path.parent()
    } else {
        None
    };
    root.unwrap_or(any_path).join(CONDA_META)
}

/// Whether `any_path` belongs to a conda environment.
pub(crate) async fn is_conda_environment(any_path: &Path) -> bool {
    fs::is_dir(&conda_meta_path(any_path)).await
}

/// The conda-meta package file for `package`, e.g. `python-3.11.4-h1234.json`.
async fn find_package_json(any_path: &Path, package: &str) -> Result<PathBuf, ProbeError> {
    let prefix = format!("{package}-");
    let mut entries = fs::list_dir(&conda_meta_path(any_path)).await?;
    entries.sort();
    entries
        .into_iter()
        .find(|entry| {
            entry
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix(&prefix))
                // `python-dateutil-...` is not the `python` package.
                .is_some_and(|rest| {
                    rest.starts_with(|c: char| c.is_ascii_digit()) && rest.ends_with(".json")
                })
        })
        .ok_or(ProbeError::NotFound)
}

/// Version of `package` installed in the environment containing `any_path`.
pub(crate) async fn package_version(any_path: &Path, package: &str) -> Option<String> {
    let json = find_package_json(any_path, package).await.ok()?;
    let file_name = json.file_name()?.to_str()?;
    match detection::parse_conda_meta_version(file_name) {
        Ok(version) => Some(version),
        Err(e) => {
            trace!("Ignoring conda package {}: {}", json.display(), e);
            None
        }
    }
}

/// Conda's own version, from the `conda-<v>-<b>.json` package of the
/// installation the binary belongs to.
async fn conda_version(conda_binary: &Path) -> Option<String> {
    let install_root = install_root_of(conda_binary)?;
    if let Some(version) = package_version(&install_root, "conda").await {
        return Some(version);
    }
    package_version(install_root.parent()?, "conda").await
}

/// Environments listed in `~/.conda/environments.txt`, keyed off
/// `USERPROFILE`.
async fn envs_from_environments_txt(ctx: &DiscoveryContext) -> Vec<PathBuf> {
    let Some(profile) = ctx.var("USERPROFILE") else {
        return Vec::new();
    };
    let environments_txt = Path::new(profile).join(".conda").join("environments.txt");
    match fs::read_to_string(&environments_txt).await {
        Ok(contents) => contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect(),
        Err(e) => {
            trace!("No environments.txt at {}: {}", environments_txt.display(), e);
            Vec::new()
        }
    }
}

fn condarc_search_paths(ctx: &DiscoveryContext) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = if cfg!(windows) {
        vec![PathBuf::from(r"C:\ProgramData\conda\.condarc")]
    } else {
        ["/etc/conda/.condarc", "/etc/conda/condarc", "/var/lib/conda/.condarc"]
            .iter()
            .map(PathBuf::from)
            .collect()
    };
    if let Some(conda_root) = ctx.var("CONDA_ROOT") {
        paths.push(Path::new(conda_root).join(".condarc"));
    }
    if let Some(xdg) = ctx.var("XDG_CONFIG_HOME") {
        paths.push(Path::new(xdg).join("conda").join(".condarc"));
    }
    if let Some(home) = ctx.home() {
        paths.push(home.join(".config").join("conda").join(".condarc"));
        paths.push(home.join(".conda").join(".condarc"));
        paths.push(home.join(".condarc"));
    }
    if let Some(prefix) = ctx.var("CONDA_PREFIX") {
        paths.push(Path::new(prefix).join(".condarc"));
    }
    paths
}

/// Entries of the `envs_dirs:` list of a `.condarc` body.
pub(crate) fn parse_condarc_envs_dirs(contents: &str, home: Option<&Path>) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let mut in_envs_dirs = false;
    for line in contents.lines() {
        if !in_envs_dirs {
            in_envs_dirs = line.trim_end() == "envs_dirs:";
            continue;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some(item) = trimmed.strip_prefix('-') else {
            break;
        };
        let item = item.trim().trim_matches(|c| c == '"' || c == '\'');
        let dir = match (item.strip_prefix("~/"), home) {
            (Some(rest), Some(home)) => home.join(rest),
            _ => PathBuf::from(item),
        };
        dirs.push(dir);
    }
    dirs
}

/// Extra environment locations configured through `.condarc`.
async fn condarc_envs_dirs(ctx: &DiscoveryContext) -> Vec<PathBuf> {
    for condarc in condarc_search_paths(ctx) {
        if let Ok(contents) = fs::read_to_string(&condarc).await {
            trace!("Reading envs_dirs from {}", condarc.display());
            return parse_condarc_envs_dirs(&contents, ctx.home().map(PathBuf::as_path));
        }
    }
    Vec::new()
}

async fn has_conda_meta(env_root: &Path) -> bool {
    fs::is_dir(&env_root.join(CONDA_META)).await
}

/// Every conda installation on the machine, deduplicated by root.
///
/// The install owning the loose binary (PATH, global search locations)
/// comes first. Known install roots and `listed_envs` entries that have an
/// `envs` directory follow when a conda binary exists inside them.
async fn find_installs(ctx: &DiscoveryContext, listed_envs: &[PathBuf]) -> Vec<CondaInstall> {
    let mut binaries = Vec::new();
    if let Some(conda) = find_conda_binary(ctx).await {
        binaries.push(conda);
    }

    let mut roots = known_install_roots(ctx);
    for env in listed_envs {
        if fs::is_dir(&env.join("envs")).await {
            roots.push(env.clone());
        }
    }
    let found = join_all(roots.iter().map(|root| async move {
        detection::find_in_dirs(&install_bin_dirs(root), conda_bin_names()).await
    }))
    .await;
    binaries.extend(found.into_iter().flatten());

    let mut owned: Vec<(PathBuf, PathBuf)> = Vec::new();
    for binary in binaries {
        let Some(root) = install_root_of(&binary) else {
            continue;
        };
        if !owned.iter().any(|(seen, _)| *seen == root) {
            owned.push((root, binary));
        }
    }

    join_all(owned.into_iter().map(|(root, binary)| async move {
        let version = conda_version(&binary).await;
        debug!(
            "Found conda {} at {}",
            version.as_deref().unwrap_or("(unknown version)"),
            binary.display()
        );
        CondaInstall {
            root,
            manager: Arc::new(EnvManager::new(binary, version, EnvManagerType::Conda)),
        }
    }))
    .await
}

/// The base environment of an install plus every environment under
/// `<root>/envs`.
async fn install_envs(root: &Path) -> Vec<CondaEnv> {
    let mut envs = Vec::new();
    if has_conda_meta(root).await {
        envs.push(CondaEnv {
            path: root.to_path_buf(),
            name: Some("base".to_string()),
        });
    }
    let envs_dir = root.join("envs");
    if let Ok(mut subdirs) = fs::list_subdirs(&envs_dir).await {
        subdirs.sort();
        for dir in subdirs {
            if has_conda_meta(&dir).await {
                let name = classify_env(&dir, std::slice::from_ref(&envs_dir));
                envs.push(CondaEnv { path: dir, name });
            }
        }
    }
    envs
}

/// Name of an environment relative to the most specific known location
/// containing it; `base` for a location itself.
pub(crate) fn classify_env(path: &Path, locations: &[PathBuf]) -> Option<String> {
    locations
        .iter()
        .filter_map(|location| path.strip_prefix(location).ok())
        .min_by_key(|relative| relative.components().count())
        .map(|relative| {
            let name = relative.to_string_lossy();
            if name.is_empty() {
                "base".to_string()
            } else {
                name.into_owned()
            }
        })
}

/// Environments outside any install directory: `listed` paths plus the
/// subdirectories of `locations`. Paths without a `conda-meta` directory
/// are dropped, so stale `environments.txt` lines never surface.
pub(crate) async fn distinct_envs(listed: Vec<PathBuf>, locations: &[PathBuf]) -> Vec<CondaEnv> {
    let mut paths = listed;
    for location in locations {
        if let Ok(subdirs) = fs::list_subdirs(location).await {
            paths.extend(subdirs);
        }
    }
    let live = join_all(paths.into_iter().map(|path| async move {
        if has_conda_meta(&path).await {
            Some(path)
        } else {
            trace!("Skipping {}: no {}", path.display(), CONDA_META);
            None
        }
    }))
    .await;

    let mut paths: Vec<PathBuf> = live.into_iter().flatten().collect();
    paths.sort();
    paths.dedup();

    paths
        .into_iter()
        .map(|path| {
            let name = classify_env(&path, locations);
            CondaEnv { path, name }
        })
        .collect()
}

/// The install root recorded by the `create` command in a
/// `conda-meta/history` body.
///
/// `# cmd: /opt/conda/bin/conda create -n web python=3.12` yields
/// `/opt/conda`. A bare `conda` command names no install.
pub(crate) fn parse_history_creator(contents: &str) -> Option<PathBuf> {
    const CMD: &str = "# cmd:";
    const CREATE: &str = " create -";
    let (line, end) = contents.lines().map(str::trim).find_map(|line| {
        let lower = line.to_ascii_lowercase();
        if !lower.starts_with(CMD) {
            return None;
        }
        lower.find(CREATE).map(|end| (line, end))
    })?;
    let command = Path::new(line.get(CMD.len()..end)?.trim());
    let bin_dir = command.parent()?;
    let dir_name = bin_dir.file_name()?.to_str()?.to_ascii_lowercase();
    if matches!(dir_name.as_str(), "bin" | "scripts" | "condabin") {
        bin_dir.parent().map(Path::to_path_buf)
    } else {
        Some(bin_dir.to_path_buf())
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    if cfg!(windows) {
        a.to_string_lossy().eq_ignore_ascii_case(&b.to_string_lossy())
    } else {
        a == b
    }
}

/// The install whose binary created the environment at `env_root`.
async fn creating_install<'a>(
    env_root: &Path,
    installs: &'a [CondaInstall],
) -> Option<&'a CondaInstall> {
    let history = fs::read_to_string(&env_root.join(CONDA_META).join("history"))
        .await
        .ok()?;
    let creator = parse_history_creator(&history)?;
    installs.iter().find(|install| same_path(&install.root, &creator))
}

fn run_command(conda_binary: &Path, env: &CondaEnv) -> Vec<String> {
    let conda = conda_binary.to_string_lossy().into_owned();
    match &env.name {
        Some(name) => vec![conda, "run".into(), "-n".into(), name.clone(), "python".into()],
        None => vec![
            conda,
            "run".into(),
            "-p".into(),
            env.path.to_string_lossy().into_owned(),
            "python".into(),
        ],
    }
}

async fn conda_environment(env: &CondaEnv, manager: &Arc<EnvManager>) -> PythonEnvironment {
    let (executable, version) = futures::join!(
        detection::find_python_binary(&env.path),
        package_version(&env.path, "python")
    );
    let mut environment = PythonEnvironment::new(PythonEnvironmentCategory::Conda)
        .with_env_root(&env.path)
        .with_version(version)
        .with_manager(manager.clone())
        .with_run_command(run_command(&manager.executable_path, env));
    if let Some(executable) = executable {
        environment = environment.with_executable(&executable);
    }
    if let Some(name) = &env.name {
        environment = environment.with_name(name.clone());
    }
    environment
}

impl Locator for Conda {
    fn name(&self) -> &'static str {
        "conda"
    }

    /// Classify an interpreter that lives in a conda environment. The
    /// environment is addressed by prefix since no binary is consulted.
    async fn resolve(&self, _ctx: &DiscoveryContext, env: &PythonEnv) -> Option<PythonEnvironment> {
        let env_root = env.env_root.clone().or_else(|| {
            let meta = conda_meta_path(&env.executable);
            meta.parent().map(Path::to_path_buf)
        })?;
        if !is_conda_environment(&env_root).await {
            return None;
        }
        let version = match &env.version {
            Some(v) => Some(v.clone()),
            None => package_version(&env_root, "python").await,
        };
        Some(
            PythonEnvironment::for_executable(PythonEnvironmentCategory::Conda, &env.executable)
                .with_env_root(&env_root)
                .with_version(version),
        )
    }

    async fn find(&self, ctx: &DiscoveryContext) -> Option<DiscoveryResult> {
        let (listed, condarc_dirs) =
            futures::join!(envs_from_environments_txt(ctx), condarc_envs_dirs(ctx));
        let installs = find_installs(ctx, &listed).await;
        let primary = installs.first()?;

        let mut shared_locations = Vec::new();
        if let Some(home) = ctx.home() {
            shared_locations.push(home.join(".conda").join("envs"));
        }
        shared_locations.extend(condarc_dirs);
        shared_locations.dedup();

        let (per_install, shared) = futures::join!(
            join_all(installs.iter().map(|install| install_envs(&install.root))),
            distinct_envs(listed, &shared_locations)
        );

        let mut assigned: Vec<(CondaEnv, Arc<EnvManager>)> = Vec::new();
        for (install, envs) in installs.iter().zip(per_install) {
            for env in envs {
                assigned.push((env, install.manager.clone()));
            }
        }
        for env in shared {
            if assigned.iter().any(|(known, _)| known.path == env.path) {
                continue;
            }
            let install = match creating_install(&env.path, &installs).await {
                Some(install) => install,
                None => {
                    debug!(
                        "No creating install recorded for {}; using {}",
                        env.path.display(),
                        primary.root.display()
                    );
                    primary
                }
            };
            assigned.push((env, install.manager.clone()));
        }

        let managers: Vec<Arc<EnvManager>> =
            installs.iter().map(|install| install.manager.clone()).collect();
        let environments = join_all(
            assigned
                .iter()
                .map(|(env, manager)| conda_environment(env, manager)),
        )
        .await;
        debug!(
            "Found {} conda installs, {} environments",
            managers.len(),
            environments.len()
        );
        Some(DiscoveryResult {
            managers,
            environments,
        })
    }
}
