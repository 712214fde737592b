//! Discovery orchestration.

use crate::detection::{self, fs};
use crate::locators::global_virtualenvs::list_global_virtualenvs;
use crate::locators::{resolve_with_chain, Conda, Homebrew, Locator, Pyenv, System};
use crate::{DiscoveryContext, DiscoveryOptions, DiscoveryResult, PythonEnv, PythonEnvironment};
use futures::future::join_all;
use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Await `future` for at most `timeout`. Expiry counts as "not found".
async fn within<T>(label: &str, timeout: Duration, future: impl Future<Output = Option<T>>) -> Option<T> {
    match tokio::time::timeout(timeout, future).await {
        Ok(found) => found,
        Err(_) => {
            warn!("{} did not finish within {:?}; treating as not found", label, timeout);
            None
        }
    }
}

async fn run_find<L: Locator>(locator: &L, ctx: &DiscoveryContext, timeout: Duration) -> Option<DiscoveryResult> {
    let found = within(locator.name(), timeout, locator.find(ctx)).await;
    if let Some(found) = &found {
        debug!(
            "{}: {} managers, {} environments",
            locator.name(),
            found.managers.len(),
            found.environments.len()
        );
    }
    found
}

/// Fold one detector's result into the run's result, seeding the ledger.
fn merge(ctx: &DiscoveryContext, result: &mut DiscoveryResult, found: DiscoveryResult) {
    for manager in found.managers {
        if !result.managers.iter().any(|m| m.key() == manager.key()) {
            result.managers.push(manager);
        }
    }
    for env in found.environments {
        let Some(key) = env.key() else {
            warn!("Dropping {:?} environment without executable or root", env.category);
            continue;
        };
        if ctx.ledger().insert(key) {
            result.environments.push(env);
        }
    }
}

async fn resolve_candidate(
    ctx: &DiscoveryContext,
    candidate: &PythonEnv,
    timeout: Duration,
) -> Option<PythonEnvironment> {
    if ctx.ledger().contains(&candidate.key()) {
        return None;
    }
    let label = format!("resolving {}", candidate.executable.display());
    let resolved = within(&label, timeout, resolve_with_chain(ctx, candidate)).await?;
    // Lookup and insert are one step on the ledger; a concurrent candidate
    // that resolved to the same key loses here.
    let key = resolved.key()?;
    ctx.ledger().insert(key).then_some(resolved)
}

/// Run a full discovery pass.
///
/// The System, Homebrew, Conda and Pyenv detectors run concurrently and
/// seed the context's ledger. When two of them report the same interpreter
/// the first in Conda, Pyenv, Homebrew, System order keeps it. Global
/// virtualenv candidates are then resolved concurrently through the
/// resolver chain, skipping anything the ledger already holds.
///
/// No error is possible: a run that finds nothing returns an empty result.
///
/// # Example
///
/// ```rust,no_run
/// use python_locator::{discover, DiscoveryContext, DiscoveryOptions};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let ctx = DiscoveryContext::from_process();
///     let result = discover(&ctx, &DiscoveryOptions::default()).await;
///     for env in &result.environments {
///         println!("{:?} {:?}", env.category, env.executable_path);
///     }
/// }
/// ```
pub async fn discover(ctx: &DiscoveryContext, options: &DiscoveryOptions) -> DiscoveryResult {
    let timeout = options.timeout;
    let (system, homebrew, conda, pyenv) = futures::join!(
        run_find(&System, ctx, timeout),
        run_find(&Homebrew, ctx, timeout),
        run_find(&Conda, ctx, timeout),
        run_find(&Pyenv, ctx, timeout),
    );

    // Manager-backed detectors merge first so an interpreter they share with
    // PATH keeps its more specific category.
    let mut result = DiscoveryResult::default();
    for found in [conda, pyenv, homebrew, system].into_iter().flatten() {
        merge(ctx, &mut result, found);
    }

    let candidates = within("global virtualenv scan", timeout, async {
        Some(list_global_virtualenvs(ctx).await)
    })
    .await
    .unwrap_or_default();

    let resolved = join_all(
        candidates
            .iter()
            .map(|candidate| resolve_candidate(ctx, candidate, timeout)),
    )
    .await;
    result.environments.extend(resolved.into_iter().flatten());

    debug!(
        "Discovery finished: {} managers, {} environments",
        result.managers.len(),
        result.environments.len()
    );
    result
}

/// The environment directory implied by an interpreter path: the parent of
/// `bin`/`Scripts`, else the interpreter's own directory.
fn environment_root(executable: &Path) -> Option<PathBuf> {
    let dir = executable.parent()?;
    match dir.file_name().and_then(|n| n.to_str()) {
        Some("bin") | Some("Scripts") => dir.parent().map(Path::to_path_buf),
        _ => Some(dir.to_path_buf()),
    }
}

/// Classify a single host-supplied interpreter.
///
/// `path` may be absolute, relative, or a bare command name looked up on the
/// context's PATH. Conda is tried first, then the resolver chain, then the
/// System detector. Returns `None` if the interpreter does not exist or no
/// detector claims it.
pub async fn resolve_interpreter(ctx: &DiscoveryContext, path: &Path) -> Option<PythonEnvironment> {
    let executable = detection::resolve_command(ctx, path)?;
    if !fs::exists(&executable).await {
        debug!("Interpreter {} does not exist", executable.display());
        return None;
    }
    let env_root = environment_root(&executable);
    let version = detection::probe_version(&executable).await;
    let candidate = PythonEnv::new(executable, env_root, version);

    if let Some(env) = Conda.resolve(ctx, &candidate).await {
        return Some(env);
    }
    if let Some(env) = resolve_with_chain(ctx, &candidate).await {
        return Some(env);
    }
    System.resolve(ctx, &candidate).await
}

/// Resolve several host-supplied interpreters, dropping duplicates and
/// anything no detector claims.
pub async fn resolve_interpreters(ctx: &DiscoveryContext, paths: &[PathBuf]) -> DiscoveryResult {
    let resolved = join_all(paths.iter().map(|p| resolve_interpreter(ctx, p))).await;
    let mut seen = HashSet::new();
    let environments = resolved
        .into_iter()
        .flatten()
        .filter(|env| env.key().is_some_and(|k| seen.insert(k)))
        .collect();
    DiscoveryResult::environments(environments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PythonEnvironmentCategory;
    use tempfile::tempdir;

    fn hermetic(home: &Path) -> DiscoveryContext {
        DiscoveryContext::new().with_home(home)
    }

    fn make_venv(root: &Path) -> PathBuf {
        let bin = root.join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join("python"), "").unwrap();
        std::fs::write(root.join("pyvenv.cfg"), "version = 3.11.4\n").unwrap();
        bin.join("python")
    }

    #[test]
    fn test_environment_root() {
        assert_eq!(
            environment_root(Path::new("/envs/a/bin/python")),
            Some(PathBuf::from("/envs/a"))
        );
        assert_eq!(
            environment_root(Path::new("/envs/a/Scripts/python.exe")),
            Some(PathBuf::from("/envs/a"))
        );
        assert_eq!(
            environment_root(Path::new("/envs/a/python")),
            Some(PathBuf::from("/envs/a"))
        );
    }

    #[tokio::test]
    async fn test_discover_empty_context() {
        let home = tempdir().unwrap();
        let result = discover(&hermetic(home.path()), &DiscoveryOptions::default()).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_discover_global_venv() {
        let home = tempdir().unwrap();
        make_venv(&home.path().join(".venvs").join("proj"));

        let ctx = hermetic(home.path());
        let result = discover(&ctx, &DiscoveryOptions::default()).await;

        assert_eq!(result.environments.len(), 1);
        let env = &result.environments[0];
        assert_eq!(env.category, PythonEnvironmentCategory::Venv);
        assert_eq!(env.name.as_deref(), Some("proj"));
        assert_eq!(env.version.as_deref(), Some("3.11.4"));
        assert_eq!(ctx.ledger().len(), 1);
    }

    #[tokio::test]
    async fn test_ledger_skips_known_candidates() {
        let home = tempdir().unwrap();
        make_venv(&home.path().join(".venvs").join("proj"));
        let ctx = hermetic(home.path());

        let candidates = list_global_virtualenvs(&ctx).await;
        assert_eq!(candidates.len(), 1);
        ctx.ledger().insert(candidates[0].key());

        let result = discover(&ctx, &DiscoveryOptions::default()).await;
        assert!(result.environments.is_empty());
    }

    #[tokio::test]
    async fn test_merge_dedups_by_key() {
        let ctx = DiscoveryContext::new();
        let env = PythonEnvironment::for_executable(
            PythonEnvironmentCategory::System,
            Path::new("/usr/bin/python"),
        );
        let mut result = DiscoveryResult::default();
        merge(&ctx, &mut result, DiscoveryResult::environments(vec![env.clone()]));
        merge(&ctx, &mut result, DiscoveryResult::environments(vec![env]));
        merge(
            &ctx,
            &mut result,
            DiscoveryResult::environments(vec![PythonEnvironment::new(
                PythonEnvironmentCategory::Conda,
            )]),
        );
        assert_eq!(result.environments.len(), 1);
    }

    #[tokio::test]
    async fn test_within_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Some(())
        };
        assert!(within("slow", Duration::from_millis(10), slow).await.is_none());
        assert_eq!(within("fast", Duration::from_secs(1), async { Some(1) }).await, Some(1));
    }

    #[tokio::test]
    async fn test_resolve_interpreter_venv() {
        let dir = tempdir().unwrap();
        let exe = make_venv(&dir.path().join("proj"));

        let env = resolve_interpreter(&DiscoveryContext::new(), &exe).await.unwrap();
        assert_eq!(env.category, PythonEnvironmentCategory::Venv);
        assert_eq!(env.env_root, Some(dir.path().join("proj")));
    }

    #[tokio::test]
    async fn test_resolve_interpreter_conda_first() {
        let dir = tempdir().unwrap();
        let exe = make_venv(dir.path());
        std::fs::create_dir(dir.path().join("conda-meta")).unwrap();

        let env = resolve_interpreter(&DiscoveryContext::new(), &exe).await.unwrap();
        assert_eq!(env.category, PythonEnvironmentCategory::Conda);
    }

    #[tokio::test]
    async fn test_resolve_interpreter_system_fallback() {
        let dir = tempdir().unwrap();
        let exe = dir.path().join(detection::python_binary_name());
        std::fs::write(&exe, "").unwrap();

        let env = resolve_interpreter(&DiscoveryContext::new(), &exe).await.unwrap();
        assert_eq!(env.category, PythonEnvironmentCategory::System);
    }

    #[tokio::test]
    async fn test_resolve_interpreter_missing() {
        let dir = tempdir().unwrap();
        let exe = dir.path().join("bin").join("python");
        assert!(resolve_interpreter(&DiscoveryContext::new(), &exe).await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_interpreters_dedups() {
        let dir = tempdir().unwrap();
        let exe = make_venv(&dir.path().join("proj"));
        let result = resolve_interpreters(&DiscoveryContext::new(), &[exe.clone(), exe]).await;
        assert_eq!(result.environments.len(), 1);
    }
}
