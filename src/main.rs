//! python-locator CLI entry point.
//!
//! Writes framed JSON-RPC notifications to stdout and logs to stderr.

use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use python_locator::messaging::JsonRpcDispatcher;
use python_locator::{
    discover, resolve_interpreters, DiscoveryContext, DiscoveryOptions, LocatorError,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Discover Python interpreters and environments on this machine.
#[derive(Debug, Parser)]
#[command(name = "python-locator")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Per-detector timeout in milliseconds
    #[arg(long, env = "PYTHON_LOCATOR_TIMEOUT_MS", default_value_t = 10_000)]
    timeout_ms: u64,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Only resolve and report these interpreters (path or command name)
    #[arg(long, value_name = "PATH")]
    resolve: Vec<PathBuf>,
}

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--verbose` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is WARN
///
/// Output goes to stderr; stdout is reserved for frames.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("python_locator=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("python_locator=warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<(), LocatorError> {
    let ctx = DiscoveryContext::from_process();
    let options = DiscoveryOptions::with_timeout(Duration::from_millis(cli.timeout_ms));

    let result = if cli.resolve.is_empty() {
        discover(&ctx, &options).await
    } else {
        resolve_interpreters(&ctx, &cli.resolve).await
    };

    let stdout = io::stdout();
    let mut dispatcher = JsonRpcDispatcher::new(BufWriter::new(stdout.lock()));
    dispatcher.report(&result)?;
    dispatcher.exit()
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    tracing::debug!("python-locator starting with args: {:?}", cli);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
