//! # python-locator
//!
//! Discovery of Python interpreters and environments (system PATH, Conda,
//! Pyenv, Homebrew, venv, virtualenv, virtualenvwrapper, Pipenv).
//!
//! A discovery run scans the machine, normalizes what it finds into
//! [`PythonEnvironment`] records, drops duplicates, and hands the result to
//! a [`messaging::JsonRpcDispatcher`] that writes framed JSON-RPC
//! notifications.
//!
//! ## Features
//!
//! - `PythonEnvironmentCategory` / `EnvManagerType` closed enums
//! - `locators` with one detector per environment manager
//! - `discover()` async function running every detector concurrently
//! - `resolve_interpreter()` for classifying a single interpreter path
//!
//! ## Example
//!
//! ```rust,no_run
//! use python_locator::messaging::JsonRpcDispatcher;
//! use python_locator::{discover, DiscoveryContext, DiscoveryOptions};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), python_locator::LocatorError> {
//!     let ctx = DiscoveryContext::from_process();
//!     let result = discover(&ctx, &DiscoveryOptions::default()).await;
//!
//!     let mut dispatcher = JsonRpcDispatcher::new(std::io::stdout());
//!     dispatcher.report(&result)?;
//!     dispatcher.exit()
//! }
//! ```

mod category;
mod context;
mod detection;
mod discover;
mod environment;
mod error;
mod ledger;
pub mod locators;
pub mod messaging;
mod options;

pub use category::{EnvManagerType, PythonEnvironmentCategory};
pub use context::DiscoveryContext;
pub use discover::{discover, resolve_interpreter, resolve_interpreters};
pub use environment::{DiscoveryResult, EnvManager, PythonEnv, PythonEnvironment};
pub use error::{LocatorError, ProbeError};
pub use ledger::Ledger;
pub use options::DiscoveryOptions;
