//! Category enums classifying discovered environments and managers.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

/// The kind of Python environment that was discovered.
///
/// Every reported [`PythonEnvironment`](crate::PythonEnvironment) carries
/// exactly one category. The set is closed: each variant maps to one
/// detector in [`crate::locators`].
///
/// Categories serialize in camelCase (`"pyenvVirtualEnv"`,
/// `"virtualEnvWrapper"`, ...) which is the form consumers of the wire
/// protocol expect.
///
/// # Example
///
/// ```rust
/// use python_locator::PythonEnvironmentCategory;
///
/// for category in PythonEnvironmentCategory::all() {
///     println!("{}", category.display_name());
/// }
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter,
)]
#[serde(rename_all = "camelCase")]
pub enum PythonEnvironmentCategory {
    /// An interpreter found on the system PATH.
    System,
    /// An interpreter installed by Homebrew.
    Homebrew,
    /// A Conda environment (base or named or prefix-based).
    Conda,
    /// A plain CPython build installed by pyenv.
    Pyenv,
    /// A virtual environment created through pyenv-virtualenv.
    PyenvVirtualEnv,
    /// A Pipenv environment tied to a project directory.
    Pipenv,
    /// An environment living under virtualenvwrapper's `WORKON_HOME`.
    VirtualEnvWrapper,
    /// A `python -m venv` environment (has `pyvenv.cfg`).
    Venv,
    /// A `virtualenv` environment (has activate scripts).
    VirtualEnv,
}

impl PythonEnvironmentCategory {
    /// Human-readable name, suitable for logs.
    ///
    /// ```rust
    /// use python_locator::PythonEnvironmentCategory;
    ///
    /// assert_eq!(PythonEnvironmentCategory::PyenvVirtualEnv.display_name(), "Pyenv virtualenv");
    /// ```
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::System => "System",
            Self::Homebrew => "Homebrew",
            Self::Conda => "Conda",
            Self::Pyenv => "Pyenv",
            Self::PyenvVirtualEnv => "Pyenv virtualenv",
            Self::Pipenv => "Pipenv",
            Self::VirtualEnvWrapper => "virtualenvwrapper",
            Self::Venv => "venv",
            Self::VirtualEnv => "virtualenv",
        }
    }

    /// Iterator over every category.
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as IntoEnumIterator>::iter()
    }
}

/// The tool behind an [`EnvManager`](crate::EnvManager).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter,
)]
#[serde(rename_all = "camelCase")]
pub enum EnvManagerType {
    /// The `conda` binary.
    Conda,
    /// The `pyenv` binary.
    Pyenv,
}

impl EnvManagerType {
    /// The executable name the tool is usually invoked as.
    pub fn executable_name(&self) -> &'static str {
        match self {
            Self::Conda => "conda",
            Self::Pyenv => "pyenv",
        }
    }

    /// Iterator over every manager type.
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as IntoEnumIterator>::iter()
    }
}
