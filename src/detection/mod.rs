//! Probe primitives shared by every detector.
//!
//! - `fs`: async existence checks, directory listing, symlink resolution
//! - `parser`: regex-based version extraction
//! - `pyvenv`: `pyvenv.cfg` discovery and parsing
//! - `interpreter`: finding the interpreter inside an environment
//! - `path_finder`: PATH and fallback-location binary lookup

pub(crate) mod fs;
mod interpreter;
mod parser;
mod path_finder;
mod pyvenv;

pub(crate) use interpreter::{find_python_binary, list_python_environments, python_binary_name};
pub(crate) use parser::{
    parse_conda_meta_version, parse_pyenv_folder_version, parse_pyenv_manager_version,
    parse_version_segment,
};
pub(crate) use path_finder::{find_in_dirs, find_on_path, resolve_command};
pub(crate) use pyvenv::{find_and_parse_pyvenv_cfg, probe_version};
