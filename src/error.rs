//! Error types.
//!
//! Two families exist. [`ProbeError`] is the typed "absent" outcome of a
//! single filesystem probe; detectors turn it into "not found" and carry on.
//! [`LocatorError`] is a protocol-level fault raised while emitting frames
//! and is the only error that reaches the caller of the binary.

use std::io;
use thiserror::Error;

/// Why a single probe produced nothing.
///
/// None of these abort a discovery run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ProbeError {
    /// The probed path or marker does not exist.
    #[error("not found")]
    NotFound,

    /// Permission denied reading the probed location.
    #[error("permission denied")]
    PermissionDenied,

    /// Metadata exists but does not have the expected shape.
    #[error("malformed metadata: {0}")]
    Malformed(String),

    /// Any other I/O failure.
    #[error("i/o error: {0}")]
    Io(String),
}

impl From<io::Error> for ProbeError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::Io(e.to_string()),
        }
    }
}

/// Faults raised while writing or reading the framed output stream.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LocatorError {
    /// A notification could not be serialized.
    #[error("failed to serialize notification: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Writing to or reading from the stream failed.
    #[error("i/o error on message stream: {0}")]
    Io(#[from] io::Error),

    /// An environment reached the dispatcher with neither an executable nor
    /// an environment root.
    #[error("environment has neither an executable path nor an environment root")]
    MissingEnvironmentKey,

    /// A frame header could not be parsed.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}
