//! JSON-RPC notifications over length-prefixed frames.
//!
//! Each frame is a header block followed by exactly `Content-Length` bytes
//! of UTF-8 JSON:
//!
//! ```text
//! Content-Length: 52\r\n
//! Content-Type: application/vscode-jsonrpc; charset=utf-8\r\n
//! \r\n
//! {"jsonrpc":"2.0","method":"pythonEnvironment",...}
//! ```
//!
//! The length counts bytes, not characters.

use crate::{DiscoveryResult, EnvManager, LocatorError, PythonEnvironment};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{BufRead, Read, Write};
use tracing::trace;

/// JSON-RPC protocol version carried by every notification.
pub const JSONRPC_VERSION: &str = "2.0";

/// Notification announcing an environment manager.
pub const ENV_MANAGER_METHOD: &str = "envManager";

/// Notification announcing a resolved environment.
pub const PYTHON_ENVIRONMENT_METHOD: &str = "pythonEnvironment";

/// Terminal notification of a run. Carries no params.
pub const EXIT_METHOD: &str = "exit";

const CONTENT_TYPE: &str = "application/vscode-jsonrpc; charset=utf-8";

/// Largest body `read_frame` accepts.
pub const MAX_FRAME_LENGTH: usize = 64 * 1024 * 1024;

/// A JSON-RPC 2.0 notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification<T> {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<T>,
}

impl<T> Notification<T> {
    pub fn new(method: impl Into<String>, params: Option<T>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

/// Serialize a notification into one complete frame.
pub fn encode_frame<T: Serialize>(notification: &Notification<T>) -> Result<Vec<u8>, LocatorError> {
    let body = serde_json::to_vec(notification)?;
    let mut frame = format!(
        "Content-Length: {}\r\nContent-Type: {}\r\n\r\n",
        body.len(),
        CONTENT_TYPE
    )
    .into_bytes();
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Write one notification frame and flush it.
pub fn write_frame<W: Write, T: Serialize>(
    writer: &mut W,
    method: &str,
    params: Option<&T>,
) -> Result<(), LocatorError> {
    let frame = encode_frame(&Notification::new(method, params))?;
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

/// Read the next frame from `reader`.
///
/// Returns `Ok(None)` on a clean end of stream between frames. Header names
/// are matched case-insensitively; headers other than `Content-Length` are
/// ignored. A `Content-Length` above [`MAX_FRAME_LENGTH`] or a body shorter
/// than declared is a [`LocatorError::InvalidFrame`].
pub fn read_frame<R: BufRead>(
    reader: &mut R,
) -> Result<Option<Notification<serde_json::Value>>, LocatorError> {
    let mut content_length: Option<usize> = None;
    let mut in_header = false;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            if in_header {
                return Err(LocatorError::InvalidFrame(
                    "stream ended inside a header block".into(),
                ));
            }
            return Ok(None);
        }

        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            if in_header {
                break;
            }
            continue;
        }
        in_header = true;

        let Some((name, value)) = line.split_once(':') else {
            return Err(LocatorError::InvalidFrame(format!("malformed header line: {line}")));
        };
        if name.trim().eq_ignore_ascii_case("Content-Length") {
            let length = value.trim().parse().map_err(|_| {
                LocatorError::InvalidFrame(format!("bad Content-Length: {}", value.trim()))
            })?;
            content_length = Some(length);
        }
    }

    let length = content_length
        .ok_or_else(|| LocatorError::InvalidFrame("missing Content-Length".into()))?;
    if length > MAX_FRAME_LENGTH {
        return Err(LocatorError::InvalidFrame(format!(
            "Content-Length {length} exceeds {MAX_FRAME_LENGTH}"
        )));
    }
    let mut body = Vec::new();
    reader.by_ref().take(length as u64).read_to_end(&mut body)?;
    if body.len() != length {
        return Err(LocatorError::InvalidFrame(format!(
            "body truncated: {} of {length} bytes",
            body.len()
        )));
    }
    Ok(Some(serde_json::from_slice(&body)?))
}

/// Emits managers and environments as notification frames, each at most
/// once.
///
/// The dispatcher keeps its own ledgers, independent of the discovery run's,
/// so no duplicate can reach the wire even if a caller reports the same
/// record twice. An environment's manager is always emitted before the
/// environment that references it.
#[derive(Debug)]
pub struct JsonRpcDispatcher<W: Write> {
    writer: W,
    reported_managers: HashSet<String>,
    reported_environments: HashSet<String>,
}

impl<W: Write> JsonRpcDispatcher<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            reported_managers: HashSet::new(),
            reported_environments: HashSet::new(),
        }
    }

    /// Emit an `envManager` notification unless this manager was already
    /// reported.
    pub fn report_environment_manager(&mut self, manager: &EnvManager) -> Result<(), LocatorError> {
        if !self.reported_managers.insert(manager.key()) {
            trace!("Manager {} already reported", manager.executable_path.display());
            return Ok(());
        }
        write_frame(&mut self.writer, ENV_MANAGER_METHOD, Some(manager))
    }

    /// Emit a `pythonEnvironment` notification unless one with the same key
    /// was already reported.
    ///
    /// Fails with [`LocatorError::MissingEnvironmentKey`] for a record with
    /// neither an executable path nor an environment root.
    pub fn report_environment(&mut self, env: &PythonEnvironment) -> Result<(), LocatorError> {
        let key = env.key().ok_or(LocatorError::MissingEnvironmentKey)?;
        if let Some(manager) = &env.manager {
            self.report_environment_manager(manager)?;
        }
        if !self.reported_environments.insert(key) {
            trace!("Environment {:?} already reported", env.key());
            return Ok(());
        }
        write_frame(&mut self.writer, PYTHON_ENVIRONMENT_METHOD, Some(env))
    }

    /// Report every manager, then every environment, of a result.
    pub fn report(&mut self, result: &DiscoveryResult) -> Result<(), LocatorError> {
        for manager in &result.managers {
            self.report_environment_manager(manager)?;
        }
        for env in &result.environments {
            self.report_environment(env)?;
        }
        Ok(())
    }

    /// Emit the terminal `exit` notification.
    pub fn exit(&mut self) -> Result<(), LocatorError> {
        write_frame::<W, ()>(&mut self.writer, EXIT_METHOD, None)
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EnvManagerType, PythonEnvironmentCategory};
    use std::io::Cursor;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    fn read_all(bytes: Vec<u8>) -> Vec<Notification<serde_json::Value>> {
        let mut reader = Cursor::new(bytes);
        let mut frames = Vec::new();
        while let Some(frame) = read_frame(&mut reader).unwrap() {
            frames.push(frame);
        }
        frames
    }

    fn conda_manager() -> Arc<EnvManager> {
        Arc::new(EnvManager::new(
            PathBuf::from("/opt/conda/bin/conda"),
            None,
            EnvManagerType::Conda,
        ))
    }

    #[test]
    fn test_exit_frame_bytes() {
        let frame = encode_frame(&Notification::<()>::new(EXIT_METHOD, None)).unwrap();
        let body = r#"{"jsonrpc":"2.0","method":"exit"}"#;
        let expected = format!(
            "Content-Length: {}\r\nContent-Type: application/vscode-jsonrpc; charset=utf-8\r\n\r\n{}",
            body.len(),
            body
        );
        assert_eq!(String::from_utf8(frame).unwrap(), expected);
    }

    #[test]
    fn test_length_counts_bytes() {
        let env = PythonEnvironment::new(PythonEnvironmentCategory::Venv)
            .with_name("café-环境")
            .with_env_root(Path::new("/envs/café-环境"));
        let frame = encode_frame(&Notification::new(PYTHON_ENVIRONMENT_METHOD, Some(&env))).unwrap();

        let text = String::from_utf8(frame.clone()).unwrap();
        let (header, body) = text.split_once("\r\n\r\n").unwrap();
        let declared: usize = header
            .lines()
            .find_map(|l| l.strip_prefix("Content-Length: "))
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(declared, body.len());
        assert!(declared > body.chars().count());

        let frames = read_all(frame);
        assert_eq!(frames[0].params, Some(serde_json::to_value(&env).unwrap()));
        assert_eq!(frames[0].params.as_ref().unwrap()["name"], "café-环境");
    }

    #[test]
    fn test_read_frame_errors() {
        let mut missing = Cursor::new(b"Content-Type: x\r\n\r\n{}".to_vec());
        assert!(matches!(read_frame(&mut missing), Err(LocatorError::InvalidFrame(_))));

        let mut bad = Cursor::new(b"Content-Length: ten\r\n\r\n".to_vec());
        assert!(matches!(read_frame(&mut bad), Err(LocatorError::InvalidFrame(_))));

        let mut truncated = Cursor::new(b"Content-Length: 10\r\n\r\n{}".to_vec());
        assert!(matches!(read_frame(&mut truncated), Err(LocatorError::InvalidFrame(_))));

        let mut empty = Cursor::new(Vec::new());
        assert!(read_frame(&mut empty).unwrap().is_none());
    }

    #[test]
    fn test_oversized_length_rejected_before_reading() {
        let header = format!("Content-Length: {}\r\n\r\n{{}}", usize::MAX);
        let mut huge = Cursor::new(header.into_bytes());
        assert!(matches!(read_frame(&mut huge), Err(LocatorError::InvalidFrame(_))));

        let header = format!("Content-Length: {}\r\n\r\n{{}}", MAX_FRAME_LENGTH + 1);
        let mut over = Cursor::new(header.into_bytes());
        assert!(matches!(read_frame(&mut over), Err(LocatorError::InvalidFrame(_))));
    }

    #[test]
    fn test_dispatcher_reports_once() {
        let env = PythonEnvironment::for_executable(
            PythonEnvironmentCategory::System,
            Path::new("/usr/bin/python"),
        );
        let mut dispatcher = JsonRpcDispatcher::new(Vec::new());
        dispatcher.report_environment(&env).unwrap();
        dispatcher.report_environment(&env).unwrap();
        dispatcher.exit().unwrap();

        let frames = read_all(dispatcher.into_inner());
        let methods: Vec<_> = frames.iter().map(|f| f.method.as_str()).collect();
        assert_eq!(methods, vec![PYTHON_ENVIRONMENT_METHOD, EXIT_METHOD]);
        assert!(frames[1].params.is_none());
    }

    #[test]
    fn test_manager_reported_before_environment() {
        let manager = conda_manager();
        let base = PythonEnvironment::new(PythonEnvironmentCategory::Conda)
            .with_env_root(Path::new("/opt/conda"))
            .with_manager(manager.clone());
        let other = PythonEnvironment::new(PythonEnvironmentCategory::Conda)
            .with_env_root(Path::new("/opt/conda/envs/x"))
            .with_manager(manager.clone());

        let result = DiscoveryResult {
            managers: vec![manager],
            environments: vec![base, other],
        };
        let mut dispatcher = JsonRpcDispatcher::new(Vec::new());
        dispatcher.report(&result).unwrap();

        let frames = read_all(dispatcher.into_inner());
        let methods: Vec<_> = frames.iter().map(|f| f.method.as_str()).collect();
        assert_eq!(
            methods,
            vec![ENV_MANAGER_METHOD, PYTHON_ENVIRONMENT_METHOD, PYTHON_ENVIRONMENT_METHOD]
        );
        assert_eq!(frames[0].params.as_ref().unwrap()["tool"], "conda");
    }

    #[test]
    fn test_environment_without_key_is_rejected() {
        let env = PythonEnvironment::new(PythonEnvironmentCategory::System);
        let mut dispatcher = JsonRpcDispatcher::new(Vec::new());
        assert!(matches!(
            dispatcher.report_environment(&env),
            Err(LocatorError::MissingEnvironmentKey)
        ));
        assert!(dispatcher.into_inner().is_empty());
    }
}
