//! Error types for the server
//!
//! Protocol errors (bad request line) and missing resources never show up
//! here: the request handler turns them into 400/404 responses. What remains
//! is transport failure on one connection, which the worker absorbs, and
//! bootstrap failure, which ends the process.

use core::fmt;
use std::io;

use crate::config::ConfigError;

/// Result type for server operations
pub type ServeResult<T> = Result<T, ServeError>;

/// Socket bootstrap step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStage {
    Create,
    SetOption,
    Bind,
    Listen,
}

impl fmt::Display for BootstrapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BootstrapStage::Create => "creating socket",
            BootstrapStage::SetOption => "setting socket option",
            BootstrapStage::Bind => "binding to port",
            BootstrapStage::Listen => "listening for connections",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while serving
#[derive(Debug)]
pub enum ServeError {
    /// Receiving the request from the peer failed
    Receive(io::Error),

    /// Sending the response to the peer failed
    Send(io::Error),

    /// Socket setup failed before the server could accept anything
    Bootstrap {
        stage: BootstrapStage,
        source: io::Error,
    },

    /// Configuration rejected by `ServerConfig::validate`
    Config(ConfigError),

    /// Failed to spawn a worker or signal thread
    Spawn(io::Error),

    /// Installing or waiting on shutdown signals failed
    Signal(io::Error),
}

impl ServeError {
    /// True for failures confined to a single connection
    pub fn is_transport(&self) -> bool {
        matches!(self, ServeError::Receive(_) | ServeError::Send(_))
    }
}

impl fmt::Display for ServeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServeError::Receive(e) => write!(f, "recv failed: {}", e),
            ServeError::Send(e) => write!(f, "send failed: {}", e),
            ServeError::Bootstrap { stage, source } => write!(f, "error {}: {}", stage, source),
            ServeError::Config(e) => write!(f, "{}", e),
            ServeError::Spawn(e) => write!(f, "failed to spawn thread: {}", e),
            ServeError::Signal(e) => write!(f, "signal setup failed: {}", e),
        }
    }
}

impl std::error::Error for ServeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServeError::Receive(e)
            | ServeError::Send(e)
            | ServeError::Spawn(e)
            | ServeError::Signal(e) => Some(e),
            ServeError::Bootstrap { source, .. } => Some(source),
            ServeError::Config(e) => Some(e),
        }
    }
}

impl From<ConfigError> for ServeError {
    fn from(e: ConfigError) -> Self {
        ServeError::Config(e)
    }
}
