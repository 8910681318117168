//! Server configuration
//!
//! Library defaults with runtime environment overrides. The port and the
//! document root always come from the caller (the command line); the
//! tunables below may be overridden through the environment.
//!
//! # Example
//!
//! ```rust,ignore
//! use torero_server::config::ServerConfig;
//!
//! let config = ServerConfig::from_env(8080, "./www")
//!     .workers(4)
//!     .backlog(32);
//! config.validate()?;
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Compile-time defaults
pub mod defaults {
    /// Worker threads pulling from the connection queue
    pub const WORKERS: usize = 8;
    /// Listen backlog, also the connection queue capacity
    pub const BACKLOG: usize = 10;
    /// Bytes read from a connection in its single receive call
    pub const MAX_REQUEST_BYTES: usize = 2048;
}

/// Server configuration with builder pattern.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on (all IPv4 interfaces)
    pub port: u16,
    /// Base directory under which request targets are resolved
    pub doc_root: PathBuf,
    /// Number of worker threads
    pub workers: usize,
    /// Listen backlog and connection queue capacity
    pub backlog: usize,
    /// Receive limit for the request
    pub max_request_bytes: usize,
}

impl ServerConfig {
    /// Create config from library defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `TORERO_WORKERS` - Number of worker threads
    /// - `TORERO_BACKLOG` - Listen backlog / queue capacity
    /// - `TORERO_MAX_REQUEST_BYTES` - Receive limit per request
    pub fn from_env(port: u16, doc_root: impl AsRef<Path>) -> Self {
        Self {
            port,
            doc_root: doc_root.as_ref().to_path_buf(),
            workers: env_get("TORERO_WORKERS", defaults::WORKERS),
            backlog: env_get("TORERO_BACKLOG", defaults::BACKLOG),
            max_request_bytes: env_get("TORERO_MAX_REQUEST_BYTES", defaults::MAX_REQUEST_BYTES),
        }
    }

    /// Create config with explicit defaults (no env override).
    pub fn new(port: u16, doc_root: impl AsRef<Path>) -> Self {
        Self {
            port,
            doc_root: doc_root.as_ref().to_path_buf(),
            workers: defaults::WORKERS,
            backlog: defaults::BACKLOG,
            max_request_bytes: defaults::MAX_REQUEST_BYTES,
        }
    }

    // Builder methods

    pub fn workers(mut self, n: usize) -> Self {
        self.workers = n;
        self
    }

    pub fn backlog(mut self, n: usize) -> Self {
        self.backlog = n;
        self
    }

    pub fn max_request_bytes(mut self, n: usize) -> Self {
        self.max_request_bytes = n;
        self
    }

    /// Validate configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidValue("workers must be > 0"));
        }
        if self.backlog == 0 {
            return Err(ConfigError::InvalidValue("backlog must be > 0"));
        }
        if self.backlog > i32::MAX as usize {
            return Err(ConfigError::InvalidValue("backlog does not fit the listen() argument"));
        }
        if self.max_request_bytes == 0 {
            return Err(ConfigError::InvalidValue("max_request_bytes must be > 0"));
        }
        if !self.doc_root.is_dir() {
            return Err(ConfigError::DocRootNotDirectory(self.doc_root.clone()));
        }
        Ok(())
    }
}

/// Configuration error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue(&'static str),
    DocRootNotDirectory(PathBuf),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config: {}", msg),
            ConfigError::DocRootNotDirectory(path) => {
                write!(f, "Invalid config: document root {} is not a directory", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse an environment variable, falling back to `default` when unset or unparsable
fn env_get<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
