//! # torero-server
//!
//! Static file server speaking a minimal HTTP/1.0 dialect.
//!
//! One listener thread accepts connections and hands them to a fixed pool
//! of worker threads through a [`torero_core::BoundedBuffer`]. Each worker
//! reads a single request, answers it from the document root, and closes
//! the connection.
//!
//! ## Modules
//!
//! - `config` - Server tunables and validation
//! - `error` - Error types
//! - `transport` - Connection/acceptor seam over TCP
//! - `fs` - Filesystem seam
//! - `request` - Request-line splitting and grammar check
//! - `mime` - Extension to Content-Type mapping
//! - `response` - Status line, headers, bodies
//! - `handler` - Per-connection request state machine
//! - `listener` - Accept loop (producer)
//! - `worker` - Worker threads (consumers)
//! - `socket` - Listening socket bootstrap
//! - `signal` - SIGINT/SIGTERM collection
//! - `server` - Wiring of all of the above

pub mod config;
pub mod error;
pub mod fs;
pub mod handler;
pub mod listener;
pub mod mime;
pub mod request;
pub mod response;
pub mod server;
pub mod signal;
pub mod socket;
pub mod transport;
pub mod worker;

// Re-exports
pub use config::{ConfigError, ServerConfig};
pub use error::{BootstrapStage, ServeError, ServeResult};
pub use fs::{FileSystem, OsFileSystem};
pub use handler::{Outcome, RequestHandler};
pub use server::{Server, ServerReport, ShutdownHandle};
pub use signal::ShutdownSignals;
pub use transport::{Acceptor, Connection};
