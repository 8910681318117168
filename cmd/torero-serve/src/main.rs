//! # torero-serve
//!
//! Serve a directory over HTTP/1.0 with a fixed pool of worker threads.
//!
//! ## Usage
//!
//!     torero-serve <port> <document-root>
//!
//! Tunables come from the environment:
//!
//! | Variable                   | Default |
//! |----------------------------|---------|
//! | `TORERO_WORKERS`           | 8       |
//! | `TORERO_BACKLOG`           | 10      |
//! | `TORERO_MAX_REQUEST_BYTES` | 2048    |
//! | `TORERO_LOG`               | info    |
//!
//! SIGINT or SIGTERM stops the server.

use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use torero_server::{Server, ServerConfig, ShutdownSignals};

// ── Command line ──

#[derive(Parser, Debug)]
#[command(name = "torero-serve", version, about = "Serve static files over HTTP/1.0")]
struct Args {
    /// TCP port to listen on
    port: u16,

    /// Directory that request targets are resolved under
    document_root: PathBuf,
}

// ── Logging ──

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TORERO_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .init();
}

// ── Main ──

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    // Every thread spawned from here on inherits the blocked mask.
    let signals = ShutdownSignals::block().context("blocking shutdown signals")?;

    let config = ServerConfig::from_env(args.port, &args.document_root);
    let server = Server::bind(config)
        .with_context(|| format!("starting server on port {}", args.port))?;
    let shutdown = server
        .shutdown_handle()
        .context("reading listener address")?;

    thread::Builder::new()
        .name("torero-signal".into())
        .spawn(move || {
            match signals.wait() {
                Ok(name) => info!(signal = name, "shutting down"),
                Err(e) => error!(error = %e, "signal wait failed; shutting down"),
            }
            shutdown.trigger();
        })
        .context("spawning signal thread")?;

    let report = server.run().context("running server")?;
    info!(
        accepted = report.accepted,
        served = report.served,
        accept_errors = report.accept_errors,
        "stopped"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_two_positionals() {
        let args = Args::try_parse_from(["torero-serve", "8080", "./www"]).unwrap();
        assert_eq!(args.port, 8080);
        assert_eq!(args.document_root, PathBuf::from("./www"));
    }

    #[test]
    fn test_wrong_arity_prints_usage_and_fails() {
        let cases: [&[&str]; 3] = [
            &["torero-serve"],
            &["torero-serve", "8080"],
            &["torero-serve", "8080", "./www", "extra"],
        ];
        for argv in cases {
            let err = Args::try_parse_from(argv).unwrap_err();
            assert_ne!(err.exit_code(), 0, "argv = {:?}", argv);
            assert!(err.to_string().contains("Usage: torero-serve"), "argv = {:?}", argv);
        }
    }

    #[test]
    fn test_non_numeric_port_rejected() {
        let err = Args::try_parse_from(["torero-serve", "http", "./www"]).unwrap_err();
        assert_ne!(err.exit_code(), 0);

        let err = Args::try_parse_from(["torero-serve", "70000", "./www"]).unwrap_err();
        assert_ne!(err.exit_code(), 0);
    }
}
