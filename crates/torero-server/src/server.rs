//! Server assembly: one listener thread, N workers, one shared queue
//!
//! ```text
//! accept -> Listener --put--> BoundedBuffer --get--> Worker x N -> RequestHandler
//! ```
//!
//! The queue capacity equals the listen backlog. Shutdown cancels the
//! shared token, closes the queue, and pokes the listening socket so a
//! blocked `accept` returns. Connections still queued at that point are
//! closed without a response.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpListener, TcpStream};
use std::sync::Arc;

use torero_core::{BoundedBuffer, CancellationToken};
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::error::ServeResult;
use crate::fs::OsFileSystem;
use crate::handler::RequestHandler;
use crate::listener::Listener;
use crate::socket;
use crate::worker::WorkerPool;

/// Totals reported when the server stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerReport {
    pub accepted: u64,
    pub accept_errors: u64,
    pub served: u64,
}

/// A bound, not yet running server
pub struct Server {
    config: ServerConfig,
    listener: TcpListener,
    buffer: Arc<BoundedBuffer<TcpStream>>,
    token: CancellationToken,
}

impl Server {
    /// Validate `config` and bind on every IPv4 interface
    pub fn bind(config: ServerConfig) -> ServeResult<Self> {
        Self::bind_on(config, Ipv4Addr::UNSPECIFIED)
    }

    /// Validate `config` and bind on one interface
    pub fn bind_on(config: ServerConfig, ip: Ipv4Addr) -> ServeResult<Self> {
        config.validate()?;

        let addr = SocketAddrV4::new(ip, config.port);
        let listener = socket::bind_listener(addr, config.backlog)?;
        let buffer = Arc::new(BoundedBuffer::new(config.backlog));

        Ok(Self {
            config,
            listener,
            buffer,
            token: CancellationToken::new(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Handle that stops `run` from any thread
    pub fn shutdown_handle(&self) -> io::Result<ShutdownHandle> {
        let mut wake_addr = self.local_addr()?;
        if wake_addr.ip().is_unspecified() {
            wake_addr.set_ip(Ipv4Addr::LOCALHOST.into());
        }
        Ok(ShutdownHandle {
            token: self.token.clone(),
            buffer: Arc::clone(&self.buffer),
            wake_addr,
        })
    }

    /// Serve until shut down
    ///
    /// Workers run on their own threads; the accept loop runs on the
    /// calling thread.
    pub fn run(self) -> ServeResult<ServerReport> {
        let handler = Arc::new(RequestHandler::new(
            self.config.doc_root.clone(),
            OsFileSystem,
            self.config.max_request_bytes,
        ));

        let pool = match WorkerPool::start(
            self.config.workers,
            Arc::clone(&self.buffer),
            handler,
            self.token.clone(),
        ) {
            Ok(pool) => pool,
            Err(e) => {
                self.token.cancel();
                self.buffer.close();
                return Err(e);
            }
        };

        info!(
            addr = %self.local_addr().map(|a| a.to_string()).unwrap_or_default(),
            doc_root = %self.config.doc_root.display(),
            workers = pool.num_workers(),
            backlog = self.config.backlog,
            "serving"
        );

        let stats = Listener::new(Arc::clone(&self.buffer), self.token.clone()).run(&self.listener);

        self.token.cancel();
        self.buffer.close();
        let served = pool.join();

        Ok(ServerReport {
            accepted: stats.accepted,
            accept_errors: stats.accept_errors,
            served,
        })
    }
}

/// Stops a running server
#[derive(Clone)]
pub struct ShutdownHandle {
    token: CancellationToken,
    buffer: Arc<BoundedBuffer<TcpStream>>,
    wake_addr: SocketAddr,
}

impl ShutdownHandle {
    /// Cancel, close the queue, and wake the accept loop; idempotent
    pub fn trigger(&self) {
        if self.token.is_cancelled() {
            return;
        }
        self.token.cancel();
        self.buffer.close();

        if let Err(e) = TcpStream::connect(self.wake_addr) {
            debug!(addr = %self.wake_addr, error = %e, "listener wake-up connect failed");
        }
    }
}
