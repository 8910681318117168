//! Worker thread management
//!
//! Workers are long-lived OS threads. Each one repeatedly takes a single
//! connection off the shared queue, runs the request handler on it, and
//! closes it. A transport failure ends that connection only; the worker
//! goes straight back to the queue.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use torero_core::{BoundedBuffer, CancellationToken};
use tracing::{debug, info, warn};

use crate::error::{ServeError, ServeResult};
use crate::fs::FileSystem;
use crate::handler::RequestHandler;
use crate::transport::Connection;

/// Pool of worker threads
pub struct WorkerPool {
    /// Join handles for worker threads, each yielding its served count
    handles: Vec<JoinHandle<u64>>,
}

impl WorkerPool {
    /// Spawn `num_workers` threads consuming from `buffer`
    ///
    /// If a spawn fails, the threads already started are left to drain
    /// until the caller cancels the token and closes the buffer.
    pub fn start<C, F>(
        num_workers: usize,
        buffer: Arc<BoundedBuffer<C>>,
        handler: Arc<RequestHandler<F>>,
        token: CancellationToken,
    ) -> ServeResult<Self>
    where
        C: Connection + 'static,
        F: FileSystem + 'static,
    {
        let mut handles = Vec::with_capacity(num_workers);

        for id in 0..num_workers {
            let buffer = Arc::clone(&buffer);
            let handler = Arc::clone(&handler);
            let token = token.clone();

            let handle = thread::Builder::new()
                .name(format!("torero-worker-{}", id))
                .spawn(move || worker_loop(id, &buffer, &handler, &token))
                .map_err(ServeError::Spawn)?;

            handles.push(handle);
        }

        Ok(Self { handles })
    }

    /// Get number of workers
    #[inline]
    pub fn num_workers(&self) -> usize {
        self.handles.len()
    }

    /// Wait for all workers to finish; returns connections served
    pub fn join(self) -> u64 {
        let mut served = 0;
        for (id, handle) in self.handles.into_iter().enumerate() {
            match handle.join() {
                Ok(count) => served += count,
                Err(_) => warn!(worker = id, "worker thread panicked"),
            }
        }
        served
    }
}

/// Body of one worker thread
fn worker_loop<C, F>(
    id: usize,
    buffer: &BoundedBuffer<C>,
    handler: &RequestHandler<F>,
    token: &CancellationToken,
) -> u64
where
    C: Connection,
    F: FileSystem,
{
    debug!(worker = id, "worker started");
    let mut served = 0;

    while !token.is_cancelled() {
        let Some(mut conn) = buffer.get() else {
            break;
        };
        served += 1;
        serve_one(id, &mut conn, handler);

        // Closed exactly once, whatever the handler did.
        if let Err(e) = conn.close() {
            debug!(worker = id, error = %e, "close failed");
        }
    }

    info!(worker = id, served, "worker stopped");
    served
}

fn serve_one<C, F>(id: usize, conn: &mut C, handler: &RequestHandler<F>)
where
    C: Connection,
    F: FileSystem,
{
    match handler.handle(conn) {
        Ok(outcome) => {
            debug!(worker = id, peer = %conn.peer(), status = outcome.status_code(), ?outcome, "served");
        }
        Err(e) => {
            warn!(worker = id, peer = %conn.peer(), error = %e, "connection dropped");
        }
    }
}
