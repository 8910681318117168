//! Accept loop: the single producer feeding the connection queue
//!
//! A failed `accept` never stops the loop. Failures tied to one incoming
//! connection (aborted, reset) are retried at once. Anything else, such as
//! running out of file descriptors, leaves the pending connection queued in
//! the kernel, so the loop backs off exponentially until an accept succeeds.

use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use torero_core::{BoundedBuffer, CancellationToken, PutError};
use tracing::{debug, info, warn};

use crate::transport::{Acceptor, Connection};

/// Counters reported when the accept loop stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    pub accepted: u64,
    pub accept_errors: u64,
}

/// Accepts connections and queues them for the workers
pub struct Listener<C> {
    buffer: Arc<BoundedBuffer<C>>,
    token: CancellationToken,
}

impl<C: Connection> Listener<C> {
    pub fn new(buffer: Arc<BoundedBuffer<C>>, token: CancellationToken) -> Self {
        Self { buffer, token }
    }

    /// Accept until cancelled or the queue is closed
    ///
    /// Blocks in `accept` and, when every worker is busy and the queue is
    /// full, in `put`. A failed accept is logged and the loop carries on.
    pub fn run<A>(&self, acceptor: &A) -> ListenerStats
    where
        A: Acceptor<Conn = C>,
    {
        let mut stats = ListenerStats::default();
        let mut backoff = Backoff::new();

        while !self.token.is_cancelled() {
            let conn = match acceptor.accept() {
                Ok(conn) => {
                    backoff.reset();
                    conn
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if is_per_connection(&e) => {
                    stats.accept_errors += 1;
                    warn!(error = %e, "accept failed");
                    continue;
                }
                Err(e) => {
                    stats.accept_errors += 1;
                    backoff.streak += 1;
                    // First failure of a streak, then 2nd, 4th, 8th, ...
                    if backoff.streak.is_power_of_two() {
                        warn!(error = %e, streak = backoff.streak, delay = ?backoff.next, "accept failed, backing off");
                    } else {
                        debug!(error = %e, streak = backoff.streak, "accept failed");
                    }
                    if !self.token.is_cancelled() {
                        thread::sleep(backoff.advance());
                    }
                    continue;
                }
            };

            // The shutdown wake-up connection lands here; don't queue it.
            if self.token.is_cancelled() {
                discard(conn);
                break;
            }

            debug!(peer = %conn.peer(), queued = self.buffer.len(), "accepted");
            if let Err(PutError(conn)) = self.buffer.put(conn) {
                discard(conn);
                break;
            }
            stats.accepted += 1;
        }

        info!(
            accepted = stats.accepted,
            accept_errors = stats.accept_errors,
            "listener stopped"
        );
        stats
    }
}

const BACKOFF_START: Duration = Duration::from_millis(10);
const BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Delay between accept retries while a non-transient error persists
#[derive(Debug)]
struct Backoff {
    next: Duration,
    /// Consecutive non-transient failures
    streak: u64,
}

impl Backoff {
    fn new() -> Self {
        Self {
            next: BACKOFF_START,
            streak: 0,
        }
    }

    /// Current delay; doubles the next one up to the cap
    fn advance(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(BACKOFF_MAX);
        delay
    }

    fn reset(&mut self) {
        self.next = BACKOFF_START;
        self.streak = 0;
    }
}

/// Errors that consume the failed connection, so retrying cannot spin
fn is_per_connection(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    )
}

fn discard<C: Connection>(conn: C) {
    if let Err(e) = conn.close() {
        debug!(error = %e, "close of unqueued connection failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::ScriptedConn;
    use std::collections::VecDeque;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;
    use std::time::Instant;

    /// Hands out scripted results, then cancels the token when it runs dry
    struct ScriptedAcceptor {
        results: Mutex<VecDeque<io::Result<ScriptedConn>>>,
        token: CancellationToken,
    }

    impl Acceptor for ScriptedAcceptor {
        type Conn = ScriptedConn;

        fn accept(&self) -> io::Result<ScriptedConn> {
            let next = self.results.lock().unwrap().pop_front();
            match next {
                Some(result) => result,
                None => {
                    self.token.cancel();
                    Err(io::ErrorKind::WouldBlock.into())
                }
            }
        }

        fn local_addr(&self) -> io::Result<SocketAddr> {
            Ok(SocketAddr::from(([127, 0, 0, 1], 0)))
        }
    }

    fn conn(tag: u8) -> io::Result<ScriptedConn> {
        Ok(ScriptedConn::new(&[tag]))
    }

    #[test]
    fn test_queues_in_accept_order() {
        let token = CancellationToken::new();
        let buffer = Arc::new(BoundedBuffer::new(8));
        let acceptor = ScriptedAcceptor {
            results: Mutex::new(VecDeque::from(vec![conn(1), conn(2), conn(3)])),
            token: token.clone(),
        };

        let stats = Listener::new(Arc::clone(&buffer), token).run(&acceptor);

        assert_eq!(stats.accepted, 3);
        for tag in 1..=3u8 {
            assert_eq!(buffer.try_get().unwrap().input, vec![tag]);
        }
    }

    #[test]
    fn test_accept_errors_are_not_fatal() {
        let token = CancellationToken::new();
        let buffer = Arc::new(BoundedBuffer::new(8));
        let acceptor = ScriptedAcceptor {
            results: Mutex::new(VecDeque::from(vec![
                Err(io::ErrorKind::ConnectionAborted.into()),
                conn(1),
                Err(io::Error::new(io::ErrorKind::Other, "too many open files")),
                Err(io::ErrorKind::Interrupted.into()),
                conn(2),
            ])),
            token: token.clone(),
        };

        let stats = Listener::new(Arc::clone(&buffer), token).run(&acceptor);

        // Two scripted failures plus the final WouldBlock that cancels
        assert_eq!(stats, ListenerStats { accepted: 2, accept_errors: 3 });
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_stops_when_buffer_closed() {
        let token = CancellationToken::new();
        let buffer = Arc::new(BoundedBuffer::new(4));
        buffer.close();

        let first = ScriptedConn::new(b"x");
        let record = first.record.clone();
        let acceptor = ScriptedAcceptor {
            results: Mutex::new(VecDeque::from(vec![Ok(first), conn(2)])),
            token: token.clone(),
        };

        let stats = Listener::new(buffer, token).run(&acceptor);

        assert_eq!(stats.accepted, 0);
        assert_eq!(record.close_count(), 1);
    }

    /// Fails every accept like a process out of descriptors (EMFILE)
    struct ExhaustedAcceptor {
        calls: AtomicU64,
        started: Instant,
        run_for: Duration,
        token: CancellationToken,
    }

    impl Acceptor for ExhaustedAcceptor {
        type Conn = ScriptedConn;

        fn accept(&self) -> io::Result<ScriptedConn> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.started.elapsed() >= self.run_for {
                self.token.cancel();
            }
            Err(io::Error::from_raw_os_error(24))
        }

        fn local_addr(&self) -> io::Result<SocketAddr> {
            Ok(SocketAddr::from(([127, 0, 0, 1], 0)))
        }
    }

    #[test]
    fn test_persistent_accept_failure_backs_off() {
        let token = CancellationToken::new();
        let buffer = Arc::new(BoundedBuffer::<ScriptedConn>::new(4));
        let acceptor = ExhaustedAcceptor {
            calls: AtomicU64::new(0),
            started: Instant::now(),
            run_for: Duration::from_millis(100),
            token: token.clone(),
        };

        let stats = Listener::new(Arc::clone(&buffer), token).run(&acceptor);

        // 10 + 20 + 40 + 80 ms of sleeping covers the window in about 5 tries
        let calls = acceptor.calls.load(Ordering::SeqCst);
        assert_eq!(stats.accept_errors, calls);
        assert!(calls >= 2, "calls = {}", calls);
        assert!(calls <= 8, "calls = {}", calls);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_backoff_doubles_to_cap_and_resets() {
        let mut backoff = Backoff::new();
        assert_eq!(backoff.advance(), Duration::from_millis(10));
        assert_eq!(backoff.advance(), Duration::from_millis(20));
        for _ in 0..10 {
            backoff.advance();
        }
        assert_eq!(backoff.advance(), BACKOFF_MAX);

        backoff.streak = 7;
        backoff.reset();
        assert_eq!(backoff.streak, 0);
        assert_eq!(backoff.advance(), BACKOFF_START);
    }

    #[test]
    fn test_per_connection_errors_skip_backoff() {
        assert!(is_per_connection(&io::ErrorKind::ConnectionAborted.into()));
        assert!(!is_per_connection(&io::Error::from_raw_os_error(24)));
        assert!(!is_per_connection(&io::Error::new(io::ErrorKind::Other, "no buffers")));
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let buffer = Arc::new(BoundedBuffer::<ScriptedConn>::new(1));
        let acceptor = ScriptedAcceptor {
            results: Mutex::new(VecDeque::from(vec![conn(1)])),
            token: token.clone(),
        };

        let stats = Listener::new(Arc::clone(&buffer), token).run(&acceptor);
        assert_eq!(stats, ListenerStats::default());
        assert!(buffer.is_empty());
    }
}
