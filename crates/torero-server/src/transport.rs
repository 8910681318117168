//! Transport capabilities consumed by the listener and request handler
//!
//! The server core never names a socket type. The listener pulls
//! connections from an [`Acceptor`], and workers talk to a [`Connection`].
//! Both are implemented here for `std::net` TCP types; tests plug in
//! scripted doubles.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};

/// One accepted connection
///
/// Owned by exactly one thread at a time: the listener until it is queued,
/// then the worker that dequeued it. `close` consumes the handle, so a
/// connection is closed at most once.
pub trait Connection: Send {
    /// Single receive call; returns bytes read, 0 on orderly EOF
    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Single send call; may write fewer bytes than offered
    fn send(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Release the connection
    fn close(self) -> io::Result<()>
    where
        Self: Sized;

    /// Peer description for logs
    fn peer(&self) -> String {
        String::from("unknown")
    }
}

/// Source of new connections
pub trait Acceptor {
    type Conn: Connection + 'static;

    /// Block until the next connection arrives
    fn accept(&self) -> io::Result<Self::Conn>;

    /// Address the acceptor is bound to
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

impl Connection for TcpStream {
    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.write(bytes)
    }

    fn close(self) -> io::Result<()> {
        // The fd is released on drop either way; shutdown flushes the FIN
        // even if another handle to the socket were still alive.
        match self.shutdown(Shutdown::Both) {
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }

    fn peer(&self) -> String {
        self.peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| String::from("unknown"))
    }
}

impl Acceptor for TcpListener {
    type Conn = TcpStream;

    fn accept(&self) -> io::Result<TcpStream> {
        TcpListener::accept(self).map(|(stream, _)| stream)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpListener::local_addr(self)
    }
}

/// Send every byte of `bytes`, looping over short writes
///
/// Returns the total sent, which equals `bytes.len()` on success. An
/// interrupted call is retried; any other failure is returned as-is
/// without backing off.
pub fn send_all<C: Connection + ?Sized>(conn: &mut C, bytes: &[u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < bytes.len() {
        match conn.send(&bytes[total..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "peer accepted no bytes",
                ))
            }
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted connection double shared by the handler and worker tests

    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// What a `ScriptedConn` observed, readable after the conn is gone
    #[derive(Debug, Default)]
    pub struct Record {
        pub sent: Mutex<Vec<u8>>,
        pub closes: AtomicUsize,
    }

    impl Record {
        pub fn sent_text(&self) -> String {
            String::from_utf8_lossy(&self.sent.lock().unwrap()).into_owned()
        }

        pub fn close_count(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }
    }

    #[derive(Debug)]
    pub struct ScriptedConn {
        pub input: Vec<u8>,
        /// Max bytes accepted per send call
        pub chunk: usize,
        /// Scripted send results consumed before normal behavior
        pub send_faults: VecDeque<io::ErrorKind>,
        pub recv_fault: Option<io::ErrorKind>,
        pub record: Arc<Record>,
    }

    impl ScriptedConn {
        pub fn new(input: &[u8]) -> Self {
            Self {
                input: input.to_vec(),
                chunk: usize::MAX,
                send_faults: VecDeque::new(),
                recv_fault: None,
                record: Arc::new(Record::default()),
            }
        }

        pub fn chunked(mut self, chunk: usize) -> Self {
            self.chunk = chunk;
            self
        }

        pub fn failing_send(mut self, kind: io::ErrorKind) -> Self {
            self.send_faults.push_back(kind);
            self
        }

        pub fn failing_recv(mut self, kind: io::ErrorKind) -> Self {
            self.recv_fault = Some(kind);
            self
        }
    }

    impl Connection for ScriptedConn {
        fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if let Some(kind) = self.recv_fault {
                return Err(kind.into());
            }
            let n = buf.len().min(self.input.len());
            buf[..n].copy_from_slice(&self.input[..n]);
            self.input.drain(..n);
            Ok(n)
        }

        fn send(&mut self, bytes: &[u8]) -> io::Result<usize> {
            if let Some(kind) = self.send_faults.pop_front() {
                return Err(kind.into());
            }
            let n = bytes.len().min(self.chunk);
            self.record.sent.lock().unwrap().extend_from_slice(&bytes[..n]);
            Ok(n)
        }

        fn close(self) -> io::Result<()> {
            self.record.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn peer(&self) -> String {
            String::from("scripted")
        }
    }
}
