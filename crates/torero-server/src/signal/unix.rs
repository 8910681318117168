//! Unix shutdown signals via a blocked mask and `sigwait`
//!
//! The signals are blocked before any server thread is spawned, so every
//! thread inherits the mask and none of them is interrupted. One dedicated
//! thread then picks them up synchronously with `wait`.

use nix::sys::signal::{SigSet, Signal};

use crate::error::{ServeError, ServeResult};

/// SIGINT and SIGTERM, blocked and awaitable
pub struct ShutdownSignals {
    set: SigSet,
}

impl ShutdownSignals {
    /// Block SIGINT and SIGTERM on the calling thread
    ///
    /// Call this on the main thread before spawning workers.
    pub fn block() -> ServeResult<Self> {
        let mut set = SigSet::empty();
        set.add(Signal::SIGINT);
        set.add(Signal::SIGTERM);
        set.thread_block()
            .map_err(|e| ServeError::Signal(e.into()))?;
        Ok(Self { set })
    }

    /// Block until one of the shutdown signals arrives; returns its name
    pub fn wait(&self) -> ServeResult<&'static str> {
        let signal = self.set.wait().map_err(|e| ServeError::Signal(e.into()))?;
        Ok(signal.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_wait_receives_blocked_signal() {
        // Runs on its own thread so the mask does not leak into other tests.
        let name = thread::spawn(|| {
            let signals = ShutdownSignals::block().unwrap();
            // raise() targets the calling thread
            nix::sys::signal::raise(Signal::SIGTERM).unwrap();
            signals.wait().unwrap()
        })
        .join()
        .unwrap();

        assert_eq!(name, "SIGTERM");
    }
}
