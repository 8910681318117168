//! Platforms without POSIX signals: nothing to block, nothing to wait for

use crate::error::ServeResult;

/// Placeholder that never delivers a signal
pub struct ShutdownSignals;

impl ShutdownSignals {
    pub fn block() -> ServeResult<Self> {
        Ok(Self)
    }

    /// Parks the calling thread forever
    pub fn wait(&self) -> ServeResult<&'static str> {
        loop {
            std::thread::park();
        }
    }
}
