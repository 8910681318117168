//! Listening socket bootstrap
//!
//! create -> SO_REUSEADDR -> bind -> listen, each step reported separately
//! so the process can exit with a diagnostic naming what failed.

use std::net::{SocketAddrV4, TcpListener};

use crate::error::{BootstrapStage, ServeError, ServeResult};

fn bootstrap_error(stage: BootstrapStage, source: impl Into<std::io::Error>) -> ServeError {
    ServeError::Bootstrap {
        stage,
        source: source.into(),
    }
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        use std::os::fd::AsRawFd;
        use tracing::debug;
        use nix::sys::socket::{self, sockopt, AddressFamily, Backlog, SockFlag, SockType, SockaddrIn};

        /// Create a listening TCP socket on `addr` with the given backlog
        ///
        /// `SO_REUSEADDR` is set so a restarted server can rebind at once.
        pub fn bind_listener(addr: SocketAddrV4, backlog: usize) -> ServeResult<TcpListener> {
            let fd = socket::socket(AddressFamily::Inet, SockType::Stream, SockFlag::empty(), None)
                .map_err(|e| bootstrap_error(BootstrapStage::Create, e))?;

            socket::setsockopt(&fd, sockopt::ReuseAddr, &true)
                .map_err(|e| bootstrap_error(BootstrapStage::SetOption, e))?;

            socket::bind(fd.as_raw_fd(), &SockaddrIn::from(addr))
                .map_err(|e| bootstrap_error(BootstrapStage::Bind, e))?;

            socket::listen(&fd, clamp_backlog(backlog)?)
                .map_err(|e| bootstrap_error(BootstrapStage::Listen, e))?;

            Ok(TcpListener::from(fd))
        }

        /// Requested backlog limited to the system maximum, as `listen(2)` does
        ///
        /// `Backlog::new` only accepts values below `SOMAXCONN`, so anything at
        /// or above it maps to `Backlog::MAXCONN`.
        fn clamp_backlog(requested: usize) -> ServeResult<Backlog> {
            let max = i32::from(Backlog::MAXCONN);
            match i32::try_from(requested) {
                Ok(n) if n < max => {
                    Backlog::new(n).map_err(|e| bootstrap_error(BootstrapStage::Listen, e))
                }
                _ => {
                    if requested > max as usize {
                        debug!(requested, max, "listen backlog clamped");
                    }
                    Ok(Backlog::MAXCONN)
                }
            }
        }
    } else {
        /// Create a listening TCP socket on `addr`
        ///
        /// Without raw socket access the platform default backlog applies.
        pub fn bind_listener(addr: SocketAddrV4, _backlog: usize) -> ServeResult<TcpListener> {
            TcpListener::bind(addr).map_err(|e| bootstrap_error(BootstrapStage::Bind, e))
        }
    }
}
