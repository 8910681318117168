//! Shutdown signal handling
//!
//! Uses SIGINT/SIGTERM on Unix systems to trigger an orderly stop.

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        mod unix;
        pub use unix::*;
    } else {
        mod fallback;
        pub use fallback::*;
    }
}
