//! # torero-core
//!
//! Synchronization primitives shared by the torero-serve listener and its
//! worker threads.
//!
//! This crate is platform-agnostic and contains no socket or filesystem code.
//! Everything that touches the OS lives in `torero-server`.
//!
//! ## Modules
//!
//! - `buffer` - Fixed-capacity blocking FIFO (producer/consumer queue)
//! - `cancel` - Cancellation token for cooperative shutdown
//! - `error` - Error types

pub mod buffer;
pub mod cancel;
pub mod error;

// Re-exports for convenience
pub use buffer::BoundedBuffer;
pub use cancel::CancellationToken;
pub use error::{PutError, TryGetError, TryPutError};
