//! Error types for the bounded buffer

use core::fmt;

/// Error returned by a blocking put on a closed buffer
///
/// Carries the rejected item so the caller keeps ownership of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutError<T>(pub T);

impl<T> PutError<T> {
    /// Recover the item that could not be enqueued
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for PutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "put on closed buffer")
    }
}

impl<T: fmt::Debug> std::error::Error for PutError<T> {}

/// Error returned by a non-blocking put
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TryPutError<T> {
    /// Buffer is at capacity
    Full(T),

    /// Buffer was closed
    Closed(T),
}

impl<T> TryPutError<T> {
    pub fn into_inner(self) -> T {
        match self {
            TryPutError::Full(item) | TryPutError::Closed(item) => item,
        }
    }
}

impl<T> fmt::Display for TryPutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryPutError::Full(_) => write!(f, "buffer full"),
            TryPutError::Closed(_) => write!(f, "buffer closed"),
        }
    }
}

/// Error returned by a non-blocking get
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryGetError {
    /// Nothing queued right now
    Empty,

    /// Buffer was closed and has been drained
    Closed,
}

impl fmt::Display for TryGetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryGetError::Empty => write!(f, "buffer empty"),
            TryGetError::Closed => write!(f, "buffer closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(format!("{}", PutError(1)), "put on closed buffer");
        assert_eq!(format!("{}", TryPutError::Full(3)), "buffer full");
        assert_eq!(format!("{}", TryGetError::Closed), "buffer closed");
    }

    #[test]
    fn test_put_error_returns_item() {
        let err = PutError(String::from("conn-7"));
        assert_eq!(err.into_inner(), "conn-7");
    }

    #[test]
    fn test_try_put_error_into_inner() {
        assert_eq!(TryPutError::Full(4).into_inner(), 4);
        assert_eq!(TryPutError::Closed(5).into_inner(), 5);
    }
}
