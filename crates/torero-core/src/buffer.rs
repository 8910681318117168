//! Bounded blocking FIFO for handing connections from the listener to workers
//!
//! Classic producer/consumer queue: one mutex guards the items, and two
//! condition variables wake only the side that can make progress. `put`
//! blocks while the buffer is full, `get` blocks while it is empty, and both
//! re-check their predicate after every wakeup.
//!
//! `close()` is the cancellation hook: it is part of both wait predicates, so
//! a closed buffer releases every blocked thread.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use crate::error::{PutError, TryGetError, TryPutError};

/// Fixed-capacity, thread-safe FIFO queue
///
/// Share it between threads with `Arc<BoundedBuffer<T>>`. Items come out in
/// exactly the order they went in; none are duplicated or dropped.
///
/// ```
/// use torero_core::BoundedBuffer;
///
/// let buffer = BoundedBuffer::new(2);
/// buffer.put(1).unwrap();
/// buffer.put(2).unwrap();
/// assert_eq!(buffer.get(), Some(1));
/// assert_eq!(buffer.get(), Some(2));
/// ```
pub struct BoundedBuffer<T> {
    /// Maximum number of queued items, fixed at construction
    capacity: usize,

    /// Queue state, only touched under the lock
    state: Mutex<State<T>>,

    /// Signalled after every get
    not_full: Condvar,

    /// Signalled after every put
    not_empty: Condvar,
}

struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

impl<T> BoundedBuffer<T> {
    /// Create an empty buffer holding at most `capacity` items
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "bounded buffer capacity must be at least 1");

        Self {
            capacity,
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    /// Append an item, blocking while the buffer is full
    ///
    /// Returns the item inside `PutError` if the buffer is (or becomes)
    /// closed before space is available.
    pub fn put(&self, item: T) -> Result<(), PutError<T>> {
        let mut state = self.lock();
        while !state.closed && state.items.len() == self.capacity {
            state = self
                .not_full
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        if state.closed {
            return Err(PutError(item));
        }
        state.items.push_back(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Remove the head item, blocking while the buffer is empty
    ///
    /// Returns `None` once the buffer is closed and every queued item has
    /// been handed out.
    pub fn get(&self) -> Option<T> {
        let mut state = self.lock();
        while !state.closed && state.items.is_empty() {
            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        let item = state.items.pop_front();
        drop(state);
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Append an item without blocking
    pub fn try_put(&self, item: T) -> Result<(), TryPutError<T>> {
        let mut state = self.lock();
        if state.closed {
            return Err(TryPutError::Closed(item));
        }
        if state.items.len() == self.capacity {
            return Err(TryPutError::Full(item));
        }
        state.items.push_back(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Remove the head item without blocking
    pub fn try_get(&self) -> Result<T, TryGetError> {
        let mut state = self.lock();
        match state.items.pop_front() {
            Some(item) => {
                drop(state);
                self.not_full.notify_one();
                Ok(item)
            }
            None if state.closed => Err(TryGetError::Closed),
            None => Err(TryGetError::Empty),
        }
    }

    /// Close the buffer and wake every blocked thread
    ///
    /// Pending and future puts fail. Gets keep draining queued items and
    /// return `None` once empty. Closing twice is harmless.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        drop(state);
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    /// Number of queued items
    ///
    /// Taken under the lock, but only a snapshot: other threads may change
    /// it before the caller looks at the result.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Racy snapshot, see [`len`](Self::len)
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Racy snapshot, see [`len`](Self::len)
    pub fn is_full(&self) -> bool {
        self.lock().items.len() == self.capacity
    }

    /// Get buffer capacity
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // A panicking holder cannot leave the queue half-updated (every mutation
    // is a single push or pop), so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T> std::fmt::Debug for BoundedBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("BoundedBuffer")
            .field("capacity", &self.capacity)
            .field("len", &state.items.len())
            .field("closed", &state.closed)
            .finish()
    }
}
