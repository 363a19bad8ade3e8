use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, trace};

use crate::{QueueError, Result};

/// An unbounded FIFO queue shared between producer and consumer threads.
///
/// Every operation takes the queue's own lock for its whole duration, so two
/// queues never contend with each other. Cloning the handle shares the same
/// queue; it is dropped once the last handle goes away.
///
/// ```
/// use safe_queue::ThreadSafeQueue;
///
/// let queue = ThreadSafeQueue::new();
/// queue.push(1);
/// queue.push(2);
///
/// let mut value = 0;
/// assert!(queue.try_pop(&mut value));
/// assert_eq!(value, 1);
/// assert_eq!(queue.take(), 2);
/// assert!(queue.empty());
/// ```
pub struct ThreadSafeQueue<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
}

struct State<T> {
    queue: VecDeque<T>,
    closed: bool,
}

impl<T> Clone for ThreadSafeQueue<T> {
    fn clone(&self) -> Self {
        ThreadSafeQueue {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Default for ThreadSafeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ThreadSafeQueue<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty queue with room for `capacity` elements before it
    /// reallocates. This is not a limit: pushes past it still succeed.
    pub fn with_capacity(capacity: usize) -> Self {
        ThreadSafeQueue {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    queue: VecDeque::with_capacity(capacity),
                    closed: false,
                }),
                not_empty: Condvar::new(),
            }),
        }
    }

    // The sequence is never left half-updated under the lock, so a panic in
    // another holder does not invalidate it.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, State<T>>) -> MutexGuard<'a, State<T>> {
        self.shared
            .not_empty
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `value` to the back of the queue and wakes one blocked consumer.
    pub fn push(&self, value: T) {
        let mut state = self.lock();
        state.queue.push_back(value);
        drop(state);
        self.shared.not_empty.notify_one();
    }

    /// Whether the queue held no elements at the instant of the check.
    ///
    /// Another thread may push or pop right after this returns, so the answer
    /// is only a hint. Use [`try_pop`](Self::try_pop) or
    /// [`wait_and_pop`](Self::wait_and_pop) to actually extract values.
    pub fn empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.empty()
    }

    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    /// Moves the front element into `out` and returns `true`, or returns
    /// `false` without touching `out` when the queue is empty. Never blocks.
    pub fn try_pop(&self, out: &mut T) -> bool {
        match self.try_take() {
            Some(value) => {
                *out = value;
                true
            }
            None => false,
        }
    }

    pub fn try_take(&self) -> Option<T> {
        self.lock().queue.pop_front()
    }

    /// Blocks until an element is available, then moves it into `out`.
    ///
    /// Waits forever if nothing is ever pushed. Closing the queue does not
    /// wake this call; use [`take_or_closed`](Self::take_or_closed) for a
    /// wait that can be cancelled.
    pub fn wait_and_pop(&self, out: &mut T) {
        *out = self.take();
    }

    /// Blocking form of [`try_take`](Self::try_take).
    pub fn take(&self) -> T {
        let mut state = self.lock();
        loop {
            if let Some(value) = state.queue.pop_front() {
                return value;
            }
            state = self.wait(state);
        }
    }

    /// Like [`wait_and_pop`](Self::wait_and_pop), but gives up once `timeout`
    /// has elapsed. Returns `false` and leaves `out` untouched on expiry.
    pub fn wait_and_pop_timeout(&self, out: &mut T, timeout: Duration) -> bool {
        match self.take_timeout(timeout) {
            Ok(value) => {
                *out = value;
                true
            }
            Err(_) => false,
        }
    }

    pub fn take_timeout(&self, timeout: Duration) -> Result<T> {
        let state = self.lock();
        let (mut state, result) = self
            .shared
            .not_empty
            .wait_timeout_while(state, timeout, |state| state.queue.is_empty())
            .unwrap_or_else(PoisonError::into_inner);

        // An element pushed right at the deadline still counts.
        match state.queue.pop_front() {
            Some(value) => Ok(value),
            None => {
                debug_assert!(result.timed_out());
                trace!(?timeout, "timed out waiting for an element");
                Err(QueueError::Timeout(timeout))
            }
        }
    }

    /// Blocks until an element is available or the queue is closed.
    ///
    /// Elements still queued when [`close`](Self::close) is called are handed
    /// out first; `QueueError::Closed` is only returned once the queue is
    /// both closed and empty.
    pub fn take_or_closed(&self) -> Result<T> {
        let mut state = self.lock();
        loop {
            if let Some(value) = state.queue.pop_front() {
                return Ok(value);
            }
            if state.closed {
                return Err(QueueError::Closed);
            }
            state = self.wait(state);
        }
    }

    /// Wakes every thread blocked in [`take_or_closed`](Self::take_or_closed)
    /// and makes later calls return as soon as the queue is empty.
    ///
    /// Pushes are still accepted after closing.
    pub fn close(&self) {
        let mut state = self.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        let remaining = state.queue.len();
        drop(state);

        debug!(remaining, "queue closed");
        self.shared.not_empty.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Removes every queued element at once, oldest first.
    pub fn drain(&self) -> Vec<T> {
        self.lock().queue.drain(..).collect()
    }
}

impl<T: Clone> ThreadSafeQueue<T> {
    /// Returns a copy of the front element without removing it.
    pub fn front(&self) -> Result<T> {
        self.lock().queue.front().cloned().ok_or(QueueError::Empty)
    }
}
