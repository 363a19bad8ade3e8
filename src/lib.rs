pub mod countdown_latch;
pub use countdown_latch::CountdownLatch;

pub mod thread_safe_queue;
pub use thread_safe_queue::ThreadSafeQueue;

use std::time::Duration;

/// Error returned by the queue operations that can come back without a value.
///
/// `push`, `empty`, `try_pop` and `wait_and_pop` never fail; only peeking at
/// an empty queue and the cancellable waits produce one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("queue is empty")]
    Empty,
    #[error("no element arrived within {0:?}")]
    Timeout(Duration),
    #[error("queue is closed and drained")]
    Closed,
}

/// A specialized `Result` type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;
