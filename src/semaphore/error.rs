use std::io;

use thiserror::Error;

/// Semaphore creation or operation failure.
#[derive(Debug, Error)]
pub enum SemaphoreError {
    /// The initial count exceeds the backend maximum.
    #[error("invalid initial semaphore count {count} (max {max})")]
    InvalidCount {
        /// Requested initial count.
        count: u32,
        /// [`MAX_COUNT`](super::MAX_COUNT).
        max: u32,
    },
    /// The OS refused to create the semaphore.
    #[error("failed to create the semaphore: {0}")]
    FailedToCreate(#[source] io::Error),
    /// The counter is already at [`MAX_COUNT`](super::MAX_COUNT).
    #[error("semaphore count overflow")]
    Overflow,
    /// The OS signal call failed.
    #[error("failed to signal the semaphore: {0}")]
    FailedToSignal(#[source] io::Error),
    /// The OS wait call failed with something other than an interruption.
    #[error("failed to wait on the semaphore: {0}")]
    FailedToWait(#[source] io::Error),
}
