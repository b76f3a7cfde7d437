use {super::Ticks, thiserror::Error};

/// Tick arithmetic failure.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum TicksError {
    /// `newer` was read before `older`.
    #[error("ticks out of order: newer {newer} is earlier than older {older}")]
    OutOfOrder {
        /// Reading expected to be the later one.
        newer: Ticks,
        /// Reading expected to be the earlier one.
        older: Ticks,
    },
    /// The duration does not fit in `u64` nanoseconds.
    #[error("duration does not fit in 64-bit nanoseconds")]
    OutOfRange,
}
