//! The error taxonomy raised by [`crate::queue::Queue`] and
//! [`crate::wheel::TimingWheel`].
//!
//! Every variant here corresponds to a recoverable precondition violation on
//! an externally-supplied argument. Internal consistency checks (the kind a
//! caller cannot trigger by passing a bad argument) are asserted with
//! `debug_assert!`/`panic!` at the point of detection instead of being
//! represented here, since by contract they can only fire if the data
//! structure's own invariants have already been broken.

use thiserror::Error;

/// Errors raised by [`crate::queue::Queue`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// `add`/`change_key` was given a key outside `[min_allowed_key,
    /// max_allowed_key]`.
    #[error("key {key} is outside the allowed window [{min}, {max}]")]
    KeyOutOfBounds { key: u64, min: u64, max: u64 },

    /// `increase_min_allowed_key` was given a floor above the current
    /// maximum representable key.
    #[error("key {key} exceeds the maximum representable key {max_representable}")]
    KeyTooLarge { key: u64, max_representable: u64 },

    /// An externally-supplied handle failed the pool's validity check —
    /// either it was never issued, or the element it once named has since
    /// been freed.
    #[error("handle does not refer to a live element")]
    InvalidHandle,

    /// A query that only makes sense for a non-empty queue (an `_exn`
    /// variant in the terminology of the source material) was called on an
    /// empty one.
    #[error("the queue is empty")]
    EmptyQueue,
}

/// Errors raised by [`crate::wheel::TimingWheel`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WheelError {
    /// Propagated from the embedded priority queue unchanged.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// A timestamp argument was negative.
    #[error("time {time} precedes the epoch")]
    TimeBeforeEpoch { time: i64 },

    /// A timestamp argument fell outside the representable range implied by
    /// the configured alarm precision.
    #[error("time {time} exceeds the representable time range")]
    TimeTooFarInFuture { time: i64 },

    /// `add`/`reschedule` was given an `at` earlier than the start of the
    /// current interval.
    #[error("scheduled time {at} is before the current interval start {now_interval_num_start}")]
    ScheduledBeforeNow {
        at: i64,
        now_interval_num_start: i64,
    },

    /// `add`/`reschedule` was given an `at` at or past the current alarm
    /// upper bound.
    #[error("scheduled time {at} is at or past the alarm upper bound {alarm_upper_bound}")]
    ScheduledTooFarInFuture { at: i64, alarm_upper_bound: i64 },
}

/// Errors raised while constructing a [`crate::config::Config`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("level_bits must not be empty")]
    Empty,
    #[error("level_bits[{index}] must be a positive bit width")]
    NonPositiveLevel { index: usize },
    #[error("sum of level bit-widths ({sum}) exceeds the 61-bit key budget")]
    TooManyBits { sum: u32 },
}
