//! A hierarchical timing wheel: an O(1)-amortized priority queue keyed by
//! non-negative integers, specialized for scheduling alarms against a
//! monotonic clock.
//!
//! The crate is split into two layers:
//!
//!   - [`queue`] implements the generic lazy radix-sort priority queue
//!     ([`queue::Queue`]) on its own terms — integer keys in, integer keys
//!     out, no notion of wall-clock time.
//!   - [`wheel`] wraps it with the scheduling semantics a timer actually
//!     needs: nanosecond timestamps, a monotonic `now`, and the firing of
//!     due alarms ([`wheel::TimingWheel`]).
//!
//! Both are single-threaded and non-reentrant: nothing here takes a lock,
//! so callers that need to share a queue or wheel across threads must
//! supply their own synchronization, the same division of responsibility
//! `r3_kernel` draws between its data structures and the CPU Lock its
//! kernel wraps them in.
//!
//! ```
//! use timing_wheel::config::Config;
//! use timing_wheel::wheel::TimingWheel;
//!
//! let mut wheel = TimingWheel::create(Config::default(), 0).unwrap();
//! let handle = wheel.add(1_000_000, "wake up").unwrap();
//! wheel.advance_clock(1_000_001, |_, _, value| {
//!     assert_eq!(*value, "wake up");
//! }).unwrap();
//! assert!(!wheel.mem(handle));
//! ```

pub mod config;
pub mod error;
mod level;
pub mod pool;
pub mod queue;
pub mod wheel;

pub use pool::Handle;
