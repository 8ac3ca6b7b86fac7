//! Hierarchical timing wheel: a [`crate::queue::Queue`] specialized to
//! schedule callbacks against a monotonic, strictly-advancing clock
//! expressed in nanoseconds since an arbitrary epoch.
//!
//! Where [`crate::queue::Queue`] knows only about abstract non-negative
//! integer keys, [`TimingWheel`] adds the two things a scheduler actually
//! needs on top: a mapping from wall-clock nanoseconds to queue keys (an
//! "interval number", quantized by the configured [`AlarmPrecision`]), and a
//! monotonic `now` that only ever moves forward. This split mirrors how
//! `r3_kernel::timeout` sits on top of `utils::binary_heap::BinaryHeap`:
//! the heap (here, the queue) doesn't know what a timestamp is, and the
//! scheduling layer doesn't know how the heap is internally laid out.

use crate::config::Config;
use crate::error::WheelError;
use crate::pool::Handle;
use crate::queue::Queue;

struct TimedValue<V> {
    at: i64,
    value: V,
}

/// A priority queue of callbacks keyed by an absolute firing time in
/// nanoseconds, backed by a hierarchical radix-sorted [`crate::queue::Queue`].
///
/// `now` only ever moves forward ([`TimingWheel::advance_clock`]); there is
/// no way to rewind it. A single `TimingWheel` is not safe to share across
/// threads without external synchronization — see the crate-level docs.
pub struct TimingWheel<V> {
    config: Config,
    queue: Queue<TimedValue<V>>,
    /// The highest interval number level 0's width can ever directly
    /// address before wraparound of the `i64` timestamp domain.
    max_interval_num: u64,
    /// The highest `at`/`to` timestamp this wheel can ever represent: the
    /// start of the interval one past the queue's fixed `max_allowed_key`,
    /// capped by `max_interval_num` so the conversion back to nanoseconds
    /// never overflows `i64`. Computed once at construction — the queue's
    /// top-level ceiling never moves (see `Queue::max_allowed_key`).
    max_representable_time: i64,
    now: i64,
    now_interval_num_start: i64,
    alarm_upper_bound: i64,
}

impl<V> TimingWheel<V> {
    /// Build a wheel whose clock starts at `start` (nanoseconds since
    /// epoch, must be non-negative).
    pub fn create(config: Config, start: i64) -> Result<Self, WheelError> {
        if start < 0 {
            return Err(WheelError::TimeBeforeEpoch { time: start });
        }
        let p = config.alarm_precision().bits();
        let max_interval_num = (i64::MAX as u64) >> p;
        let queue = Queue::with_level_bits(config.level_bits());
        // `queue.max_allowed_key()` is the fixed ceiling, not a sliding
        // value (see `Queue::max_allowed_key`), so this only needs to be
        // computed once. The `.min(max_interval_num)` guards against the
        // left shift back into nanoseconds overflowing `i64`.
        let max_representable_time = {
            let top_interval = queue.max_allowed_key().min(max_interval_num);
            (top_interval << p) as i64
        };
        let mut wheel = Self {
            config,
            queue,
            max_interval_num,
            max_representable_time,
            now: 0,
            now_interval_num_start: 0,
            alarm_upper_bound: 0,
        };
        wheel.recompute_alarm_upper_bound();
        // The queue starts empty, so raising its floor up to `start` can
        // never evict or refile anything; the closure is unreachable.
        wheel.advance_clock(start, |_, _, _| {
            unreachable!("advancing an empty queue's floor cannot fire an alarm")
        })?;
        Ok(wheel)
    }

    #[inline]
    fn precision_bits(&self) -> u32 {
        self.config.alarm_precision().bits()
    }

    #[inline]
    fn interval_num(&self, time: i64) -> u64 {
        (time as u64) >> self.precision_bits()
    }

    #[inline]
    fn interval_num_start(&self, interval_num: u64) -> i64 {
        (interval_num << self.precision_bits()) as i64
    }

    fn recompute_alarm_upper_bound(&mut self) {
        let top = self.queue.max_allowed_key().saturating_add(1).min(self.max_interval_num);
        self.alarm_upper_bound = self.interval_num_start(top);
    }

    /// The current clock reading.
    #[inline]
    pub fn now(&self) -> i64 {
        self.now
    }

    /// The start of the interval `now` currently falls in; the lower bound
    /// (inclusive) accepted by [`TimingWheel::add`].
    #[inline]
    pub fn now_interval_num_start(&self) -> i64 {
        self.now_interval_num_start
    }

    /// The upper bound (exclusive) currently accepted by [`TimingWheel::add`].
    #[inline]
    pub fn alarm_upper_bound(&self) -> i64 {
        self.alarm_upper_bound
    }

    fn validate_schedule_time(&self, at: i64) -> Result<u64, WheelError> {
        if at < 0 {
            return Err(WheelError::TimeBeforeEpoch { time: at });
        }
        if at < self.now_interval_num_start {
            return Err(WheelError::ScheduledBeforeNow {
                at,
                now_interval_num_start: self.now_interval_num_start,
            });
        }
        if at >= self.alarm_upper_bound {
            return Err(WheelError::ScheduledTooFarInFuture {
                at,
                alarm_upper_bound: self.alarm_upper_bound,
            });
        }
        Ok(self.interval_num(at))
    }

    /// Schedule `value` to fire at `at` (absolute nanoseconds since epoch).
    pub fn add(&mut self, at: i64, value: V) -> Result<Handle, WheelError> {
        let key = self.validate_schedule_time(at)?;
        self.queue.add(key, TimedValue { at, value }).map_err(WheelError::from)
    }

    /// Schedule `value` to fire at the start of interval number `interval_num`.
    pub fn add_at_interval_num(&mut self, interval_num: u64, value: V) -> Result<Handle, WheelError> {
        let at = self.interval_num_start(interval_num);
        self.add(at, value)
    }

    /// Remove the alarm named by `h`, returning its scheduled value.
    pub fn remove(&mut self, h: Handle) -> Result<V, WheelError> {
        Ok(self.queue.remove(h)?.value)
    }

    /// True iff `h` still names a pending alarm.
    pub fn mem(&self, h: Handle) -> bool {
        self.queue.contains(h)
    }

    /// Reschedule `h` to fire at `at` instead.
    pub fn reschedule(&mut self, h: Handle, at: i64) -> Result<(), WheelError> {
        let key = self.validate_schedule_time(at)?;
        self.queue.change_key(h, key)?;
        if let Ok(tv) = self.queue.get_mut(h) {
            tv.at = at;
        }
        Ok(())
    }

    pub fn reschedule_at_interval_num(&mut self, h: Handle, interval_num: u64) -> Result<(), WheelError> {
        let at = self.interval_num_start(interval_num);
        self.reschedule(h, at)
    }

    /// Discard every pending alarm.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Advance the clock to `to`, firing (and removing) every alarm whose
    /// interval number is now below the floor, in ascending key order within
    /// each slot's insertion order. A no-op if `to <= now()`.
    pub fn advance_clock(
        &mut self,
        to: i64,
        mut on_fired: impl FnMut(Handle, i64, &V),
    ) -> Result<(), WheelError> {
        if to < 0 {
            return Err(WheelError::TimeBeforeEpoch { time: to });
        }
        if to > self.max_representable_time {
            return Err(WheelError::TimeTooFarInFuture { time: to });
        }
        if to <= self.now {
            return Ok(());
        }
        self.now = to;
        let key = self.interval_num(to);
        self.now_interval_num_start = self.interval_num_start(key);
        self.queue
            .increase_min_allowed_key(key, |h, tv| on_fired(h, tv.at, &tv.value))?;
        self.recompute_alarm_upper_bound();
        Ok(())
    }

    /// Fire (and remove) every alarm scheduled at or before `now()` whose
    /// interval number exactly equals the current floor. This is narrower
    /// than [`TimingWheel::advance_clock`]: it never moves the floor, and
    /// only ever inspects level 0's slot for the current interval, since
    /// `now_interval_num` is always `queue.min_allowed_key()` by
    /// construction and any element holding that exact key must already
    /// reside at level 0.
    pub fn fire_past_alarms(&mut self, mut on_fired: impl FnMut(Handle, i64, &V)) {
        let now_interval_num = self.interval_num(self.now);
        let now = self.now;
        self.queue.drain_matching_in_slot(
            0,
            now_interval_num,
            |tv| tv.at <= now,
            |h, tv| on_fired(h, tv.at, &tv.value),
        );
    }

    /// The interval number of the earliest pending alarm, if any.
    pub fn min_alarm_interval_num(&mut self) -> Option<u64> {
        self.queue.min_key()
    }

    /// The earliest time at which [`TimingWheel::fire_past_alarms`] or
    /// [`TimingWheel::advance_clock`] could possibly fire something: the
    /// start of the interval immediately after the earliest pending alarm's
    /// interval.
    pub fn next_alarm_fires_at(&mut self) -> Option<i64> {
        let key = self.queue.min_key()?;
        Some(self.interval_num_start(key + 1))
    }

    /// Among alarms sharing the single minimum key, the latest `at` value.
    /// Only meaningful within that one slot's worth of elements — not the
    /// whole current interval, which may span multiple keys at a higher
    /// level. `None` if the queue is empty.
    pub fn max_alarm_time_in_min_interval(&mut self) -> Option<i64> {
        let min_key = self.queue.min_key()?;
        self.queue.max_by_key_among(min_key, |tv| tv.at)
    }

    pub fn len(&self) -> u64 {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
