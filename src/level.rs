//! One rung of the multi-level radix-sorted priority queue.
//!
//! A [`Level`] owns an array of slot heads — weak references into the
//! element pool, present iff the element they name is live — plus the bit
//! arithmetic that decides which slot a given key belongs to. This mirrors
//! how `r3_kernel`'s `task::readyqueue::BitmapQueue` pairs an array of
//! per-priority list heads with O(1) "find the first non-empty one"
//! bookkeeping; here the analogous bookkeeping is the level's own
//! `min_allowed_key`/`max_allowed_key` pair rather than a bitmap, since a
//! level's slots are consulted by key, not by priority scan.

/// One level of the priority queue.
pub(crate) struct Level {
    /// `b_i`: the number of key bits this level distinguishes.
    pub(crate) bits: u32,
    /// `Σ_{j<i} b_j`: the number of low-order key bits this level ignores
    /// (they vary within a single slot).
    pub(crate) bits_per_slot: u32,
    /// `2^bits - 1`.
    pub(crate) slots_mask: u64,
    /// `2^bits_per_slot`: the width, in keys, of a single slot.
    pub(crate) keys_per_slot: u64,
    /// `2^(bits + bits_per_slot)`: the total key span this level covers.
    pub(crate) num_allowed_keys: u64,
    pub(crate) min_allowed_key: u64,
    pub(crate) max_allowed_key: u64,
    /// Number of live elements currently stored at this level.
    pub(crate) length: u64,
    /// `2^bits` slot heads. `Some(index)` names the head of a circular
    /// doubly-linked list in the owning pool; `None` means the slot is
    /// empty.
    pub(crate) slots: Vec<Option<u32>>,
}

impl Level {
    /// Build the `i`-th level given its own bit width and the cumulative
    /// floor handed down from the levels below it (0 at construction time;
    /// [`crate::queue::Queue::increase_min_allowed_key`] is what moves it
    /// afterward).
    ///
    /// `max_representable` is the queue-wide fixed ceiling (`2^(Σ level
    /// bits) - 1`). The naive `min_allowed_key + num_allowed_keys - 1`
    /// computation overshoots it at the top level by construction (the top
    /// level's own `num_allowed_keys` already equals the full key space,
    /// `2^(Σ level bits)`, so adding any nonzero floor pushes the raw max
    /// past the ceiling) — so the result is always clamped down to it.
    pub(crate) fn new(bits: u32, bits_per_slot: u32, floor: u64, max_representable: u64) -> Self {
        let keys_per_slot = 1u64 << bits_per_slot;
        let num_allowed_keys = 1u64 << (bits + bits_per_slot);
        let min_allowed_key = floor - (floor % keys_per_slot);
        let max_allowed_key = (min_allowed_key + num_allowed_keys - 1).min(max_representable);
        Self {
            bits,
            bits_per_slot,
            slots_mask: (1u64 << bits) - 1,
            keys_per_slot,
            num_allowed_keys,
            min_allowed_key,
            max_allowed_key,
            length: 0,
            slots: vec![None; 1usize << bits],
        }
    }

    /// The slot a live element with this key would be filed under, assuming
    /// `key` falls within `[min_allowed_key, max_allowed_key]`.
    #[inline]
    pub(crate) fn slot_of(&self, key: u64) -> usize {
        (((key >> self.bits_per_slot) & self.slots_mask)) as usize
    }

    /// The smallest key that maps to the same slot as `key` (clears the low
    /// `bits_per_slot` bits).
    #[inline]
    pub(crate) fn min_key_in_same_slot(&self, key: u64) -> u64 {
        key & !(self.keys_per_slot - 1)
    }

    /// Circular successor of `slot`.
    #[inline]
    pub(crate) fn next_slot(&self, slot: usize) -> usize {
        (slot + 1) & (self.slots_mask as usize)
    }
}
