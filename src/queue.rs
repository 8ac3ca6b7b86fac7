//! A priority queue over non-negative integer keys, implemented as a lazy
//! multi-level radix sort.
//!
//! Insertion and removal are O(1): an element is filed into the lowest level
//! whose current window covers its key, linked into that level's slot as
//! the tail of a circular doubly-linked list. Advancing the floor
//! ([`Queue::increase_min_allowed_key`]) is O(number of slots visited), not
//! O(number of elements) — the whole point of the structure, traded against
//! giving up a strict total order among keys that land in the same slot.
//!
//! This plays the role `r3_kernel`'s `utils::binary_heap::BinaryHeap` plays
//! for `timeout.rs`: the ordered container the timed-event layer sits on
//! top of. Unlike a binary heap, though, a radix-sorted level structure has
//! no O(log n) rebalancing step — the cost of a clock advance is bounded by
//! how many slots it crosses, not by how many elements are queued behind
//! them.

use crate::error::QueueError;
use crate::level::Level;
use crate::pool::{Handle, Pool};

/// One stored (key, value) pair plus the intrusive list pointers that thread
/// it into its level's slot list.
struct Element<V> {
    key: u64,
    level_index: usize,
    /// Raw pool index of the previous element in this slot's circular list.
    /// For a singleton list, `prev == next ==` this element's own index.
    prev: u32,
    next: u32,
    value: V,
}

/// A non-negative-integer-keyed priority queue with O(1) add/remove/
/// change-key and O(Δ) floor advancement.
///
/// Keys must stay within a bounded window above the current minimum — this
/// is not a general-purpose priority queue. See [`Queue::add`] and
/// [`Queue::increase_min_allowed_key`].
pub struct Queue<V> {
    pool: Pool<Element<V>>,
    levels: Vec<Level>,
    length: u64,
    /// The fixed ceiling on any key this queue can ever hold:
    /// `2^(Σ level_bits) - 1`, computed once at construction (spec.md §3's
    /// `max_representable`). Every level's `max_allowed_key` is clamped to
    /// this value, never to a value derived from a prior call's already-
    /// computed bound — see `Level::new` and `increase_min_allowed_key`.
    max_representable: u64,
    /// Cache of the minimum-keyed element. `Some(h)` only if `h` is live and
    /// its key equals `elt_key_lower_bound`.
    min_elt: Option<Handle>,
    /// A lower bound (not necessarily tight) on the key of every live
    /// element.
    elt_key_lower_bound: u64,
}

impl<V> Queue<V> {
    /// Build an empty queue whose levels are laid out per `level_bits`, with
    /// the floor starting at zero.
    pub(crate) fn with_level_bits(level_bits: &[u32]) -> Self {
        debug_assert!(!level_bits.is_empty());
        let total_bits: u32 = level_bits.iter().sum();
        debug_assert!(total_bits <= 61, "level bits exceed the 61-bit key budget");
        let max_representable = (1u64 << total_bits) - 1;

        let mut levels = Vec::with_capacity(level_bits.len());
        let mut floor = 0u64;
        let mut bits_per_slot = 0u32;
        for &bits in level_bits {
            let level = Level::new(bits, bits_per_slot, floor, max_representable);
            floor = level.max_allowed_key + 1;
            bits_per_slot += bits;
            levels.push(level);
        }
        Self {
            pool: Pool::new(),
            levels,
            length: 0,
            max_representable,
            min_elt: None,
            elt_key_lower_bound: 0,
        }
    }

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> u64 {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The current lower bound of the representable key window
    /// (`level[0].min_allowed_key`).
    #[inline]
    pub fn min_allowed_key(&self) -> u64 {
        self.levels[0].min_allowed_key
    }

    /// The fixed upper bound of the representable key window:
    /// `2^(Σ level_bits) - 1`. See `DESIGN.md` for why this crate tightens
    /// the "overshoot, then clamp on read" behavior the source material
    /// flags as an open question, rather than reproducing it: every level's
    /// stored `max_allowed_key` is itself clamped to this same fixed value,
    /// so reading it back here never needs a second clamp.
    #[inline]
    pub fn max_allowed_key(&self) -> u64 {
        debug_assert_eq!(
            self.levels.last().expect("at least one level").max_allowed_key,
            self.max_representable,
            "top level's max_allowed_key must always equal the fixed ceiling"
        );
        self.max_representable
    }

    /// True iff `h` currently names a live element.
    #[inline]
    pub fn contains(&self, h: Handle) -> bool {
        self.pool.is_valid(h)
    }

    pub fn get(&self, h: Handle) -> Result<&V, QueueError> {
        self.pool.get(h).map(|e| &e.value).ok_or(QueueError::InvalidHandle)
    }

    pub fn get_mut(&mut self, h: Handle) -> Result<&mut V, QueueError> {
        self.pool.get_mut(h).map(|e| &mut e.value).ok_or(QueueError::InvalidHandle)
    }

    pub fn key_of(&self, h: Handle) -> Result<u64, QueueError> {
        self.pool.get(h).map(|e| e.key).ok_or(QueueError::InvalidHandle)
    }

    fn find_level_for_key(&self, key: u64) -> Option<usize> {
        self.levels.iter().position(|level| key <= level.max_allowed_key)
    }

    /// Add `value` under `key`, returning a stable handle.
    ///
    /// # Errors
    ///
    /// [`QueueError::KeyOutOfBounds`] if `key` falls outside
    /// `[min_allowed_key, max_allowed_key]`.
    pub fn add(&mut self, key: u64, value: V) -> Result<Handle, QueueError> {
        let min = self.min_allowed_key();
        let max = self.max_allowed_key();
        if key < min || key > max {
            return Err(QueueError::KeyOutOfBounds { key, min, max });
        }
        let level_index = self
            .find_level_for_key(key)
            .expect("key was just checked to be <= the top level's max_allowed_key");
        debug_assert!(
            key >= self.levels[level_index].min_allowed_key,
            "inter-level window invariant violated: no level claims key {key}"
        );

        let was_empty = self.length == 0;
        let index = self.pool.insert(Element {
            key,
            level_index,
            prev: 0,
            next: 0,
            value,
        });
        self.link_into_level(level_index, key, index.raw_index());
        self.levels[level_index].length += 1;
        self.length += 1;

        if was_empty || key < self.elt_key_lower_bound {
            self.elt_key_lower_bound = key;
            self.min_elt = Some(index);
        }

        Ok(index)
    }

    /// Remove `h`, returning its value. No-op data is left behind: the slot
    /// is freed and every cache referring to it is invalidated.
    pub fn remove(&mut self, h: Handle) -> Result<V, QueueError> {
        if !self.pool.is_valid(h) {
            return Err(QueueError::InvalidHandle);
        }
        let level_index = self.pool.get(h).expect("validated above").level_index;
        self.unlink_from_level(level_index, h.raw_index());
        self.levels[level_index].length -= 1;
        self.length -= 1;
        if self.min_elt == Some(h) {
            self.min_elt = None;
        }
        Ok(self.pool.remove(h))
    }

    /// Change `h`'s key, possibly relocating it to a different level.
    /// Element identity (the handle) is preserved.
    pub fn change_key(&mut self, h: Handle, new_key: u64) -> Result<(), QueueError> {
        if !self.pool.is_valid(h) {
            return Err(QueueError::InvalidHandle);
        }
        let min = self.min_allowed_key();
        let max = self.max_allowed_key();
        if new_key < min || new_key > max {
            return Err(QueueError::KeyOutOfBounds { key: new_key, min, max });
        }

        let old_level_index = self.pool.get(h).expect("validated above").level_index;
        self.unlink_from_level(old_level_index, h.raw_index());
        self.levels[old_level_index].length -= 1;

        let new_level_index = self
            .find_level_for_key(new_key)
            .expect("new_key was just checked against the global window");
        debug_assert!(new_key >= self.levels[new_level_index].min_allowed_key);

        {
            let e = self.pool.get_raw_mut(h.raw_index());
            e.key = new_key;
            e.level_index = new_level_index;
        }
        self.link_into_level(new_level_index, new_key, h.raw_index());
        self.levels[new_level_index].length += 1;

        if self.min_elt == Some(h) {
            // The cached minimum may no longer be the minimum once its key
            // has moved; force a rescan next time it's asked for.
            self.min_elt = None;
        }
        if new_key < self.elt_key_lower_bound {
            self.elt_key_lower_bound = new_key;
            self.min_elt = Some(h);
        }

        Ok(())
    }

    /// The element with the minimum key, or `None` if empty. Amortized O(1)
    /// thanks to the `min_elt` cache; a cache miss costs time proportional
    /// to the number of slots between the floor and the true minimum.
    pub fn min_elt(&mut self) -> Option<Handle> {
        if self.length == 0 {
            return None;
        }
        if let Some(h) = self.min_elt {
            return Some(h);
        }
        let (key, index) = self.scan_for_min_elt()?;
        let h = self.pool.handle_of_raw(index);
        self.min_elt = Some(h);
        self.elt_key_lower_bound = key;
        Some(h)
    }

    pub fn min_key(&mut self) -> Option<u64> {
        let h = self.min_elt()?;
        Some(self.pool.get(h).expect("min_elt always names a live element").key)
    }

    fn scan_for_min_elt(&self) -> Option<(u64, u32)> {
        let mut best: Option<(u64, u32)> = None;
        for level in &self.levels {
            if level.length == 0 {
                continue;
            }
            if let Some((best_key, _)) = best {
                if level.min_allowed_key >= best_key {
                    break;
                }
            }
            let start_key = level.min_allowed_key.max(self.elt_key_lower_bound);
            let mut slot = level.slot_of(start_key);
            let mut slot_min_key = level.min_key_in_same_slot(start_key);
            for _ in 0..level.slots.len() {
                if let Some((best_key, _)) = best {
                    if slot_min_key >= best_key {
                        break;
                    }
                }
                if let Some(head) = level.slots[slot] {
                    let mut index = head;
                    loop {
                        let e = self.pool.get_raw(index);
                        if best.map_or(true, |(best_key, _)| e.key < best_key) {
                            best = Some((e.key, index));
                        }
                        index = e.next;
                        if index == head {
                            break;
                        }
                    }
                }
                slot = level.next_slot(slot);
                slot_min_key += level.keys_per_slot;
            }
        }
        best
    }

    /// Raise the floor to `k`, evicting every element whose key is now below
    /// it and refiling every survivor to the lowest level that can hold it.
    /// `k <= min_allowed_key` is a no-op.
    ///
    /// This is the operation the lazy radix sort exists for: cost is
    /// bounded by the number of slots crossed at each level, not by the
    /// number of elements stored.
    pub fn increase_min_allowed_key(
        &mut self,
        k: u64,
        mut on_evicted: impl FnMut(Handle, &V),
    ) -> Result<(), QueueError> {
        let max_representable = self.max_representable;
        if k > max_representable {
            return Err(QueueError::KeyTooLarge { key: k, max_representable });
        }
        if k <= self.levels[0].min_allowed_key {
            return Ok(());
        }

        let mut max_floor_so_far = k;
        for i in 0..self.levels.len() {
            let keys_per_slot = self.levels[i].keys_per_slot;
            let cur_min = self.levels[i].min_allowed_key;
            let candidate = max_floor_so_far - (max_floor_so_far % keys_per_slot);
            if candidate == cur_min {
                break;
            }
            log::debug!("queue: level {i} floor {cur_min} -> {candidate}");

            if self.levels[i].length != 0 {
                let mut floor = cur_min;
                let mut slot = self.levels[i].slot_of(cur_min);
                while floor < candidate {
                    if let Some(head) = std::mem::take(&mut self.levels[i].slots[slot]) {
                        let mut members = Vec::new();
                        let mut index = head;
                        loop {
                            members.push(index);
                            let next = self.pool.get_raw(index).next;
                            if next == head {
                                break;
                            }
                            index = next;
                        }
                        log::trace!("queue: level {i} slot {slot} draining {} element(s)", members.len());
                        self.levels[i].length -= members.len() as u64;
                        for index in members {
                            let key = self.pool.get_raw(index).key;
                            if key < k {
                                self.length -= 1;
                                let h = self.pool.handle_of_raw(index);
                                on_evicted(h, &self.pool.get_raw(index).value);
                                if self.min_elt == Some(h) {
                                    self.min_elt = None;
                                }
                                self.pool.remove_raw(index);
                            } else {
                                let new_level = self
                                    .find_level_for_key(key)
                                    .expect("key was live, so it still fits the global window");
                                self.pool.get_raw_mut(index).level_index = new_level;
                                self.link_into_level(new_level, key, index);
                                self.levels[new_level].length += 1;
                            }
                        }
                    }
                    floor += keys_per_slot;
                    slot = self.levels[i].next_slot(slot);
                }
            }

            self.levels[i].min_allowed_key = candidate;
            self.levels[i].max_allowed_key =
                (candidate + self.levels[i].num_allowed_keys - 1).min(max_representable);
            max_floor_so_far = self.levels[i].max_allowed_key + 1;
        }

        if k > self.elt_key_lower_bound {
            self.min_elt = None;
            self.elt_key_lower_bound = k;
        }

        Ok(())
    }

    /// Visit every live element exactly once, in unspecified order. `f` must
    /// not mutate the queue.
    pub fn iter<F: FnMut(Handle, &V)>(&self, mut f: F) {
        for level in &self.levels {
            if level.length == 0 {
                continue;
            }
            for &slot_head in &level.slots {
                if let Some(head) = slot_head {
                    let mut index = head;
                    loop {
                        let e = self.pool.get_raw(index);
                        f(self.pool.handle_of_raw(index), &e.value);
                        let next = e.next;
                        if next == head {
                            break;
                        }
                        index = next;
                    }
                }
            }
        }
    }

    /// Free every element. Every level keeps its current
    /// `min_allowed_key`/`max_allowed_key`; only membership is reset.
    pub fn clear(&mut self) {
        for level in &mut self.levels {
            for slot in &mut level.slots {
                *slot = None;
            }
            level.length = 0;
        }
        self.pool.clear();
        self.length = 0;
        self.min_elt = None;
        self.elt_key_lower_bound = self.levels[0].min_allowed_key;
    }

    /// Fold over every live element whose key equals exactly `key` (not
    /// merely sharing a slot with it — a slot at level `i > 0` can span many
    /// distinct keys), in the slot's insertion order.
    pub(crate) fn max_by_key_among<T: Ord + Copy>(
        &self,
        key: u64,
        f: impl Fn(&V) -> T,
    ) -> Option<T> {
        let level_index = self.find_level_for_key(key)?;
        let slot = self.levels[level_index].slot_of(key);
        let head = self.levels[level_index].slots[slot]?;
        let mut best: Option<T> = None;
        let mut index = head;
        loop {
            let e = self.pool.get_raw(index);
            if e.key == key {
                let v = f(&e.value);
                best = Some(match best {
                    Some(b) if b >= v => b,
                    _ => v,
                });
            }
            index = e.next;
            if index == head {
                break;
            }
        }
        best
    }

    /// Remove every live element at level `level_index`'s slot for `key`
    /// that satisfies `matches`, in slot order, reporting each to
    /// `on_evicted` before freeing it. Elements that don't match are
    /// relinked into the same slot, preserving their relative order.
    pub(crate) fn drain_matching_in_slot(
        &mut self,
        level_index: usize,
        key: u64,
        mut matches: impl FnMut(&V) -> bool,
        mut on_evicted: impl FnMut(Handle, &V),
    ) {
        let slot = self.levels[level_index].slot_of(key);
        let head = match std::mem::take(&mut self.levels[level_index].slots[slot]) {
            Some(head) => head,
            None => return,
        };
        let mut members = Vec::new();
        let mut index = head;
        loop {
            members.push(index);
            let next = self.pool.get_raw(index).next;
            if next == head {
                break;
            }
            index = next;
        }
        self.levels[level_index].length -= members.len() as u64;

        for index in members {
            let elem_key = self.pool.get_raw(index).key;
            if matches(&self.pool.get_raw(index).value) {
                let h = self.pool.handle_of_raw(index);
                on_evicted(h, &self.pool.get_raw(index).value);
                self.length -= 1;
                if self.min_elt == Some(h) {
                    self.min_elt = None;
                }
                self.pool.remove_raw(index);
            } else {
                self.link_into_level(level_index, elem_key, index);
                self.levels[level_index].length += 1;
            }
        }
    }

    fn link_into_level(&mut self, level_index: usize, key: u64, index: u32) {
        let slot = self.levels[level_index].slot_of(key);
        match self.levels[level_index].slots[slot] {
            None => {
                let e = self.pool.get_raw_mut(index);
                e.prev = index;
                e.next = index;
                self.levels[level_index].slots[slot] = Some(index);
            }
            Some(head) => {
                let tail = self.pool.get_raw(head).prev;
                self.pool.get_raw_mut(tail).next = index;
                self.pool.get_raw_mut(index).prev = tail;
                self.pool.get_raw_mut(index).next = head;
                self.pool.get_raw_mut(head).prev = index;
            }
        }
    }

    fn unlink_from_level(&mut self, level_index: usize, index: u32) {
        let (prev, next, key) = {
            let e = self.pool.get_raw(index);
            (e.prev, e.next, e.key)
        };
        let slot = self.levels[level_index].slot_of(key);
        if prev == index {
            self.levels[level_index].slots[slot] = None;
        } else {
            self.pool.get_raw_mut(prev).next = next;
            self.pool.get_raw_mut(next).prev = prev;
            if self.levels[level_index].slots[slot] == Some(index) {
                self.levels[level_index].slots[slot] = Some(next);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_queue() -> Queue<&'static str> {
        Queue::with_level_bits(&[2, 2])
    }

    #[test]
    fn add_then_remove_restores_length() {
        let mut q = small_queue();
        let h = q.add(3, "x").unwrap();
        assert_eq!(q.len(), 1);
        q.remove(h).unwrap();
        assert_eq!(q.len(), 0);
        assert!(!q.contains(h));
    }

    #[test]
    fn add_rejects_out_of_bounds_key() {
        // level_bits [2, 2]: the fixed ceiling is 2^4 - 1 = 15 (spec.md
        // scenario 4), not the 19 a naive per-level width sum would give.
        let mut q = small_queue();
        let max = q.max_allowed_key();
        assert_eq!(max, 15);
        assert!(q.add(15, "in-bounds").is_ok());
        assert_eq!(
            q.add(16, "x"),
            Err(QueueError::KeyOutOfBounds { key: 16, min: 0, max: 15 })
        );
    }

    #[test]
    fn min_key_cache_invalidates_on_removal_of_minimum() {
        let mut q = small_queue();
        // level bits [2, 2]: level 0 covers 0..=3, level 1 covers 4..=15.
        let h100 = q.add(12, "a").unwrap();
        let _h50 = q.add(8, "b").unwrap();
        let _h200 = q.add(15, "c").unwrap();
        assert_eq!(q.min_key(), Some(8));
        q.remove(_h50).unwrap();
        assert_eq!(q.min_key(), Some(12));
        let _ = h100;
    }

    #[test]
    fn change_key_twice_matches_single_change() {
        let mut q = small_queue();
        let h = q.add(1, "x").unwrap();
        q.change_key(h, 2).unwrap();
        q.change_key(h, 3).unwrap();
        assert_eq!(q.key_of(h), Ok(3));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn refiling_across_levels_on_floor_raise() {
        // level bits [2, 2]: level 0 handles 0..=3, level 1 handles 4..=15.
        let mut q = Queue::with_level_bits(&[2, 2]);
        let h1 = q.add(1, "evicted").unwrap();
        let h5 = q.add(5, "survives-to-level0").unwrap();
        let h9 = q.add(9, "stays-level1-a").unwrap();
        let h13 = q.add(13, "stays-level1-b").unwrap();

        let mut evicted = Vec::new();
        q.increase_min_allowed_key(4, |_h, v| evicted.push(*v)).unwrap();

        assert_eq!(evicted, vec!["evicted"]);
        assert_eq!(q.len(), 3);
        assert_eq!(q.min_allowed_key(), 4);
        assert!(!q.contains(h1));
        assert_eq!(q.key_of(h5), Ok(5));
        assert_eq!(q.key_of(h9), Ok(9));
        assert_eq!(q.key_of(h13), Ok(13));
    }

    #[test]
    fn increase_min_allowed_key_is_noop_below_floor() {
        let mut q = small_queue();
        q.add(2, "x").unwrap();
        let mut called = false;
        q.increase_min_allowed_key(0, |_, _| called = true).unwrap();
        assert!(!called);
        assert_eq!(q.min_allowed_key(), 0);
    }

    #[test]
    fn clear_resets_membership_but_not_level_bounds() {
        let mut q = small_queue();
        q.add(1, "x").unwrap();
        let min_before = q.min_allowed_key();
        q.clear();
        assert_eq!(q.len(), 0);
        assert_eq!(q.min_allowed_key(), min_before);
    }

    #[test]
    fn iter_visits_every_live_element_once() {
        let mut q = small_queue();
        q.add(1, "a").unwrap();
        q.add(2, "b").unwrap();
        q.add(9, "c").unwrap();
        let mut seen = Vec::new();
        q.iter(|_, v| seen.push(*v));
        seen.sort_unstable();
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[test]
    fn within_slot_insertion_order_is_preserved() {
        let mut q = small_queue();
        q.add(1, "first").unwrap();
        q.add(1, "second").unwrap();
        q.add(1, "third").unwrap();
        let mut order = Vec::new();
        q.increase_min_allowed_key(2, |_, v| order.push(*v)).unwrap();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    // Property-based model check, in the style of `r3_kernel`'s
    // `prio_bitmap::test_inner`: interpret a fuzzed byte string as a
    // sequence of operations, apply each in lockstep to the real `Queue`
    // and to a naive `BTreeMap`-backed reference, and assert the two never
    // disagree about what the current minimum is.
    mod model_check {
        use super::*;
        use quickcheck_macros::quickcheck;
        use std::collections::BTreeMap;

        const WINDOW_BITS: &[u32] = &[3, 3, 3];

        #[derive(Debug)]
        enum Cmd {
            Add(u64),
            RemoveOldest,
            RaiseFloor(u64),
        }

        fn interpret(bytecode: &[u8], max_key: u64) -> impl Iterator<Item = Cmd> + '_ {
            let mut i = 0;
            std::iter::from_fn(move || {
                let instr = bytecode.get(i..i + 5)?;
                i += 5;
                let value = u32::from_le_bytes([instr[1], instr[2], instr[3], instr[4]]) as u64;
                Some(match instr[0] % 3 {
                    0 => Cmd::Add(value % (max_key + 1)),
                    1 => Cmd::RemoveOldest,
                    _ => Cmd::RaiseFloor(value % (max_key + 1)),
                })
            })
        }

        /// A reference priority queue with the same add/remove-min/raise-
        /// floor vocabulary, built from a plain sorted map instead of a
        /// radix structure.
        struct Reference {
            by_key: BTreeMap<u64, Vec<u32>>,
            next_id: u32,
            floor: u64,
        }

        impl Reference {
            fn new() -> Self {
                Self { by_key: BTreeMap::new(), next_id: 0, floor: 0 }
            }
            fn add(&mut self, key: u64) -> u32 {
                let id = self.next_id;
                self.next_id += 1;
                self.by_key.entry(key).or_default().push(id);
                id
            }
            fn min_key(&self) -> Option<u64> {
                self.by_key.iter().find(|(_, ids)| !ids.is_empty()).map(|(k, _)| *k)
            }
            fn remove_oldest(&mut self) {
                if let Some((&key, _)) = self.by_key.iter().find(|(_, ids)| !ids.is_empty()) {
                    let ids = self.by_key.get_mut(&key).unwrap();
                    ids.remove(0);
                }
            }
            fn raise_floor(&mut self, k: u64) {
                if k <= self.floor {
                    return;
                }
                self.floor = k;
                self.by_key.retain(|&key, ids| key >= k || ids.is_empty());
            }
        }

        fn test_inner(bytecode: Vec<u8>) {
            let _ = env_logger::try_init();
            let total_bits: u32 = WINDOW_BITS.iter().sum();
            let max_key = (1u64 << total_bits) - 1;
            let mut subject: Queue<u32> = Queue::with_level_bits(WINDOW_BITS);
            let mut reference = Reference::new();
            let mut handles: Vec<Handle> = Vec::new();

            for cmd in interpret(&bytecode, max_key) {
                log::trace!("{cmd:?}");
                match cmd {
                    Cmd::Add(key) => {
                        if key >= subject.min_allowed_key() && key <= subject.max_allowed_key() {
                            let h = subject.add(key, reference.next_id).unwrap();
                            reference.add(key);
                            handles.push(h);
                        }
                    }
                    Cmd::RemoveOldest => {
                        if let Some(h) = subject.min_elt() {
                            subject.remove(h).unwrap();
                            reference.remove_oldest();
                            handles.retain(|&x| x != h);
                        }
                    }
                    Cmd::RaiseFloor(k) => {
                        if k <= subject.max_allowed_key() {
                            subject.increase_min_allowed_key(k, |_, _| {}).unwrap();
                            reference.raise_floor(k);
                            handles.retain(|&h| subject.contains(h));
                        }
                    }
                }
                assert_eq!(subject.min_key(), reference.min_key());
            }
        }

        #[quickcheck]
        fn matches_reference_model(bytecode: Vec<u8>) {
            test_inner(bytecode);
        }
    }
}
