//! Sorted chain with a quick-reference index.
//!
//! The chain is a doubly-linked list of entries kept in ascending identifier
//! order. Entries live in a [`Slab`] arena and link to each other by
//! [`Slot`], so splicing is O(1) once the position is known and no entry is
//! ever aliased mutably.
//!
//! Finding the position is where the index comes in: every `block_size`-th
//! entry of the chain is recorded in a plain `Vec<Slot>`.
//!
//! ```text
//! block_size = 3
//!
//! index:    [0]               [1]               [2]
//!            │                 │                 │
//!            ▼                 ▼                 ▼
//! chain:   (10) ⇄ (20) ⇄ (25) ⇄ (40) ⇄ (50) ⇄ (60) ⇄ (70)
//! pos:       0      1      2      3      4      5      6
//! ```
//!
//! A lookup binary searches the index for the last entry with `id <= target`
//! and walks forward from there. The next index entry is already past the
//! target, so the walk is at most `block_size` steps.
//!
//! # Index Invariant
//!
//! ```text
//! index.len() == ceil(len / block_size)
//! index[j]    == entry at chain position j * block_size
//! ```
//!
//! Inserting at position `p` shifts every entry at position `>= p` one step
//! towards the tail. The entry now at position `j * B` (for `j * B >= p`) is
//! the one that used to sit just before the old `index[j]`, i.e.
//! `prev(index[j])` after the splice. If `p == j * B` that is the new entry
//! itself. When the new length starts a block (`(len - 1) % B == 0`) the tail
//! sits at position `len - 1 == index.len() * B` and is appended.
//!
//! Removing the entry at position `p` shifts every entry after it one step
//! towards the head, so for `j * B >= p` the new anchor is `next(index[j])`,
//! read before the entry is unspliced. The only anchor that can become
//! `NONE` is one that pointed at the old tail, at position `len_old - 1`.
//! Then `j * B == len_new` and truncating the index to `ceil(len_new / B)`
//! drops exactly that entry. No anchor can outlive its entry.
//!
//! Both repairs touch `len / block_size` anchors.

use slab::Slab;
use tracing::debug;

use crate::error::{Error, Result};
use crate::key::Slot;

/// An arena entry: a value, the identifier it was enrolled under, and links.
#[derive(Debug)]
pub(crate) struct Entry<T> {
    pub(crate) value: T,
    pub(crate) id: i64,
    prev: Slot,
    next: Slot,
}

/// Where a seek for an identifier stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Lookup {
    /// First entry with `id >= target`, or `NONE` if every id is smaller.
    pub(crate) slot: Slot,
    /// Chain position of `slot`. Equals the length when `slot` is `NONE`.
    pub(crate) pos: usize,
    /// `slot` holds exactly the target identifier.
    pub(crate) found: bool,
}

/// Ascending chain of entries with a quick-reference index.
///
/// Single-threaded. [`IdList`](crate::IdList) puts one behind a lock.
#[derive(Debug)]
pub(crate) struct Chain<T> {
    slots: Slab<Entry<T>>,
    head: Slot,
    tail: Slot,
    index: Vec<Slot>,
    block_size: usize,
}

impl<T> Chain<T> {
    /// Creates an empty chain.
    ///
    /// `block_size` must be at least 1 (checked by
    /// [`ListConfig::validate`](crate::ListConfig::validate)).
    pub(crate) fn new(block_size: usize, capacity: usize) -> Self {
        debug_assert!(block_size > 0, "block size must be at least 1");
        Self {
            slots: Slab::with_capacity(capacity),
            head: Slot::NONE,
            tail: Slot::NONE,
            index: Vec::with_capacity(capacity.div_ceil(block_size)),
            block_size,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub(crate) fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of quick-reference entries.
    #[inline]
    pub(crate) fn blocks(&self) -> usize {
        self.index.len()
    }

    #[inline]
    fn entry(&self, slot: Slot) -> &Entry<T> {
        &self.slots[slot.as_usize()]
    }

    #[inline]
    fn entry_mut(&mut self, slot: Slot) -> &mut Entry<T> {
        &mut self.slots[slot.as_usize()]
    }

    /// Returns the entry at `slot`, or `None` for `Slot::NONE` / vacant slots.
    #[inline]
    pub(crate) fn get_slot(&self, slot: Slot) -> Option<&Entry<T>> {
        if slot.is_none() {
            return None;
        }
        self.slots.get(slot.as_usize())
    }

    /// Slot of the entry after `slot`, or `NONE` at the tail.
    #[inline]
    pub(crate) fn next_slot(&self, slot: Slot) -> Slot {
        self.get_slot(slot).map_or(Slot::NONE, |entry| entry.next)
    }

    /// Slot of the entry before `slot`, or `NONE` at the head.
    #[inline]
    pub(crate) fn prev_slot(&self, slot: Slot) -> Slot {
        self.get_slot(slot).map_or(Slot::NONE, |entry| entry.prev)
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Locates `id`: binary search over the index, then a bounded walk.
    pub(crate) fn seek(&self, id: i64) -> Lookup {
        if self.head.is_none() {
            return Lookup {
                slot: Slot::NONE,
                pos: 0,
                found: false,
            };
        }

        // Number of anchors with id <= target. The walk starts at the last
        // of them, or at the head when the target precedes every anchor.
        let blocks = self.index.partition_point(|&slot| self.entry(slot).id <= id);
        let (mut current, mut pos) = match blocks {
            0 => (self.head, 0),
            n => (self.index[n - 1], (n - 1) * self.block_size),
        };

        while current.is_some() {
            let entry = self.entry(current);
            if entry.id >= id {
                return Lookup {
                    slot: current,
                    pos,
                    found: entry.id == id,
                };
            }
            current = entry.next;
            pos += 1;
        }

        Lookup {
            slot: Slot::NONE,
            pos,
            found: false,
        }
    }

    /// Returns the slot holding `id`.
    #[inline]
    pub(crate) fn find(&self, id: i64) -> Option<Slot> {
        let lookup = self.seek(id);
        lookup.found.then_some(lookup.slot)
    }

    /// Returns the entry holding `id`.
    #[inline]
    pub(crate) fn get(&self, id: i64) -> Option<&Entry<T>> {
        self.find(id).map(|slot| self.entry(slot))
    }

    /// Returns the lowest entry, read through the first index anchor.
    #[inline]
    pub(crate) fn first(&self) -> Option<&Entry<T>> {
        self.index.first().map(|&slot| self.entry(slot))
    }

    /// Returns the highest entry.
    #[inline]
    pub(crate) fn last(&self) -> Option<&Entry<T>> {
        self.get_slot(self.tail)
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Inserts `value` under `id` at its sorted position.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateId`] if `id` is already present.
    /// - [`Error::Reserve`] if the index could not grow.
    ///
    /// The chain is unchanged on error.
    pub(crate) fn insert(&mut self, value: T, id: i64) -> Result<Slot> {
        let lookup = self.seek(id);
        if lookup.found {
            return Err(Error::DuplicateId { id });
        }

        // A new block starts with this entry: make room for its anchor first.
        if self.len() % self.block_size == 0 {
            self.index.try_reserve(1)?;
        }

        let slot = Slot::from_usize(self.slots.insert(Entry {
            value,
            id,
            prev: Slot::NONE,
            next: Slot::NONE,
        }));

        if lookup.slot.is_none() {
            self.link_back(slot);
        } else {
            self.link_before(lookup.slot, slot);
        }

        let first = lookup.pos.div_ceil(self.block_size);
        let slots = &self.slots;
        for anchor in &mut self.index[first..] {
            *anchor = slots[anchor.as_usize()].prev;
        }

        if (self.len() - 1) % self.block_size == 0 {
            self.index.push(self.tail);
            debug!(
                blocks = self.index.len(),
                len = self.len(),
                "quick-reference index grew"
            );
        }

        Ok(slot)
    }

    /// Removes the entry holding `id`.
    pub(crate) fn remove(&mut self, id: i64) -> Option<Entry<T>> {
        let lookup = self.seek(id);
        if !lookup.found {
            return None;
        }
        Some(self.remove_at(lookup))
    }

    /// Removes the entry a successful [`seek`](Self::seek) stopped at.
    pub(crate) fn remove_at(&mut self, lookup: Lookup) -> Entry<T> {
        debug_assert!(lookup.found, "remove_at requires a found lookup");

        let first = lookup.pos.div_ceil(self.block_size);
        let slots = &self.slots;
        for anchor in &mut self.index[first..] {
            *anchor = slots[anchor.as_usize()].next;
        }

        self.unlink(lookup.slot);
        let entry = self.slots.remove(lookup.slot.as_usize());

        let blocks = self.len().div_ceil(self.block_size);
        if blocks < self.index.len() {
            self.index.truncate(blocks);
            debug!(blocks, len = self.len(), "quick-reference index shrank");
        }

        entry
    }

    /// Removes every entry, returning the values in chain order.
    pub(crate) fn clear(&mut self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.len());
        let mut current = self.head;
        while current.is_some() {
            let entry = self.slots.remove(current.as_usize());
            current = entry.next;
            values.push(entry.value);
        }

        self.head = Slot::NONE;
        self.tail = Slot::NONE;
        self.index.clear();
        values
    }

    // ========================================================================
    // Link operations
    // ========================================================================

    fn link_back(&mut self, slot: Slot) {
        let tail = self.tail;
        let entry = self.entry_mut(slot);
        entry.prev = tail;
        entry.next = Slot::NONE;

        if tail.is_some() {
            self.entry_mut(tail).next = slot;
        } else {
            self.head = slot;
        }

        self.tail = slot;
    }

    fn link_before(&mut self, before: Slot, slot: Slot) {
        let prev = self.entry(before).prev;
        let entry = self.entry_mut(slot);
        entry.next = before;
        entry.prev = prev;

        self.entry_mut(before).prev = slot;

        if prev.is_some() {
            self.entry_mut(prev).next = slot;
        } else {
            self.head = slot;
        }
    }

    fn unlink(&mut self, slot: Slot) {
        let entry = self.entry(slot);
        let prev = entry.prev;
        let next = entry.next;

        if prev.is_some() {
            self.entry_mut(prev).next = next;
        } else {
            self.head = next;
        }

        if next.is_some() {
            self.entry_mut(next).prev = prev;
        } else {
            self.tail = prev;
        }

        let entry = self.entry_mut(slot);
        entry.prev = Slot::NONE;
        entry.next = Slot::NONE;
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Iterates `(id, value)` pairs in ascending order.
    #[inline]
    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            slots: &self.slots,
            front: self.head,
            back: self.tail,
        }
    }

    /// Identifiers of the index anchors, in order.
    pub(crate) fn index_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.index.iter().map(|&slot| self.entry(slot).id)
    }

    /// Panics unless links, ordering and the index invariant all hold.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let mut prev = Slot::NONE;
        let mut current = self.head;
        let mut pos = 0;
        let mut last_id: Option<i64> = None;

        while current.is_some() {
            let entry = self.entry(current);
            assert_eq!(entry.prev, prev, "broken prev link at position {pos}");
            if let Some(last_id) = last_id {
                assert!(last_id < entry.id, "chain not ascending at position {pos}");
            }
            if pos % self.block_size == 0 {
                assert_eq!(
                    self.index.get(pos / self.block_size),
                    Some(&current),
                    "index anchor {} misplaced",
                    pos / self.block_size
                );
            }
            last_id = Some(entry.id);
            prev = current;
            current = entry.next;
            pos += 1;
        }

        assert_eq!(pos, self.len(), "chain length disagrees with arena");
        assert_eq!(self.tail, prev, "tail is not the last entry");
        assert_eq!(
            self.index.len(),
            self.len().div_ceil(self.block_size),
            "index length"
        );
    }
}

/// Iterator over `(id, &value)` in ascending order.
pub(crate) struct Iter<'a, T> {
    slots: &'a Slab<Entry<T>>,
    front: Slot,
    back: Slot,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (i64, &'a T);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front.is_none() {
            return None;
        }

        let entry = &self.slots[self.front.as_usize()];

        // Check if we've met in the middle
        if self.front == self.back {
            self.front = Slot::NONE;
            self.back = Slot::NONE;
        } else {
            self.front = entry.next;
        }

        Some((entry.id, &entry.value))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.back.is_none() {
            return None;
        }

        let entry = &self.slots[self.back.as_usize()];

        if self.front == self.back {
            self.front = Slot::NONE;
            self.back = Slot::NONE;
        } else {
            self.back = entry.prev;
        }

        Some((entry.id, &entry.value))
    }
}
