//! IncrementalTable: linear hashing with one-bucket resize steps.
//!
//! Design
//! - Buckets live in blocks of 1, 1, 2, 4, 8, ... slots. Bucket `p` is in
//!   block 0 when `p == 0` and in block `ilog2(p) + 1` otherwise, so growing
//!   never moves existing buckets and never needs one large allocation.
//! - `level` is the address width every bucket has reached; `split` counts
//!   how many buckets of that level have already been split into
//!   `p` and `p + 2^level`. Active buckets: `2^level + split`.
//! - Addressing: take `hash` at width `level + 1`; if that bucket is not
//!   active yet, fall back to width `level`.
//! - Growth splits the bucket at `split` and advances it; shrinking merges
//!   the last active bucket back into its sibling and retreats it. Each step
//!   touches one chain, so each call relinks a bounded number of buckets.
//! - With the default thresholds growth keeps `count <= active / 2`, so
//!   steady inserts past the threshold split two buckets per insert. Steady
//!   removes merge up to eight.
//! - `reserve` suspends shrinking until the reserved elements have been
//!   inserted, so removes in between never undo the pre-split buckets.
//!
//! Invariant (once allocated): `blocks.len() == level + 1 + (split > 0)`.

use crate::bucket::alloc_slots;
use crate::chain::{self, Chain};
use crate::error::{Result, TableError};
use crate::node::{Linked, NodeStore};
use crate::policy::{mask, ResizePolicy};
use crate::table::HashIndex;
use core::mem;
use log::trace;
use std::collections::TryReserveError;

#[derive(Debug)]
pub struct IncrementalTable<K> {
    blocks: Vec<Box<[Option<K>]>>,
    level: u32,
    split: usize,
    count: usize,
    // element count of an outstanding reservation, 0 when none
    reserved: usize,
    policy: ResizePolicy,
}

/// Block and offset of bucket position `pos`.
#[inline]
fn locate(pos: usize) -> (usize, usize) {
    if pos == 0 {
        (0, 0)
    } else {
        let log = pos.ilog2();
        (log as usize + 1, pos - (1usize << log))
    }
}

#[inline]
fn block_len(block: usize) -> usize {
    if block == 0 {
        1
    } else {
        1usize << (block - 1)
    }
}

fn empty_block<K: Copy>(len: usize) -> Box<[Option<K>]> {
    vec![None; len].into_boxed_slice()
}

fn try_empty_block<K: Copy>(len: usize) -> core::result::Result<Box<[Option<K>]>, TryReserveError> {
    Ok(alloc_slots(len)?.into_boxed_slice())
}

impl<K: Copy + Eq> IncrementalTable<K> {
    /// Empty table with the default policy. Does not allocate.
    pub fn new() -> Self {
        Self::with_policy(ResizePolicy::default())
    }

    pub fn with_policy(policy: ResizePolicy) -> Self {
        Self {
            blocks: Vec::new(),
            level: policy.min_bits(),
            split: 0,
            count: 0,
            reserved: 0,
            policy,
        }
    }

    pub fn policy(&self) -> &ResizePolicy {
        &self.policy
    }

    /// Address width all buckets have reached.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Number of buckets of the current level already split.
    pub fn split_index(&self) -> usize {
        self.split
    }

    /// Bucket position that holds every element with this hash.
    #[inline]
    pub fn bucket_index(&self, hash: u32) -> usize {
        let low = (hash & mask(self.level)) as usize;
        if self.split == 0 {
            return low;
        }
        // split > 0 implies level < max_bits
        let high = (hash & mask(self.level + 1)) as usize;
        if high < self.active() {
            high
        } else {
            low
        }
    }

    #[inline]
    fn active(&self) -> usize {
        (1usize << self.level) + self.split
    }

    #[inline]
    fn slot(&self, pos: usize) -> Option<K> {
        let (b, off) = locate(pos);
        self.blocks.get(b).and_then(|blk| blk[off])
    }

    #[inline]
    fn slot_mut(&mut self, pos: usize) -> &mut Option<K> {
        let (b, off) = locate(pos);
        &mut self.blocks[b][off]
    }

    fn allocate(&mut self) {
        if self.blocks.is_empty() {
            self.blocks = (0..=self.level as usize)
                .map(|b| empty_block(block_len(b)))
                .collect();
            self.split = 0;
        }
    }

    /// Splits bucket `split` into itself and `split + 2^level`.
    fn split_step<S>(&mut self, store: &mut S)
    where
        S: NodeStore<Key = K> + ?Sized,
    {
        let half = 1usize << self.level;
        if self.blocks.len() < self.level as usize + 2 {
            // first split of this level needs the next block
            self.blocks.push(empty_block(half));
        }
        let lo = self.split;
        let head = self.slot_mut(lo).take();
        let (keep, moved) = chain::split(head, store, half as u32);
        *self.slot_mut(lo) = keep;
        *self.slot_mut(lo + half) = moved;

        self.split += 1;
        if self.split == half {
            self.level += 1;
            self.split = 0;
            trace!("incremental table reached level {} ({} buckets)", self.level, self.active());
        }
    }

    /// Merges the last active bucket back into its sibling.
    fn merge_step<S>(&mut self, store: &mut S)
    where
        S: NodeStore<Key = K> + ?Sized,
    {
        if self.split == 0 {
            self.level -= 1;
            self.split = 1usize << self.level;
            trace!("incremental table fell back to level {}", self.level);
        }
        let half = 1usize << self.level;
        self.split -= 1;
        let lo = self.split;
        let moved = self.slot_mut(lo + half).take();
        chain::append(self.slot_mut(lo), store, moved);
        if self.split == 0 {
            self.blocks.pop();
        }
    }

    fn grow<S>(&mut self, store: &mut S)
    where
        S: NodeStore<Key = K> + ?Sized,
    {
        while self.can_grow() && self.policy.should_grow(self.count, self.active()) {
            self.split_step(store);
        }
    }

    fn shrink<S>(&mut self, store: &mut S)
    where
        S: NodeStore<Key = K> + ?Sized,
    {
        if self.reserved > 0 {
            return;
        }
        while self.active() > (1usize << self.policy.min_bits())
            && self.policy.should_shrink(self.count, self.active())
        {
            self.merge_step(store);
        }
    }

    #[inline]
    fn can_grow(&self) -> bool {
        self.level < self.policy.max_bits()
    }

    /// Pre-splits so the next `additional` inserts perform no split step.
    ///
    /// Shrinking is suspended until the element count reaches the reserved
    /// total, so removes in between keep the pre-split buckets.
    ///
    /// New blocks go through fallible reservation. On failure the table is
    /// consistent and keeps the buckets split so far.
    pub fn reserve<S>(&mut self, store: &mut S, additional: usize) -> Result<()>
    where
        S: NodeStore<Key = K> + ?Sized,
    {
        let requested = self
            .count
            .checked_add(additional)
            .ok_or(TableError::CapacityOverflow {
                requested: usize::MAX,
            })?;
        let buckets = self
            .policy
            .grow()
            .buckets_for(requested)
            .max(1u128 << self.policy.min_bits());
        if buckets > 1u128 << self.policy.max_bits() {
            return Err(TableError::CapacityOverflow { requested });
        }
        self.allocate();
        while (self.active() as u128) < buckets {
            if self.split == 0 {
                self.blocks.push(try_empty_block(1usize << self.level)?);
            }
            self.split_step(store);
        }
        if requested > self.count {
            self.reserved = requested;
        }
        Ok(())
    }
}

impl<K: Copy + Eq> Default for IncrementalTable<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + core::fmt::Debug> HashIndex for IncrementalTable<K> {
    type Key = K;

    fn insert<S>(&mut self, store: &mut S, key: K, hash: u32)
    where
        S: NodeStore<Key = K> + ?Sized,
    {
        self.allocate();
        self.grow(store);
        let pos = self.bucket_index(hash);
        chain::push_front(self.slot_mut(pos), store, key, hash);
        self.count += 1;
        if self.count >= self.reserved {
            self.reserved = 0;
        }
    }

    fn search<S, F>(&self, store: &S, hash: u32, eq: F) -> Option<K>
    where
        S: NodeStore<Key = K> + ?Sized,
        F: FnMut(&S::Elem) -> bool,
    {
        chain::find(self.slot(self.bucket_index(hash)), store, hash, eq)
    }

    fn remove<S, F>(&mut self, store: &mut S, hash: u32, mut eq: F) -> Option<K>
    where
        S: NodeStore<Key = K> + ?Sized,
        F: FnMut(&S::Elem) -> bool,
    {
        if self.blocks.is_empty() {
            return None;
        }
        let pos = self.bucket_index(hash);
        let found = chain::unlink_by(self.slot_mut(pos), store, |_, e| {
            e.link().hash() == hash && eq(e)
        })?;
        self.count -= 1;
        self.shrink(store);
        Some(found)
    }

    fn remove_existing<S>(&mut self, store: &mut S, key: K) -> Option<K>
    where
        S: NodeStore<Key = K> + ?Sized,
    {
        let node = store.node(key);
        if !node.is_linked() || self.blocks.is_empty() {
            return None;
        }
        let pos = self.bucket_index(node.hash());
        let data = chain::unlink_by(self.slot_mut(pos), store, |k, _| k == key)?;
        self.count -= 1;
        self.shrink(store);
        Some(data)
    }

    fn bucket<'a, S>(&self, store: &'a S, hash: u32) -> Chain<'a, S>
    where
        S: NodeStore<Key = K> + ?Sized,
    {
        Chain::new(store, self.slot(self.bucket_index(hash)))
    }

    fn for_each<S, F>(&self, store: &S, mut f: F)
    where
        S: NodeStore<Key = K> + ?Sized,
        F: FnMut(K, &S::Elem),
    {
        for head in self.blocks.iter().flat_map(|b| b.iter()).filter_map(|h| *h) {
            for k in Chain::new(store, Some(head)) {
                f(k, store.elem(k));
            }
        }
    }

    fn clear<S>(&mut self, store: &mut S)
    where
        S: NodeStore<Key = K> + ?Sized,
    {
        let blocks = mem::take(&mut self.blocks);
        let detached: usize = blocks
            .iter()
            .flat_map(|b| b.iter())
            .map(|h| chain::detach_all(*h, store))
            .sum();
        debug_assert_eq!(detached, self.count);
        self.level = self.policy.min_bits();
        self.split = 0;
        self.count = 0;
        self.reserved = 0;
    }

    fn len(&self) -> usize {
        self.count
    }

    fn bucket_count(&self) -> usize {
        self.active()
    }

    fn memory_usage(&self) -> usize {
        let slots: usize = self.blocks.iter().map(|b| b.len()).sum();
        slots * mem::size_of::<Option<K>>() + self.blocks.capacity() * mem::size_of::<Box<[Option<K>]>>()
    }
}
