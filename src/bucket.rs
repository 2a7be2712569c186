//! Contiguous power-of-two bucket array used by the fixed and dynamic tables.

use crate::chain::{self, Chain};
use crate::node::NodeStore;
use crate::policy::mask;
use core::mem;
use std::collections::TryReserveError;

/// Chain heads addressed by `hash & mask`.
///
/// The array is logically `2^bits` buckets wide from construction but is
/// only allocated on first use.
#[derive(Debug)]
pub(crate) struct BucketArray<K> {
    slots: Vec<Option<K>>,
    bits: u32,
    mask: u32,
}

pub(crate) fn alloc_slots<K: Copy>(len: usize) -> Result<Vec<Option<K>>, TryReserveError> {
    let mut slots = Vec::new();
    slots.try_reserve_exact(len)?;
    slots.resize(len, None);
    Ok(slots)
}

impl<K: Copy + Eq> BucketArray<K> {
    pub(crate) const fn unallocated(bits: u32) -> Self {
        Self {
            slots: Vec::new(),
            bits,
            mask: 0,
        }
    }

    #[inline]
    pub(crate) fn bits(&self) -> u32 {
        self.bits
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        1usize << self.bits
    }

    #[inline]
    pub(crate) fn is_allocated(&self) -> bool {
        !self.slots.is_empty()
    }

    pub(crate) fn memory_usage(&self) -> usize {
        self.slots.capacity() * mem::size_of::<Option<K>>()
    }

    #[inline]
    fn index(&self, hash: u32) -> usize {
        (hash & self.mask) as usize
    }

    /// Allocates the logical width if not done yet. Aborts on allocation
    /// failure like any other `Vec` growth.
    pub(crate) fn allocate(&mut self) {
        if !self.is_allocated() {
            self.slots = vec![None; self.len()];
            self.mask = mask(self.bits);
        }
    }

    #[inline]
    pub(crate) fn head(&self, hash: u32) -> Option<K> {
        self.slots.get(self.index(hash)).copied().flatten()
    }

    /// Head slot for `hash`. The array must be allocated.
    #[inline]
    pub(crate) fn head_mut(&mut self, hash: u32) -> &mut Option<K> {
        let i = self.index(hash);
        &mut self.slots[i]
    }

    pub(crate) fn chain<'a, S>(&self, store: &'a S, hash: u32) -> Chain<'a, S>
    where
        S: NodeStore<Key = K> + ?Sized,
    {
        Chain::new(store, self.head(hash))
    }

    pub(crate) fn heads(&self) -> impl Iterator<Item = K> + '_ {
        self.slots.iter().filter_map(|h| *h)
    }

    /// Relinks every element into a fresh array of width `bits`, then drops
    /// the old array.
    pub(crate) fn rehash<S>(&mut self, store: &mut S, bits: u32)
    where
        S: NodeStore<Key = K> + ?Sized,
    {
        let slots = vec![None; 1usize << bits];
        self.relink(store, slots, bits);
    }

    /// Like [`rehash`](Self::rehash) but reports allocation failure. On
    /// error the table is left untouched.
    pub(crate) fn try_rehash<S>(&mut self, store: &mut S, bits: u32) -> Result<(), TryReserveError>
    where
        S: NodeStore<Key = K> + ?Sized,
    {
        let slots = alloc_slots(1usize << bits)?;
        self.relink(store, slots, bits);
        Ok(())
    }

    fn relink<S>(&mut self, store: &mut S, mut slots: Vec<Option<K>>, bits: u32)
    where
        S: NodeStore<Key = K> + ?Sized,
    {
        let new_mask = mask(bits);
        let old = mem::replace(&mut self.slots, Vec::new());
        for head in old {
            // push_front reverses, so walk each chain back to front
            let mut cur = chain::reverse(head, store);
            while let Some(k) = cur {
                let node = store.node_mut(k);
                cur = node.next;
                let slot = &mut slots[(node.hash & new_mask) as usize];
                node.next = *slot;
                *slot = Some(k);
            }
        }
        self.slots = slots;
        self.bits = bits;
        self.mask = new_mask;
    }

    /// Detaches every element and releases the array. Returns how many
    /// elements were detached.
    pub(crate) fn clear<S>(&mut self, store: &mut S) -> usize
    where
        S: NodeStore<Key = K> + ?Sized,
    {
        let old = mem::take(&mut self.slots);
        self.mask = 0;
        old.into_iter().map(|head| chain::detach_all(head, store)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TableError;

    /// Invariant: a slot request the allocator cannot satisfy surfaces as
    /// `TableError::Alloc` instead of aborting.
    #[test]
    fn oversized_allocation_is_reported() {
        let err = alloc_slots::<usize>(usize::MAX).unwrap_err();
        assert!(matches!(TableError::from(err), TableError::Alloc(_)));
    }
}
