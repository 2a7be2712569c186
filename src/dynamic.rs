//! DynamicTable: chained hashing with stop-the-world doubling and halving.
//!
//! Every resize relinks all elements in a single pass inside the `insert`
//! or `remove` call that triggered it, so that call costs O(n). Use
//! [`IncrementalTable`](crate::IncrementalTable) when that latency spike
//! matters.

use crate::bucket::BucketArray;
use crate::chain::{self, Chain};
use crate::error::{Result, TableError};
use crate::node::{Linked, NodeStore};
use crate::policy::ResizePolicy;
use crate::table::HashIndex;
use log::debug;

#[derive(Debug)]
pub struct DynamicTable<K> {
    buckets: BucketArray<K>,
    count: usize,
    // element count of an outstanding reservation, 0 when none
    reserved: usize,
    policy: ResizePolicy,
}

impl<K: Copy + Eq> DynamicTable<K> {
    /// Empty table with the default policy (16 buckets minimum, grow above
    /// 1/2, shrink below 1/8). Does not allocate.
    pub fn new() -> Self {
        Self::with_policy(ResizePolicy::default())
    }

    pub fn with_policy(policy: ResizePolicy) -> Self {
        Self {
            buckets: BucketArray::unallocated(policy.min_bits()),
            count: 0,
            reserved: 0,
            policy,
        }
    }

    pub fn policy(&self) -> &ResizePolicy {
        &self.policy
    }

    pub fn bits(&self) -> u32 {
        self.buckets.bits()
    }

    /// Pre-sizes the table so the next `additional` inserts do not resize.
    ///
    /// Shrinking is suspended until the element count reaches the reserved
    /// total. Unlike implicit growth, allocation failure is reported instead
    /// of aborting. The table is unchanged on error.
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
        let bits = self
            .policy
            .bits_for(requested)
            .ok_or(TableError::CapacityOverflow { requested })?;
        if bits > self.buckets.bits() || !self.buckets.is_allocated() {
            let bits = bits.max(self.buckets.bits());
            debug!(
                "reserving {} buckets for {} elements",
                1usize << bits,
                requested
            );
            self.buckets.try_rehash(store, bits)?;
        }
        if requested > self.count {
            self.reserved = requested;
        }
        Ok(())
    }

    fn resize<S>(&mut self, store: &mut S, bits: u32)
    where
        S: NodeStore<Key = K> + ?Sized,
    {
        debug!(
            "resizing from {} to {} buckets ({} elements)",
            self.buckets.len(),
            1usize << bits,
            self.count
        );
        self.buckets.rehash(store, bits);
    }

    fn shrink_step<S>(&mut self, store: &mut S)
    where
        S: NodeStore<Key = K> + ?Sized,
    {
        let bits = self.buckets.bits();
        if self.reserved == 0
            && bits > self.policy.min_bits()
            && self.policy.should_shrink(self.count, self.buckets.len())
        {
            self.resize(store, bits - 1);
        }
    }
}

impl<K: Copy + Eq> Default for DynamicTable<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + core::fmt::Debug> HashIndex for DynamicTable<K> {
    type Key = K;

    fn insert<S>(&mut self, store: &mut S, key: K, hash: u32)
    where
        S: NodeStore<Key = K> + ?Sized,
    {
        self.buckets.allocate();
        let bits = self.buckets.bits();
        if bits < self.policy.max_bits() && self.policy.should_grow(self.count, self.buckets.len()) {
            self.resize(store, bits + 1);
        }
        chain::push_front(self.buckets.head_mut(hash), store, key, hash);
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
        chain::find(self.buckets.head(hash), store, hash, eq)
    }

    fn remove<S, F>(&mut self, store: &mut S, hash: u32, mut eq: F) -> Option<K>
    where
        S: NodeStore<Key = K> + ?Sized,
        F: FnMut(&S::Elem) -> bool,
    {
        if !self.buckets.is_allocated() {
            return None;
        }
        let found = chain::unlink_by(self.buckets.head_mut(hash), store, |_, e| {
            e.link().hash() == hash && eq(e)
        })?;
        self.count -= 1;
        self.shrink_step(store);
        Some(found)
    }

    fn remove_existing<S>(&mut self, store: &mut S, key: K) -> Option<K>
    where
        S: NodeStore<Key = K> + ?Sized,
    {
        let node = store.node(key);
        if !node.is_linked() || !self.buckets.is_allocated() {
            return None;
        }
        let hash = node.hash();
        let data = chain::unlink_by(self.buckets.head_mut(hash), store, |k, _| k == key)?;
        self.count -= 1;
        self.shrink_step(store);
        Some(data)
    }

    fn bucket<'a, S>(&self, store: &'a S, hash: u32) -> Chain<'a, S>
    where
        S: NodeStore<Key = K> + ?Sized,
    {
        self.buckets.chain(store, hash)
    }

    fn for_each<S, F>(&self, store: &S, mut f: F)
    where
        S: NodeStore<Key = K> + ?Sized,
        F: FnMut(K, &S::Elem),
    {
        for head in self.buckets.heads() {
            for k in Chain::new(store, Some(head)) {
                f(k, store.elem(k));
            }
        }
    }

    fn clear<S>(&mut self, store: &mut S)
    where
        S: NodeStore<Key = K> + ?Sized,
    {
        let detached = self.buckets.clear(store);
        debug_assert_eq!(detached, self.count);
        self.buckets = BucketArray::unallocated(self.policy.min_bits());
        self.count = 0;
        self.reserved = 0;
    }

    fn len(&self) -> usize {
        self.count
    }

    fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn memory_usage(&self) -> usize {
        self.buckets.memory_usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::policy::LoadFactor;

    #[derive(Debug)]
    struct Item {
        node: Node<usize>,
        id: u32,
    }

    impl Linked<usize> for Item {
        fn link(&self) -> &Node<usize> {
            &self.node
        }
        fn link_mut(&mut self) -> &mut Node<usize> {
            &mut self.node
        }
    }

    fn store(n: u32) -> Vec<Item> {
        (0..n)
            .map(|id| Item {
                node: Node::new(),
                id,
            })
            .collect()
    }

    /// Invariant: from 16 buckets, 9 distinct inserts stay at 16 and the
    /// 10th doubles the array.
    #[test]
    fn grows_on_tenth_insert() {
        let mut s = store(10);
        let mut t: DynamicTable<usize> = DynamicTable::new();
        assert_eq!(t.bucket_count(), 16);
        assert_eq!(t.memory_usage(), 0);
        for k in 0..9 {
            t.insert(&mut s, k, k as u32);
        }
        assert_eq!(t.bucket_count(), 16);
        t.insert(&mut s, 9, 9);
        assert_eq!(t.bucket_count(), 32);
        assert_eq!(t.len(), 10);
        for k in 0..10 {
            assert_eq!(t.search(&s, k as u32, |e| e.id == k as u32), Some(k));
        }
    }

    /// Invariant: shrinking back to the minimum never goes below it, and the
    /// grow/shrink band does not oscillate at its edges.
    #[test]
    fn shrinks_back_to_minimum() {
        let mut s = store(100);
        let mut t: DynamicTable<usize> = DynamicTable::new();
        for k in 0..100 {
            t.insert(&mut s, k, k as u32);
        }
        assert_eq!(t.bucket_count(), 256);
        let mut sizes = vec![t.bucket_count()];
        for k in (1..100).rev() {
            assert_eq!(t.remove_existing(&mut s, k), Some(k));
            if *sizes.last().unwrap() != t.bucket_count() {
                sizes.push(t.bucket_count());
            }
        }
        assert_eq!(t.len(), 1);
        assert_eq!(t.bucket_count(), 16);
        assert_eq!(sizes, vec![256, 128, 64, 32, 16]);
        assert_eq!(t.search(&s, 0, |e| e.id == 0), Some(0));
    }

    /// Invariant: a resize preserves the LIFO order of equal hashes.
    #[test]
    fn resize_preserves_chain_order() {
        let mut s = store(40);
        let mut t: DynamicTable<usize> = DynamicTable::new();
        t.insert(&mut s, 0, 77);
        t.insert(&mut s, 1, 77);
        for k in 2..40 {
            t.insert(&mut s, k, 1000 + k as u32);
        }
        assert!(t.bucket_count() > 16);
        assert_eq!(t.search(&s, 77, |_| true), Some(1));
        assert_eq!(t.remove(&mut s, 77, |_| true), Some(1));
        assert_eq!(t.remove(&mut s, 77, |_| true), Some(0));
    }

    /// Invariant: reserve pre-sizes so the reserved inserts cause no resize.
    #[test]
    fn reserve_avoids_growth() {
        let mut s = store(1000);
        let mut t: DynamicTable<usize> = DynamicTable::new();
        t.reserve(&mut s, 1000).unwrap();
        let buckets = t.bucket_count();
        assert_eq!(buckets, 2048);
        for k in 0..1000 {
            t.insert(&mut s, k, (k as u32).wrapping_mul(2_654_435_761));
        }
        assert_eq!(t.bucket_count(), buckets);
    }

    /// Invariant: removes between `reserve` and the reserved inserts do not
    /// shrink; filling the reservation lifts the suspension.
    #[test]
    fn reserve_survives_interleaved_removes() {
        let mut s = store(1000);
        let mut t: DynamicTable<usize> = DynamicTable::new();
        t.reserve(&mut s, 1000).unwrap();
        t.insert(&mut s, 0, 0);
        t.insert(&mut s, 1, 1);
        assert_eq!(t.remove_existing(&mut s, 1), Some(1));
        assert_eq!(t.bucket_count(), 2048);
        for k in 1..1000 {
            t.insert(&mut s, k, k as u32);
        }
        assert_eq!(t.bucket_count(), 2048);
        for k in 1..1000 {
            assert_eq!(t.remove_existing(&mut s, k), Some(k));
        }
        assert_eq!(t.bucket_count(), 16);
    }

    /// Invariant: reserve past max_bits fails without touching the table.
    #[test]
    fn reserve_overflow_is_reported() {
        let policy = ResizePolicy::new(2, 4, LoadFactor::HALF, LoadFactor::EIGHTH).unwrap();
        let mut s = store(4);
        let mut t: DynamicTable<usize> = DynamicTable::with_policy(policy);
        t.insert(&mut s, 0, 0);
        assert_eq!(
            t.reserve(&mut s, 100),
            Err(TableError::CapacityOverflow { requested: 101 })
        );
        assert_eq!(t.bucket_count(), 4);
        assert_eq!(t.len(), 1);
    }

    /// Invariant: growth stops at max_bits; inserts keep succeeding.
    #[test]
    fn growth_capped_at_max_bits() {
        let policy = ResizePolicy::new(1, 3, LoadFactor::HALF, LoadFactor::EIGHTH).unwrap();
        let mut s = store(50);
        let mut t: DynamicTable<usize> = DynamicTable::with_policy(policy);
        for k in 0..50 {
            t.insert(&mut s, k, k as u32);
        }
        assert_eq!(t.bucket_count(), 8);
        for k in 0..50 {
            assert_eq!(t.search(&s, k as u32, |_| true), Some(k));
        }
    }
}
