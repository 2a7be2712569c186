//! FixedTable: chained hashing over a bucket array that never resizes.

use crate::bucket::BucketArray;
use crate::chain::{self, Chain};
use crate::error::{Result, TableError};
use crate::node::{Linked, NodeStore};
use crate::policy::MAX_BITS;
use crate::table::HashIndex;

/// Chained hash table with `2^bits` buckets for its whole life.
///
/// Chains grow without bound as elements are added; pick `bits` for the
/// expected population.
#[derive(Debug)]
pub struct FixedTable<K> {
    buckets: BucketArray<K>,
    count: usize,
}

impl<K: Copy + Eq> FixedTable<K> {
    /// Table with `2^bits` buckets. Nothing is allocated until the first insert.
    pub fn new(bits: u32) -> Result<Self> {
        if bits > MAX_BITS {
            return Err(TableError::TooManyBits {
                bits,
                limit: MAX_BITS,
            });
        }
        Ok(Self {
            buckets: BucketArray::unallocated(bits),
            count: 0,
        })
    }

    pub fn bits(&self) -> u32 {
        self.buckets.bits()
    }
}

impl<K: Copy + Eq + core::fmt::Debug> HashIndex for FixedTable<K> {
    type Key = K;

    fn insert<S>(&mut self, store: &mut S, key: K, hash: u32)
    where
        S: NodeStore<Key = K> + ?Sized,
    {
        self.buckets.allocate();
        chain::push_front(self.buckets.head_mut(hash), store, key, hash);
        self.count += 1;
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
        self.count = 0;
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
