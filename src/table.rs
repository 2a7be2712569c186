//! Operation surface shared by every table variant.

use crate::chain::Chain;
use crate::node::NodeStore;

/// Keyed index over elements that live in a caller-owned [`NodeStore`].
///
/// The three implementations ([`FixedTable`](crate::FixedTable),
/// [`DynamicTable`](crate::DynamicTable) and
/// [`IncrementalTable`](crate::IncrementalTable)) share this contract and
/// differ only in how and when bucket storage is resized. Resizing never
/// changes the result of any call.
///
/// Every method takes the store explicitly. The same store must be passed
/// for the whole lifetime of the table's contents.
pub trait HashIndex {
    type Key: Copy + Eq;

    /// Links the element at `key` under `hash`. The element must not be
    /// linked into any table.
    fn insert<S>(&mut self, store: &mut S, key: Self::Key, hash: u32)
    where
        S: NodeStore<Key = Self::Key> + ?Sized;

    /// First element with this hash that `eq` accepts. Among equal elements
    /// the most recently inserted one is found first.
    fn search<S, F>(&self, store: &S, hash: u32, eq: F) -> Option<Self::Key>
    where
        S: NodeStore<Key = Self::Key> + ?Sized,
        F: FnMut(&S::Elem) -> bool;

    /// Like [`search`](Self::search), then unlinks the match.
    fn remove<S, F>(&mut self, store: &mut S, hash: u32, eq: F) -> Option<Self::Key>
    where
        S: NodeStore<Key = Self::Key> + ?Sized,
        F: FnMut(&S::Elem) -> bool;

    /// Unlinks an element the caller already holds. Chains are singly
    /// linked, so this scans the element's bucket for its predecessor.
    ///
    /// Returns the node's back-reference, or `None` if the element was not
    /// linked into this table.
    fn remove_existing<S>(&mut self, store: &mut S, key: Self::Key) -> Option<Self::Key>
    where
        S: NodeStore<Key = Self::Key> + ?Sized;

    /// The chain holding every element with this hash. It may hold
    /// elements with other hashes too.
    fn bucket<'a, S>(&self, store: &'a S, hash: u32) -> Chain<'a, S>
    where
        S: NodeStore<Key = Self::Key> + ?Sized;

    /// Visits every linked element, bucket by bucket.
    fn for_each<S, F>(&self, store: &S, f: F)
    where
        S: NodeStore<Key = Self::Key> + ?Sized,
        F: FnMut(Self::Key, &S::Elem);

    /// Detaches every element and releases bucket storage.
    fn clear<S>(&mut self, store: &mut S)
    where
        S: NodeStore<Key = Self::Key> + ?Sized;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of addressable buckets.
    fn bucket_count(&self) -> usize;

    /// Bytes held by bucket storage. Elements belong to the caller and are
    /// not counted.
    fn memory_usage(&self) -> usize;
}
