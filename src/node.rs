//! Intrusive link and the caller-owned storage it lives in.
//!
//! Elements never move into a table. Each element embeds one [`Node`] and
//! stays in storage the caller owns (a `SlotMap`, a `Vec`, ...). Tables only
//! hold stable keys into that storage and rewrite the links inside the
//! embedded nodes.

use core::fmt;
use slotmap::{DenseSlotMap, Key, SlotMap};

/// Link embedded inside every indexed element.
///
/// A detached node has no successor and no back-reference. While linked,
/// `data` holds the key of the element that owns the node and `hash` caches
/// the hash it was inserted with.
pub struct Node<K> {
    pub(crate) next: Option<K>,
    pub(crate) hash: u32,
    pub(crate) data: Option<K>,
}

impl<K> Node<K> {
    /// A detached node.
    pub const fn new() -> Self {
        Self {
            next: None,
            hash: 0,
            data: None,
        }
    }

    /// Hash cached at insertion time. Meaningless while detached.
    #[inline]
    pub fn hash(&self) -> u32 {
        self.hash
    }

    #[inline]
    pub fn is_linked(&self) -> bool {
        self.data.is_some()
    }

    #[inline]
    pub(crate) fn attach(&mut self, key: K, hash: u32, next: Option<K>) {
        self.next = next;
        self.hash = hash;
        self.data = Some(key);
    }

    /// Clears the link and returns the back-reference.
    #[inline]
    pub(crate) fn detach(&mut self) -> Option<K> {
        self.next = None;
        self.data.take()
    }
}

impl<K: Copy> Node<K> {
    /// Back-reference to the owning element, `None` while detached.
    #[inline]
    pub fn data(&self) -> Option<K> {
        self.data
    }
}

impl<K> Default for Node<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for Node<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("next", &self.next)
            .field("hash", &self.hash)
            .field("data", &self.data)
            .finish()
    }
}

/// Implemented by element types that embed a [`Node`].
pub trait Linked<K> {
    fn link(&self) -> &Node<K>;
    fn link_mut(&mut self) -> &mut Node<K>;
}

/// Caller-owned element storage addressed by stable keys.
///
/// Looking up a key that is not present is a caller bug and panics, the same
/// way slice indexing does.
pub trait NodeStore {
    type Key: Copy + Eq + fmt::Debug;
    type Elem: Linked<Self::Key>;

    fn elem(&self, key: Self::Key) -> &Self::Elem;
    fn elem_mut(&mut self, key: Self::Key) -> &mut Self::Elem;

    #[inline]
    fn node(&self, key: Self::Key) -> &Node<Self::Key> {
        self.elem(key).link()
    }

    #[inline]
    fn node_mut(&mut self, key: Self::Key) -> &mut Node<Self::Key> {
        self.elem_mut(key).link_mut()
    }
}

macro_rules! slotmap_store {
    ($map:ident) => {
        impl<K: Key, T: Linked<K>> NodeStore for $map<K, T> {
            type Key = K;
            type Elem = T;

            #[inline]
            fn elem(&self, key: K) -> &T {
                &self[key]
            }

            #[inline]
            fn elem_mut(&mut self, key: K) -> &mut T {
                &mut self[key]
            }
        }
    };
}

slotmap_store!(SlotMap);
slotmap_store!(DenseSlotMap);

impl<T: Linked<usize>> NodeStore for [T] {
    type Key = usize;
    type Elem = T;

    #[inline]
    fn elem(&self, key: usize) -> &T {
        &self[key]
    }

    #[inline]
    fn elem_mut(&mut self, key: usize) -> &mut T {
        &mut self[key]
    }
}

impl<T: Linked<usize>> NodeStore for Vec<T> {
    type Key = usize;
    type Elem = T;

    #[inline]
    fn elem(&self, key: usize) -> &T {
        &self[key]
    }

    #[inline]
    fn elem_mut(&mut self, key: usize) -> &mut T {
        &mut self[key]
    }
}
