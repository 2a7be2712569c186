//! Singly linked bucket chains threaded through caller storage.
//!
//! A chain is identified by its head key; every other link lives in the
//! `next` field of an embedded [`Node`](crate::Node). There are no back
//! pointers, so unlinking an arbitrary element scans for its predecessor.

use crate::node::NodeStore;

/// Iterator over the keys of one bucket chain, head first.
pub struct Chain<'a, S: NodeStore + ?Sized> {
    store: &'a S,
    cur: Option<S::Key>,
}

impl<'a, S: NodeStore + ?Sized> Chain<'a, S> {
    pub(crate) fn new(store: &'a S, head: Option<S::Key>) -> Self {
        Self { store, cur: head }
    }
}

impl<'a, S: NodeStore + ?Sized> Iterator for Chain<'a, S> {
    type Item = S::Key;

    #[inline]
    fn next(&mut self) -> Option<S::Key> {
        let k = self.cur?;
        self.cur = self.store.node(k).next;
        Some(k)
    }
}

impl<'a, S: NodeStore + ?Sized> Clone for Chain<'a, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            cur: self.cur,
        }
    }
}

/// Links `key` in front of `head`.
#[inline]
pub(crate) fn push_front<S>(head: &mut Option<S::Key>, store: &mut S, key: S::Key, hash: u32)
where
    S: NodeStore + ?Sized,
{
    let node = store.node_mut(key);
    debug_assert!(!node.is_linked(), "element {:?} is already linked", key);
    node.attach(key, hash, head.take());
    *head = Some(key);
}

/// First element whose cached hash matches and that `eq` accepts.
#[inline]
pub(crate) fn find<S, F>(head: Option<S::Key>, store: &S, hash: u32, mut eq: F) -> Option<S::Key>
where
    S: NodeStore + ?Sized,
    F: FnMut(&S::Elem) -> bool,
{
    let mut cur = head;
    while let Some(k) = cur {
        let elem = store.elem(k);
        let node = store.node(k);
        // cached hash first: a bucket holds many hash values
        if node.hash == hash && eq(elem) {
            return Some(k);
        }
        cur = node.next;
    }
    None
}

/// Unlinks the first element accepted by `pred` and detaches its node.
pub(crate) fn unlink_by<S, F>(head: &mut Option<S::Key>, store: &mut S, mut pred: F) -> Option<S::Key>
where
    S: NodeStore + ?Sized,
    F: FnMut(S::Key, &S::Elem) -> bool,
{
    let mut prev: Option<S::Key> = None;
    let mut cur = *head;
    while let Some(k) = cur {
        let next = store.node(k).next;
        if pred(k, store.elem(k)) {
            match prev {
                None => *head = next,
                Some(p) => store.node_mut(p).next = next,
            }
            return store.node_mut(k).detach();
        }
        prev = cur;
        cur = next;
    }
    None
}

/// Partitions a chain on `bit`: elements whose hash has the bit clear stay
/// in the first chain, the others move to the second. Relative order is
/// preserved in both.
pub(crate) fn split<S>(head: Option<S::Key>, store: &mut S, bit: u32) -> (Option<S::Key>, Option<S::Key>)
where
    S: NodeStore + ?Sized,
{
    let mut heads: [Option<S::Key>; 2] = [None, None];
    let mut tails: [Option<S::Key>; 2] = [None, None];
    let mut cur = head;
    while let Some(k) = cur {
        let node = store.node_mut(k);
        cur = node.next.take();
        let side = usize::from(node.hash & bit != 0);
        match tails[side] {
            None => heads[side] = Some(k),
            Some(t) => store.node_mut(t).next = Some(k),
        }
        tails[side] = Some(k);
    }
    (heads[0], heads[1])
}

/// Appends `other` at the tail of `head`.
pub(crate) fn append<S>(head: &mut Option<S::Key>, store: &mut S, other: Option<S::Key>)
where
    S: NodeStore + ?Sized,
{
    if other.is_none() {
        return;
    }
    let Some(mut tail) = *head else {
        *head = other;
        return;
    };
    while let Some(n) = store.node(tail).next {
        tail = n;
    }
    store.node_mut(tail).next = other;
}

/// Reverses a chain in place and returns the new head.
pub(crate) fn reverse<S>(head: Option<S::Key>, store: &mut S) -> Option<S::Key>
where
    S: NodeStore + ?Sized,
{
    let mut out: Option<S::Key> = None;
    let mut cur = head;
    while let Some(k) = cur {
        let node = store.node_mut(k);
        cur = node.next;
        node.next = out;
        out = Some(k);
    }
    out
}

/// Detaches every node of a chain.
pub(crate) fn detach_all<S>(head: Option<S::Key>, store: &mut S) -> usize
where
    S: NodeStore + ?Sized,
{
    let mut n = 0;
    let mut cur = head;
    while let Some(k) = cur {
        let node = store.node_mut(k);
        cur = node.next;
        node.detach();
        n += 1;
    }
    n
}
