#![cfg(test)]

// Property tests for the three table variants, kept inside the crate next
// to the unit tests so they run with the same crate-level test harness.

use crate::node::{Linked, Node};
use crate::policy::{LoadFactor, ResizePolicy};
use crate::{DynamicTable, FixedTable, HashIndex, IncrementalTable};
use proptest::prelude::*;
use slotmap::{DefaultKey, SlotMap};
use std::collections::BTreeSet;

#[derive(Debug)]
struct Elem {
    node: Node<DefaultKey>,
    id: usize,
}

impl Linked<DefaultKey> for Elem {
    fn link(&self) -> &Node<DefaultKey> {
        &self.node
    }
    fn link_mut(&mut self) -> &mut Node<DefaultKey> {
        &mut self.node
    }
}

// Pool-indexed operations: indices shrink towards earlier elements.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize),
    Remove(usize),
    RemoveAny(usize),
    RemoveExisting(usize),
    Search(usize),
    SearchAny(usize),
    Iterate,
}

// Hash pool mixes a tiny range (forced collisions) with arbitrary values.
fn arb_scenario() -> impl Strategy<Value = (Vec<u32>, Vec<Op>)> {
    proptest::collection::vec(prop_oneof![0u32..4, any::<u32>()], 1..=48).prop_flat_map(|hashes| {
        let idx = 0..hashes.len();
        let op = prop_oneof![
            4 => idx.clone().prop_map(Op::Insert),
            2 => idx.clone().prop_map(Op::Remove),
            1 => idx.clone().prop_map(Op::RemoveAny),
            2 => idx.clone().prop_map(Op::RemoveExisting),
            2 => idx.clone().prop_map(Op::Search),
            1 => idx.clone().prop_map(Op::SearchAny),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..300).prop_map(move |ops| (hashes.clone(), ops))
    })
}

/// Most recently inserted live element with this hash.
fn newest_with_hash(live: &[usize], hashes: &[u32], hash: u32) -> Option<usize> {
    live.iter().rev().copied().find(|&i| hashes[i] == hash)
}

// Model: the list of linked element ids in insertion order. Every call on
// the table must agree with it, whatever resizes happen in between.
fn run_against_model<T>(mut sut: T, hashes: &[u32], ops: &[Op]) -> Result<T, TestCaseError>
where
    T: HashIndex<Key = DefaultKey>,
{
    let mut store: SlotMap<DefaultKey, Elem> = SlotMap::new();
    let keys: Vec<DefaultKey> = (0..hashes.len())
        .map(|id| store.insert(Elem { node: Node::new(), id }))
        .collect();
    let mut live: Vec<usize> = Vec::new();

    for op in ops {
        match *op {
            Op::Insert(i) => {
                if !live.contains(&i) {
                    sut.insert(&mut store, keys[i], hashes[i]);
                    live.push(i);
                }
            }
            Op::Remove(i) => {
                let got = sut.remove(&mut store, hashes[i], |e| e.id == i);
                let expected = live.iter().position(|&x| x == i).map(|p| live.remove(p));
                prop_assert_eq!(got, expected.map(|i| keys[i]));
            }
            Op::RemoveAny(i) => {
                let got = sut.remove(&mut store, hashes[i], |_| true);
                let expected = newest_with_hash(&live, hashes, hashes[i]);
                if let Some(e) = expected {
                    live.retain(|&x| x != e);
                }
                prop_assert_eq!(got, expected.map(|i| keys[i]));
            }
            Op::RemoveExisting(i) => {
                if live.contains(&i) {
                    prop_assert_eq!(sut.remove_existing(&mut store, keys[i]), Some(keys[i]));
                    live.retain(|&x| x != i);
                } else {
                    prop_assert_eq!(sut.remove_existing(&mut store, keys[i]), None);
                }
            }
            Op::Search(i) => {
                let got = sut.search(&store, hashes[i], |e| e.id == i);
                prop_assert_eq!(got, live.contains(&i).then(|| keys[i]));
            }
            Op::SearchAny(i) => {
                let got = sut.search(&store, hashes[i], |_| true);
                let expected = newest_with_hash(&live, hashes, hashes[i]);
                prop_assert_eq!(got, expected.map(|i| keys[i]));
            }
            Op::Iterate => {
                let mut seen = BTreeSet::new();
                sut.for_each(&store, |k, e| {
                    assert_eq!(keys[e.id], k);
                    assert!(seen.insert(e.id), "element visited twice");
                });
                let model: BTreeSet<usize> = live.iter().copied().collect();
                prop_assert_eq!(seen, model);
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.len(), live.len());
        prop_assert_eq!(sut.is_empty(), live.is_empty());
        for (i, &k) in keys.iter().enumerate() {
            let linked = live.contains(&i);
            prop_assert_eq!(store[k].node.is_linked(), linked);
            if linked {
                prop_assert!(sut.bucket(&store, hashes[i]).any(|x| x == k));
            }
        }
    }
    Ok(sut)
}

fn tight_policy() -> ResizePolicy {
    ResizePolicy::new(0, 32, LoadFactor::HALF, LoadFactor::EIGHTH).unwrap()
}

// Property: state-machine equivalence against an insertion-ordered model.
// Invariants exercised across random operation sequences:
// - len() equals inserted minus successfully removed elements.
// - search/remove by comparator find exactly the model's element.
// - comparator-free lookups return the newest element with that hash.
// - remove_existing reports linkage correctly and unlinks the element.
// - for_each visits each live element exactly once.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_fixed_table((hashes, ops) in arb_scenario()) {
        run_against_model(FixedTable::new(2).unwrap(), &hashes, &ops)?;
    }

    #[test]
    fn prop_dynamic_table((hashes, ops) in arb_scenario()) {
        run_against_model(DynamicTable::with_policy(tight_policy()), &hashes, &ops)?;
    }

    #[test]
    fn prop_incremental_table((hashes, ops) in arb_scenario()) {
        let t = run_against_model(IncrementalTable::with_policy(tight_policy()), &hashes, &ops)?;
        prop_assert_eq!(t.bucket_count(), (1usize << t.level()) + t.split_index());
    }
}

// Property: resize transparency. The same operation sequence replayed on
// all three variants yields the same observable results; only bucket counts
// and memory usage may differ.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_variants_agree((hashes, ops) in arb_scenario()) {
        let mut store: SlotMap<DefaultKey, Elem> = SlotMap::new();
        let keys: Vec<DefaultKey> = (0..hashes.len())
            .map(|id| store.insert(Elem { node: Node::new(), id }))
            .collect();
        // one store per variant so link fields do not collide
        let mut stores = [store, SlotMap::new(), SlotMap::new()];
        for s in stores.iter_mut().skip(1) {
            for id in 0..hashes.len() {
                s.insert(Elem { node: Node::new(), id });
            }
        }
        let [s0, s1, s2] = &mut stores;
        let mut fixed: FixedTable<DefaultKey> = FixedTable::new(0).unwrap();
        let mut dynamic: DynamicTable<DefaultKey> = DynamicTable::with_policy(tight_policy());
        let mut incremental: IncrementalTable<DefaultKey> = IncrementalTable::with_policy(tight_policy());

        for op in &ops {
            let (a, b, c) = match *op {
                Op::Insert(i) => {
                    if !s0[keys[i]].node.is_linked() {
                        fixed.insert(s0, keys[i], hashes[i]);
                        dynamic.insert(s1, keys[i], hashes[i]);
                        incremental.insert(s2, keys[i], hashes[i]);
                    }
                    (None, None, None)
                }
                Op::Remove(i) => (
                    fixed.remove(s0, hashes[i], |e| e.id == i),
                    dynamic.remove(s1, hashes[i], |e| e.id == i),
                    incremental.remove(s2, hashes[i], |e| e.id == i),
                ),
                Op::RemoveAny(i) => (
                    fixed.remove(s0, hashes[i], |_| true),
                    dynamic.remove(s1, hashes[i], |_| true),
                    incremental.remove(s2, hashes[i], |_| true),
                ),
                Op::RemoveExisting(i) => (
                    fixed.remove_existing(s0, keys[i]),
                    dynamic.remove_existing(s1, keys[i]),
                    incremental.remove_existing(s2, keys[i]),
                ),
                Op::Search(i) => (
                    fixed.search(s0, hashes[i], |e| e.id == i),
                    dynamic.search(s1, hashes[i], |e| e.id == i),
                    incremental.search(s2, hashes[i], |e| e.id == i),
                ),
                Op::SearchAny(i) => (
                    fixed.search(s0, hashes[i], |_| true),
                    dynamic.search(s1, hashes[i], |_| true),
                    incremental.search(s2, hashes[i], |_| true),
                ),
                Op::Iterate => {
                    let mut visited = [0usize; 3];
                    fixed.for_each(s0, |_, _| visited[0] += 1);
                    dynamic.for_each(s1, |_, _| visited[1] += 1);
                    incremental.for_each(s2, |_, _| visited[2] += 1);
                    prop_assert_eq!(visited[0], visited[1]);
                    prop_assert_eq!(visited[0], visited[2]);
                    (None, None, None)
                }
            };
            let ids = |r: Option<DefaultKey>, s: &SlotMap<DefaultKey, Elem>| r.map(|k| s[k].id);
            prop_assert_eq!(ids(a, &*s0), ids(b, &*s1));
            prop_assert_eq!(ids(a, &*s0), ids(c, &*s2));
            prop_assert_eq!(fixed.len(), dynamic.len());
            prop_assert_eq!(fixed.len(), incremental.len());
        }
    }
}
