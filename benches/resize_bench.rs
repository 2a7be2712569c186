use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use intrusive_hashtable::{DynamicTable, HashIndex, IncrementalTable, Linked, Node};
use std::time::Duration;

struct Entry {
    node: Node<usize>,
}

impl Linked<usize> for Entry {
    fn link(&self) -> &Node<usize> {
        &self.node
    }
    fn link_mut(&mut self) -> &mut Node<usize> {
        &mut self.node
    }
}

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

// 2^15 + 1 elements: with the default thresholds the next insert is the one
// that pushes a 2^16-bucket table over half load.
const AT_THRESHOLD: usize = (1 << 15) + 1;

fn at_threshold<T: HashIndex<Key = usize>>(mut t: T) -> (T, Vec<Entry>, Vec<u32>) {
    let hashes: Vec<u32> = lcg(17).take(AT_THRESHOLD + 1).map(|x| (x >> 32) as u32).collect();
    let mut store: Vec<Entry> = (0..hashes.len()).map(|_| Entry { node: Node::new() }).collect();
    for (k, &h) in hashes.iter().enumerate().take(AT_THRESHOLD) {
        t.insert(&mut store, k, h);
    }
    (t, store, hashes)
}

// Latency of the single insert that crosses the growth threshold. The
// dynamic table relinks every element here; the incremental table splits
// a single bucket.
fn bench_threshold_insert(c: &mut Criterion) {
    c.bench_function("dynamic::threshold_insert_32k", |b| {
        b.iter_batched(
            || at_threshold(DynamicTable::new()),
            |(mut t, mut store, hashes)| {
                t.insert(&mut store, AT_THRESHOLD, hashes[AT_THRESHOLD]);
                black_box(t.bucket_count())
            },
            BatchSize::LargeInput,
        )
    });

    c.bench_function("incremental::threshold_insert_32k", |b| {
        b.iter_batched(
            || at_threshold(IncrementalTable::new()),
            |(mut t, mut store, hashes)| {
                t.insert(&mut store, AT_THRESHOLD, hashes[AT_THRESHOLD]);
                black_box(t.bucket_count())
            },
            BatchSize::LargeInput,
        )
    });
}

// Grow from empty to 100k and drain back, resizes included.
fn bench_grow_and_drain(c: &mut Criterion) {
    let hashes: Vec<u32> = lcg(23).take(100_000).map(|x| (x >> 32) as u32).collect();

    fn run<T: HashIndex<Key = usize>>(mut t: T, hashes: &[u32]) -> usize {
        let mut store: Vec<Entry> = (0..hashes.len()).map(|_| Entry { node: Node::new() }).collect();
        for (k, &h) in hashes.iter().enumerate() {
            t.insert(&mut store, k, h);
        }
        let peak = t.bucket_count();
        for k in 0..hashes.len() {
            t.remove_existing(&mut store, k);
        }
        peak
    }

    c.bench_function("dynamic::grow_and_drain_100k", |b| {
        b.iter(|| black_box(run(DynamicTable::new(), &hashes)))
    });
    c.bench_function("incremental::grow_and_drain_100k", |b| {
        b.iter(|| black_box(run(IncrementalTable::new(), &hashes)))
    });
}

fn bench_reserve(c: &mut Criterion) {
    c.bench_function("dynamic::reserve_100k", |b| {
        b.iter(|| {
            let mut store: Vec<Entry> = Vec::new();
            let mut t: DynamicTable<usize> = DynamicTable::new();
            t.reserve(&mut store, 100_000).unwrap();
            black_box(t.bucket_count())
        })
    });
    c.bench_function("incremental::reserve_100k", |b| {
        b.iter(|| {
            let mut store: Vec<Entry> = Vec::new();
            let mut t: IncrementalTable<usize> = IncrementalTable::new();
            t.reserve(&mut store, 100_000).unwrap();
            black_box(t.bucket_count())
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_threshold_insert, bench_grow_and_drain, bench_reserve
}
criterion_main!(benches);
