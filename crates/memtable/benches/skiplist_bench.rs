use criterion::{criterion_group, criterion_main, Criterion};
use memtable::SkipList;

fn skiplist_put_benchmark(c: &mut Criterion) {
    c.bench_function("skiplist_put_10k", |b| {
        b.iter(|| {
            let mut list = SkipList::with_seed(1);
            for i in 0..10_000 {
                list.put(format!("k{}", i).into_bytes(), vec![b'x'; 100]);
            }
        });
    });
}

fn skiplist_get_benchmark(c: &mut Criterion) {
    let mut list = SkipList::with_seed(1);
    for i in 0..10_000 {
        list.put(format!("k{}", i).into_bytes(), vec![b'x'; 100]);
    }

    c.bench_function("skiplist_get_10k", |b| {
        b.iter(|| {
            for i in 0..10_000 {
                let key = format!("k{}", i).into_bytes();
                assert!(list.get(&key).is_some());
            }
        });
    });
}

fn skiplist_scan_benchmark(c: &mut Criterion) {
    let mut list = SkipList::with_seed(1);
    for i in 0..10_000 {
        list.put(format!("k{:05}", i).into_bytes(), vec![b'x'; 100]);
    }

    c.bench_function("skiplist_scan_10k", |b| {
        b.iter(|| {
            let mut count = 0usize;
            let mut it = list.iter();
            it.seek_to_first();
            while it.valid() {
                count += 1;
                it.next();
            }
            assert_eq!(count, 10_000);
        });
    });
}

criterion_group!(
    benches,
    skiplist_put_benchmark,
    skiplist_get_benchmark,
    skiplist_scan_benchmark,
);
criterion_main!(benches);
