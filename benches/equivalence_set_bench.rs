use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use equiv_collections::collect;
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn bench_insert_boxed(c: &mut Criterion) {
    c.bench_function("equiv_set_insert_boxed_10k", |b| {
        let sets = collect::equality::<u64>().sets();
        b.iter_batched(
            || sets.new_set(),
            |mut s| {
                for x in lcg(1).take(10_000) {
                    s.add(x);
                }
                black_box(s)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_packed(c: &mut Criterion) {
    c.bench_function("equiv_set_insert_packed_10k", |b| {
        let sets = collect::equality::<i64>().sets_with_packed_storage();
        b.iter_batched(
            || sets.new_set(),
            |mut s| {
                for x in lcg(3).take(10_000) {
                    s.add(x as i64);
                }
                black_box(s)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_contains_hit(c: &mut Criterion) {
    c.bench_function("equiv_set_contains_hit", |b| {
        let keys: Vec<u64> = lcg(7).take(20_000).collect();
        let s = collect::equality::<u64>().sets().new_set_from(keys.clone());
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(s.contains(k));
        })
    });
}

fn bench_contains_miss(c: &mut Criterion) {
    c.bench_function("equiv_set_contains_miss", |b| {
        let s = collect::equality::<u64>().sets().new_set_from(lcg(11).take(10_000));
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            let k = miss.next().unwrap();
            black_box(s.contains(&k));
        })
    });
}

fn bench_map_put_get(c: &mut Criterion) {
    c.bench_function("equiv_map_put_get_10k", |b| {
        let maps = collect::equality::<u64>().sets().maps::<u64>();
        b.iter_batched(
            || maps.new_map(),
            |mut m| {
                for (i, x) in lcg(13).take(10_000).enumerate() {
                    m.put(x, i as u64);
                }
                for x in lcg(13).take(10_000) {
                    black_box(m.get(&x));
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_insert_boxed, bench_insert_packed, bench_contains_hit, bench_contains_miss, bench_map_put_get
}
criterion_main!(benches);
