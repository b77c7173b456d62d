use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use topocmp::prelude::*;
use topocmp::reference;

fn bench_common_prefix(c: &mut Criterion) {
    let mut group = c.benchmark_group("Common Prefix");

    for prefix_len in [8usize, 64, 512, 4096] {
        let mut a = "d/".repeat(prefix_len / 2).into_bytes();
        let mut b = a.clone();
        a.extend_from_slice(b"/child");
        b.extend_from_slice(b"-sibling");
        let pa = PaddedPath::new(&a).unwrap();
        let pb = PaddedPath::new(&b).unwrap();

        group.throughput(Throughput::Bytes(prefix_len as u64));

        for cmp in Comparator::available() {
            group.bench_with_input(
                BenchmarkId::new(format!("padded/{}", cmp.level()), prefix_len),
                &prefix_len,
                |bench, _| {
                    bench.iter(|| {
                        cmp.compare(black_box(&pa.as_padded()), black_box(&pb.as_padded()))
                    })
                },
            );
            group.bench_with_input(
                BenchmarkId::new(format!("slice/{}", cmp.level()), prefix_len),
                &prefix_len,
                |bench, _| bench.iter(|| cmp.compare_bytes(black_box(&a), black_box(&b))),
            );
        }

        group.bench_with_input(BenchmarkId::new("reference", prefix_len), &prefix_len, |bench, _| {
            bench.iter(|| reference::compare(black_box(&a), black_box(&b)))
        });
        group.bench_with_input(BenchmarkId::new("byte order", prefix_len), &prefix_len, |bench, _| {
            bench.iter(|| black_box(&a).cmp(black_box(&b)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_common_prefix);
criterion_main!(benches);
