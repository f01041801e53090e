#![allow(clippy::unwrap_used, clippy::expect_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gambit::jaccard::{jaccard_distance, jaccard_distances};
use gambit::kmer::{decode, encode, encode_revcomp, KmerSpec};
use gambit::signature::calc_signature;
use gambit::store::SignatureContainer;

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("kmer::encode");
    for k in [11u8, 16, 21, 32] {
        let seq = "ACGT".repeat(k as usize / 4 + 1);
        let bytes = &seq.as_bytes()[..k as usize];
        group.bench_with_input(BenchmarkId::from_parameter(k), &bytes, |b, bytes| {
            b.iter(|| encode(black_box(bytes), black_box(k)));
        });
    }
    group.finish();
}

fn bench_encode_revcomp(c: &mut Criterion) {
    let mut group = c.benchmark_group("kmer::encode_revcomp");
    for k in [11u8, 16, 21, 32] {
        let seq = "ACGT".repeat(k as usize / 4 + 1);
        let bytes = &seq.as_bytes()[..k as usize];
        group.bench_with_input(BenchmarkId::from_parameter(k), &bytes, |b, bytes| {
            b.iter(|| encode_revcomp(black_box(bytes), black_box(k)));
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("kmer::decode");
    for k in [11u8, 16, 21, 32] {
        let idx = 0x5555_5555_5555u64 & ((1u64 << (2 * k)) - 1);
        group.bench_with_input(BenchmarkId::from_parameter(k), &idx, |b, &idx| {
            b.iter(|| decode(black_box(idx), black_box(k)));
        });
    }
    group.finish();
}

fn synthetic_genome(approx_bases: usize) -> String {
    "ACGTATGACGGCATCCGTAATGACTTGCA".repeat(approx_bases / 29 + 1)
}

fn bench_calc_signature(c: &mut Criterion) {
    let mut group = c.benchmark_group("signature::calc_signature");
    let spec = KmerSpec::default_spec();
    for bases in [10_000usize, 100_000, 1_000_000] {
        let genome = synthetic_genome(bases);
        group.bench_with_input(BenchmarkId::from_parameter(bases), &genome, |b, genome| {
            b.iter(|| calc_signature(&spec, black_box([genome.as_str()])));
        });
    }
    group.finish();
}

fn bench_jaccard_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("jaccard::jaccard_distance");
    for len in [100usize, 1_000, 10_000] {
        let a: Vec<u64> = (0..len as u64).step_by(2).collect();
        let b: Vec<u64> = (0..len as u64).step_by(3).collect();
        group.bench_with_input(BenchmarkId::from_parameter(len), &(a, b), |bench, (a, b)| {
            bench.iter(|| jaccard_distance(black_box(a), black_box(b)));
        });
    }
    group.finish();
}

struct InMemoryRefs(Vec<Vec<u64>>);

impl SignatureContainer for InMemoryRefs {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn get(&self, i: usize) -> std::borrow::Cow<'_, [u64]> {
        std::borrow::Cow::Borrowed(&self.0[i])
    }
}

fn bench_jaccard_distances_parallel(c: &mut Criterion) {
    use gambit::concurrency::WorkerPool;
    use gambit::progress::CancellationToken;

    let mut group = c.benchmark_group("jaccard::jaccard_distances");
    let query: Vec<u64> = (0..2_000u64).step_by(2).collect();
    let pool = WorkerPool::new(0).unwrap();
    let token = CancellationToken::new();

    for num_refs in [100usize, 1_000, 10_000] {
        let refs = InMemoryRefs((0..num_refs).map(|i| (i as u64..i as u64 + 2_000).collect()).collect());
        group.bench_with_input(BenchmarkId::from_parameter(num_refs), &refs, |b, refs| {
            b.iter(|| jaccard_distances(black_box(&query), black_box(refs), &pool, &token));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_encode,
    bench_encode_revcomp,
    bench_decode,
    bench_calc_signature,
    bench_jaccard_distance,
    bench_jaccard_distances_parallel,
);
criterion_main!(benches);
