//! Criterion benchmarks for vocabulary lookup, tokenization, and learning.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use textprofile::{Constraints, Oracle, Pattern, PrefixToken, SignatureLearner, Token, TokenRegistry};

fn vocabulary(size: usize) -> Vec<String> {
    (0..size).map(|i| format!("entry{i:05}")).collect()
}

/// Benchmark: longest-prefix lookup against vocabularies of varying size
fn bench_prefix_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("prefix_match");

    for size in [16, 1_024, 65_536] {
        let case_sensitive = PrefixToken::new("V", vocabulary(size), true);
        let case_insensitive = PrefixToken::new("V", vocabulary(size), false);
        let target = "ENTRY00012 and the rest";

        group.bench_with_input(BenchmarkId::new("case", size), &target, |b, target| {
            b.iter(|| case_sensitive.prefix_match_length(black_box(target)));
        });
        group.bench_with_input(BenchmarkId::new("nocase", size), &target, |b, target| {
            b.iter(|| case_insensitive.prefix_match_length(black_box(target)));
        });
    }

    group.finish();
}

/// Benchmark: greedy tokenization of typical column values
fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");
    let registry = TokenRegistry::new();
    let extended = registry.token_set(true, &[], &[]).expect("built-in tokens");

    let cases = [
        ("date", "2019-01-02"),
        ("phone", "(425) 555-0100"),
        ("email", "first.last@example.com"),
        ("sentence", "The quick brown fox jumps over the lazy dog"),
    ];

    for (name, input) in cases {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("default", name), &input, |b, input| {
            b.iter(|| Pattern::tokenize(black_box(input), registry.default_atoms(), registry.any()));
        });
        group.bench_with_input(BenchmarkId::new("extended", name), &input, |b, input| {
            b.iter(|| Pattern::tokenize(black_box(input), &extended, registry.any()));
        });
    }

    group.finish();
}

/// Benchmark: end-to-end learning with a cold cache
fn bench_learn(c: &mut Criterion) {
    let mut group = c.benchmark_group("learn");
    let registry = TokenRegistry::new();

    for count in [16, 256] {
        let examples: Vec<String> = (0..count)
            .map(|i| match i % 3 {
                0 => format!("{:04}-{:02}-{:02}", 1900 + i, i % 12 + 1, i % 28 + 1),
                1 => format!("Item {i}"),
                _ => format!("user{i}@example.com"),
            })
            .collect();
        let constraints = Constraints::new().with_positives(&examples);

        group.bench_with_input(BenchmarkId::new("mixed", count), &constraints, |b, constraints| {
            let mut learner = SignatureLearner::new(&registry);
            b.iter(|| {
                learner.clear_cache();
                learner.learn(black_box(constraints))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_prefix_match, bench_tokenize, bench_learn);
criterion_main!(benches);
