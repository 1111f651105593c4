//! Performance benchmarks for cache-contract
//!
//! This benchmark suite measures:
//! - InMemory backend operations (set, get, del, keys)
//! - Glob matching cost per key
//! - MockCache expectation lookup as the expectation list grows
//!
//! Run with: cargo bench
//! View results: open target/criterion/report/index.html

use cache_contract::mock::{Matcher, Method, MockCache};
use cache_contract::{args, pattern, Cache, Context, InMemoryCache};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::time::Duration;

// ============================================================================
// Group 1: InMemory Backend Benchmarks
// ============================================================================

fn inmemory_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("inmemory_backend");

    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");
    let ctx = Context::background();

    for size in [100, 1_000, 10_000, 100_000].iter() {
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("set", size), size, |b, &size| {
                let cache = InMemoryCache::new();
                let value = "x".repeat(size);

                b.to_async(&rt).iter(|| async {
                    cache
                        .set(&ctx, black_box("test_key"), black_box(value.as_str()))
                        .await
                        .expect("Failed to set")
                });
            });

        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("get_hit", size), size, |b, &size| {
                let cache = InMemoryCache::new();
                rt.block_on(async {
                    cache
                        .set(&ctx, "test_key", "x".repeat(size))
                        .await
                        .expect("Failed to set");
                });

                b.to_async(&rt)
                    .iter(|| async { cache.get(&ctx, black_box("test_key")).await });
            });
    }

    group.bench_function("get_miss", |b| {
        let cache = InMemoryCache::new();

        b.to_async(&rt)
            .iter(|| async { cache.get(&ctx, black_box("nonexistent_key")).await });
    });

    group.bench_function("set_with_expiration", |b| {
        let cache = InMemoryCache::new();

        b.to_async(&rt).iter(|| async {
            cache
                .set_with_expiration(&ctx, black_box("ttl_key"), "v", Duration::from_secs(60))
                .await
                .expect("Failed to set")
        });
    });

    group.bench_function("del", |b| {
        let cache = InMemoryCache::new();

        b.to_async(&rt).iter(|| async {
            cache
                .set(&ctx, "test_key", "v")
                .await
                .expect("Failed to set");
            cache.del(&ctx, black_box(&["test_key"])).await
        });
    });

    for count in [100, 1_000, 10_000].iter() {
        group
            .throughput(Throughput::Elements(*count as u64))
            .bench_with_input(BenchmarkId::new("keys", count), count, |b, &count| {
                let cache = InMemoryCache::new();
                rt.block_on(async {
                    for i in 0..count {
                        let prefix = if i % 2 == 0 { "user" } else { "order" };
                        cache
                            .set(&ctx, &format!("{}:{}", prefix, i), "v")
                            .await
                            .expect("Failed to set");
                    }
                });

                b.to_async(&rt)
                    .iter(|| async { cache.keys(&ctx, black_box("user:*")).await });
            });
    }

    group.finish();
}

// ============================================================================
// Group 2: Glob Matching Benchmarks
// ============================================================================

fn pattern_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern");

    let key = "tenant:42:user:1337:session:abcdef";
    let cases = [
        ("literal", "tenant:42:user:1337:session:abcdef"),
        ("prefix_star", "tenant:42:*"),
        ("inner_stars", "tenant:*:user:*:session:*"),
        ("class", "tenant:[0-9][0-9]:user:*"),
        ("miss", "order:*"),
    ];

    for (name, glob) in cases.iter() {
        group.bench_function(*name, |b| {
            b.iter(|| pattern::matches(black_box(glob), black_box(key)))
        });
    }

    group.finish();
}

// ============================================================================
// Group 3: MockCache Expectation Lookup
// ============================================================================

fn mock_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("mock_cache");

    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");
    let ctx = Context::background();

    // The matching expectation is registered last, so every call scans the list.
    for registered in [1, 10, 100].iter() {
        group.bench_with_input(
            BenchmarkId::new("get_last_match", registered),
            registered,
            |b, &registered| {
                let cache = MockCache::new();
                for i in 0..registered - 1 {
                    cache
                        .on(Method::Get, args![Matcher::any(), format!("other:{}", i)])
                        .return_value("other");
                }
                cache
                    .on(Method::Get, args![Matcher::any(), "target"])
                    .return_value("hit");

                b.to_async(&rt)
                    .iter(|| async { cache.get(&ctx, black_box("target")).await });
            },
        );
    }

    group.bench_function("del_keys_unordered", |b| {
        let cache = MockCache::new();
        cache
            .on(
                Method::Del,
                args![Matcher::any(), Matcher::keys_unordered(["c", "a", "b"])],
            )
            .return_ok();

        b.to_async(&rt)
            .iter(|| async { cache.del(&ctx, black_box(&["a", "b", "c"])).await });
    });

    group.finish();
}

// ============================================================================
// Benchmark Registration
// ============================================================================

criterion_group!(
    benches,
    inmemory_benchmarks,
    pattern_benchmarks,
    mock_benchmarks
);
criterion_main!(benches);
