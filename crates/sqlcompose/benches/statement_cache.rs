//! Benchmark composition with and without the structural statement cache.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlcompose::{
    Catalog, ComposerConfig, DbField, DbSetting, OrderField, QueryField, QueryGroup,
    SqlServerStatementBuilder, StatementCache, StatementComposer, StatementRequest,
};
use std::sync::Arc;

/// Table with `n` columns: Id (identity) plus col1..col{n-1}.
fn catalog(n: usize) -> Arc<Catalog> {
    let mut columns = vec![DbField::new("Id").primary().identity()];
    columns.extend((1..n).map(|i| DbField::new(format!("col{i}"))));
    let mut catalog = Catalog::new(DbSetting::sql_server());
    catalog.register("t", columns).unwrap();
    Arc::new(catalog)
}

/// Query with an `n`-leaf AND filter.
fn request(n: usize, seed: i64) -> StatementRequest {
    let fields = (1..=n)
        .map(|i| QueryField::eq(format!("col{}", i % 8 + 1), seed + i as i64))
        .collect();
    StatementRequest::query("t")
        .filter(QueryGroup::and(fields))
        .order_by(OrderField::ascending("Id"))
}

fn composer(n: usize, config: ComposerConfig) -> StatementComposer {
    StatementComposer::from_catalog(
        SqlServerStatementBuilder::new(),
        catalog(n),
        Arc::new(StatementCache::new()),
    )
    .with_config(config)
}

fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_cache/compose");

    for n in [1, 5, 20] {
        let cached = composer(16, ComposerConfig::default());
        let uncached = composer(16, ComposerConfig::new().no_cache());
        let req = request(n, 0);

        group.bench_with_input(BenchmarkId::new("cached", n), &req, |b, req| {
            b.iter(|| black_box(cached.compose(req).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("uncached", n), &req, |b, req| {
            b.iter(|| black_box(uncached.compose(req).unwrap()));
        });
    }

    group.finish();
}

fn bench_request_and_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_cache/request_and_compose");
    let composer = composer(16, ComposerConfig::default());

    for n in [1, 5, 20] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut seed = 0;
            b.iter(|| {
                seed += 1;
                black_box(composer.compose(&request(n, seed)).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compose, bench_request_and_compose);
criterion_main!(benches);
