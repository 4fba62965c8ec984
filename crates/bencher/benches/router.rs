use bencher::ROUTE_PATTERNS;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use quill_http::protocol::Method;
use quill_web::handler::handler_fn;
use quill_web::router::{RouteLookup, Router, get, matcher};
use std::hint::black_box;

const PATHS: [&str; 4] = ["/", "/blog/my-first-post/edit", "/static/site.css?v=3", "/not/a/route/at/all"];

fn benchmark_matcher(criterion: &mut Criterion) {
    let patterns: Vec<&[u8]> = ROUTE_PATTERNS.iter().map(|pattern| pattern.as_bytes()).collect();
    let mut group = criterion.benchmark_group("matcher");

    for path in PATHS {
        group.bench_with_input(BenchmarkId::from_parameter(path), path.as_bytes(), |b, path| {
            b.iter(|| black_box(matcher::find(patterns.iter().copied(), black_box(path))));
        });
    }

    group.finish();
}

fn benchmark_route_table(criterion: &mut Criterion) {
    let router = ROUTE_PATTERNS
        .iter()
        .fold(Router::builder(), |builder, pattern| builder.route(*pattern, get(handler_fn(|_request, _response| Ok(())))))
        .build();
    let mut group = criterion.benchmark_group("route_table");

    for path in PATHS {
        group.bench_with_input(BenchmarkId::from_parameter(path), path.as_bytes(), |b, path| {
            b.iter(|| {
                let table = router.table();
                let found = matches!(table.lookup(Method::Get, black_box(path)), RouteLookup::Found(_));
                black_box(found)
            });
        });
    }

    group.finish();
}

criterion_group!(router, benchmark_matcher, benchmark_route_table);
criterion_main!(router);
