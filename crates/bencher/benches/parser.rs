use bencher::{POST_CHUNKED, REQUESTS};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use quill_http::buf::BufferPool;
use quill_http::codec::RequestParser;
use quill_http::codec::body::chunked;
use std::hint::black_box;

fn benchmark_request_parser(criterion: &mut Criterion) {
    let parser = RequestParser::new();
    let mut group = criterion.benchmark_group("request_parser");

    for case in REQUESTS {
        group.throughput(Throughput::Bytes(case.input().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &case, |b, case| {
            b.iter(|| {
                let request = parser.parse(black_box(case.input())).expect("input should be a valid http request");
                black_box(request);
            });
        });
    }

    group.finish();
}

fn benchmark_chunked_decode(criterion: &mut Criterion) {
    let request = RequestParser::new().parse(POST_CHUNKED).expect("input should be a valid http request");
    let body = request.body();
    let pool = BufferPool::shared();

    let mut group = criterion.benchmark_group("chunked");
    group.throughput(Throughput::Bytes(body.len() as u64));
    group.bench_function("decoded_len", |b| b.iter(|| black_box(chunked::decoded_len(black_box(body)))));
    group.bench_function("decode", |b| {
        b.iter(|| {
            let decoded = chunked::decode(black_box(body), &pool).expect("input should be a valid chunked body");
            black_box(decoded);
        });
    });
    group.finish();
}

criterion_group!(parser, benchmark_request_parser, benchmark_chunked_decode);
criterion_main!(parser);
