use std::hint::black_box;
use std::sync::Arc;

use bencher::{StreamScript, TestCase};
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use micro_h2::queue::SegmentQueue;
use micro_h2::session::Session;
use micro_h2::stream::Stream;

static SMALL_GET: StreamScript = StreamScript::new(
    &[(":method", "GET"), (":path", "/index.html"), (":authority", "127.0.0.1:8080"), ("user-agent", "curl/7.79.1"), ("accept", "*/*")],
    b"",
);

static LARGE_GET: StreamScript = StreamScript::new(
    &[
        (":method", "GET"),
        (":scheme", "https"),
        (":path", "/index/?a=1&b=2&a=3"),
        (":authority", "127.0.0.1:8080"),
        ("cache-control", "max-age=0"),
        ("sec-ch-ua", r##""#Not_A Brand";v="99", "Microsoft Edge";v="109", "Chromium";v="109""##),
        ("sec-ch-ua-mobile", "?0"),
        ("sec-ch-ua-platform", "\"macOS\""),
        ("upgrade-insecure-requests", "1"),
        ("user-agent", "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36 Edg/109.0.1518.52"),
        ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9"),
        ("sec-fetch-site", "none"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-user", "?1"),
        ("sec-fetch-dest", "document"),
        ("accept-encoding", "gzip, deflate, br"),
        ("accept-language", "zh-CN,zh;q=0.9,en-US;q=0.8,en;q=0.7"),
    ],
    b"",
);

static UPLOAD: StreamScript = StreamScript::new(
    &[(":method", "POST"), (":path", "/upload"), (":authority", "127.0.0.1:8080"), ("content-type", "application/octet-stream")],
    &[b'x'; 64 * 1024],
);

fn create_test_cases() -> Vec<TestCase> {
    vec![TestCase::small("small_get", SMALL_GET), TestCase::normal("large_get", LARGE_GET), TestCase::large("upload", UPLOAD)]
}

fn replay(session: &Session, script: &StreamScript) {
    let mut stream = Stream::new(1, session);
    for (name, value) in script.headers() {
        stream.add_header(name.as_bytes(), value.as_bytes()).expect("script headers should be valid");
    }
    stream.end_headers().expect("headers should fit a segment");
    for chunk in script.body().chunks(16 * 1024) {
        stream.add_data(chunk).expect("body should be accepted");
    }
    stream.close_input().expect("queue should accept end of stream");
}

fn benchmark_stream_reassembly(criterion: &mut Criterion) {
    let test_cases = create_test_cases();
    let mut group = criterion.benchmark_group("stream_reassembly");

    for case in test_cases {
        group.throughput(Throughput::Bytes(case.script().input_len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &case, |b, case| {
            b.iter_batched_ref(
                || Session::new(1, Arc::new(SegmentQueue::new())),
                |session| {
                    replay(session, case.script());
                    black_box(session.queue().len());
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(reassembly, benchmark_stream_reassembly);
criterion_main!(reassembly);
