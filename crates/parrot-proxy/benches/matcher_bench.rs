use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use parrot_proxy::filters::Filters;
use parrot_proxy::model::{
    Body, HttpRequest, HttpResponse, MatchType, Verification, VerificationTimes,
};
use parrot_proxy::predicate::{BodyMatcher, HttpRequestMatcher, RegexStringMatcher};
use parrot_proxy::recording::RequestLog;

fn create_request(id: usize) -> HttpRequest {
    HttpRequest::new()
        .with_method("POST")
        .with_path(format!("/api/v1/endpoint{id}"))
        .with_header("Host", "localhost:8080")
        .with_header("Content-Type", "application/json")
        .with_header("Connection", "keep-alive")
        .with_query_parameter("page", "1")
        .with_body(Body::string(format!(r#"{{"id": {id}, "name": "item", "tags": ["a", "b"]}}"#)))
}

fn bench_request_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_matching");
    let request = create_request(7);

    let patterns = [
        ("wildcard", HttpRequest::new()),
        ("method_path", HttpRequest::new().with_method("POST").with_path("/api/v1/endpoint7")),
        ("regex_path", HttpRequest::new().with_path("/api/v\\d+/endpoint\\d+")),
        (
            "headers_and_query",
            HttpRequest::new()
                .with_header("host", "localhost:.*")
                .with_query_parameter("page", "1"),
        ),
        (
            "json_body",
            HttpRequest::new().with_body(Body::json(r#"{"id": 7, "tags": ["b", "a"]}"#)),
        ),
    ];

    group.throughput(Throughput::Elements(1));
    for (name, pattern) in patterns {
        let matcher = HttpRequestMatcher::new(&pattern);
        group.bench_function(name, |b| b.iter(|| matcher.matches(black_box(&request))));
    }

    group.finish();
}

fn bench_string_and_body_matchers(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_matchers");

    let regex = RegexStringMatcher::new("/api/v\\d+/users/[a-z0-9-]+");
    group.bench_function("regex_string", |b| {
        b.iter(|| regex.matches(black_box(Some("/api/v2/users/abc-123"))))
    });

    let actual = Body::string(r#"{"user": {"id": 1, "roles": ["admin", "dev"]}, "active": true}"#);
    let only_matching = BodyMatcher::new(Body::json(r#"{"user": {"roles": ["dev", "admin"]}}"#));
    group.bench_function("json_only_matching_fields", |b| {
        b.iter(|| only_matching.matches(black_box(Some(&actual))))
    });

    let strict = BodyMatcher::new(Body::json_with_match_type(
        r#"{"user": {"id": 1, "roles": ["admin", "dev"]}, "active": true}"#,
        MatchType::Strict,
    ));
    group.bench_function("json_strict", |b| b.iter(|| strict.matches(black_box(Some(&actual)))));

    group.finish();
}

fn bench_filter_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_pipeline");

    for filter_count in [0usize, 10, 100].iter() {
        let mut filters = Filters::new();
        for i in 0..*filter_count {
            filters.add_request_filter(
                HttpRequest::new().with_path(format!("/api/v1/endpoint{i}")),
                |request: HttpRequest| Some(request.with_header("X-Filtered", "true")),
            );
        }
        let request = create_request(filter_count / 2);

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("apply_on_request_filters", filter_count),
            filter_count,
            |b, _| b.iter(|| filters.apply_on_request_filters(black_box(request.clone()))),
        );
    }

    group.finish();
}

fn bench_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("verification");

    for log_size in [100usize, 1000].iter() {
        let log = RequestLog::new();
        for i in 0..*log_size {
            log.add(create_request(i % 10), HttpResponse::new());
        }
        let verification = Verification::new(
            HttpRequest::new().with_path("/api/v1/endpoint3"),
            VerificationTimes::at_least(1),
        );

        group.bench_with_input(BenchmarkId::new("verify", log_size), log_size, |b, _| {
            b.iter(|| log.verify(black_box(&verification)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_request_matching,
    bench_string_and_body_matchers,
    bench_filter_pipeline,
    bench_verification
);
criterion_main!(benches);
