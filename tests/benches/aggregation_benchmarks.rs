//! # Aggregation Benchmarks
//!
//! Overhead of one scatter-gather run and of a full HTTP round trip through
//! the router, with backends that answer immediately.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;
use summary_gateway::adapters::{FixedAccessClient, FixedContextClient, FixedIdentityClient};
use summary_gateway::domain::Deadline;
use summary_gateway::{AggregationRequest, Aggregator, DependencyClients, GatewayConfig, GatewayService};
use tokio::runtime::Runtime;
use tower::ServiceExt;

fn fixed_clients() -> DependencyClients {
    DependencyClients {
        identity: Arc::new(FixedIdentityClient),
        access: Arc::new(FixedAccessClient),
        context: Arc::new(FixedContextClient),
    }
}

fn bench_aggregate(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let aggregator = Aggregator::new(fixed_clients());
    let request = AggregationRequest::new(Some("user123"), Some("chat1")).expect("valid request");

    let mut group = c.benchmark_group("aggregator");
    group.bench_function("aggregate_fixed", |b| {
        b.iter(|| {
            rt.block_on(async {
                let deadline = Deadline::after(Duration::from_millis(200));
                black_box(aggregator.aggregate(&request, &deadline).await.is_ok())
            })
        })
    });

    for concurrency in [1usize, 10, 100] {
        group.throughput(Throughput::Elements(concurrency as u64));
        group.bench_with_input(
            BenchmarkId::new("aggregate_concurrent", concurrency),
            &concurrency,
            |b, &n| {
                b.iter(|| {
                    rt.block_on(async {
                        let runs = (0..n).map(|_| {
                            let aggregator = aggregator.clone();
                            let request = request.clone();
                            tokio::spawn(async move {
                                let deadline = Deadline::after(Duration::from_millis(200));
                                aggregator.aggregate(&request, &deadline).await.is_ok()
                            })
                        });
                        black_box(futures::future::join_all(runs).await.len())
                    })
                })
            },
        );
    }
    group.finish();
}

fn bench_http_round_trip(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let service =
        GatewayService::new(GatewayConfig::default(), fixed_clients()).expect("valid config");
    let router = service.router();

    c.bench_function("http_summary_round_trip", |b| {
        b.iter(|| {
            rt.block_on(async {
                let response = router
                    .clone()
                    .oneshot(
                        axum::http::Request::builder()
                            .uri("/api/v1/chat/summary?user_id=user123&chat_id=chat1")
                            .body(axum::body::Body::empty())
                            .expect("request"),
                    )
                    .await
                    .expect("infallible");
                black_box(response.status())
            })
        })
    });
}

criterion_group!(benches, bench_aggregate, bench_http_round_trip);
criterion_main!(benches);
