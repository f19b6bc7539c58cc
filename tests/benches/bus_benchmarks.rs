//! # Subtrace Bus Benchmarks
//!
//! Throughput of the in-memory bus and the discovery pipeline:
//!
//! | Benchmark | Measures |
//! |-----------|----------|
//! | bus/publish_fanout | one new-name event copied to N subscribers |
//! | bus/log_overload | log publishing against a full mailbox |
//! | discovery/on_request | full request pipeline with a static source |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shared_bus::{EventFilter, EventPublisher, EventTopic, InMemoryEventBus, Priority};
use shared_types::{
    DiscoveryConfig, DiscoveryRequest, DomainScope, LogMessage, Service, SourceIdentity,
    SourceType,
};
use st_01_discovery::{DiscoveryService, RequestContext, StaticSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
}

fn bench_publish_fanout(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("bus");

    for subscribers in [1usize, 4, 16] {
        let bus = InMemoryEventBus::with_capacity(1024);
        let mut subs: Vec<_> = (0..subscribers)
            .map(|_| bus.subscribe(EventFilter::topic(EventTopic::NewName)))
            .collect();

        group.throughput(Throughput::Elements(subscribers as u64));
        group.bench_with_input(
            BenchmarkId::new("publish_fanout", subscribers),
            &subscribers,
            |b, _| {
                b.iter(|| {
                    rt.block_on(async {
                        let payload = DiscoveryRequest::new("www.example.com", "example.com");
                        black_box(
                            bus.publish(EventTopic::NewName, Priority::High, payload.into())
                                .await,
                        );
                    });
                    for sub in &mut subs {
                        let _ = black_box(sub.try_recv());
                    }
                })
            },
        );
    }

    group.finish();
}

fn bench_log_overload(c: &mut Criterion) {
    let rt = runtime();
    let bus = InMemoryEventBus::with_capacity(8);
    let _sub = bus.subscribe(EventFilter::all());

    c.bench_function("bus/log_overload", |b| {
        b.iter(|| {
            rt.block_on(async {
                black_box(
                    bus.publish(
                        EventTopic::Log,
                        Priority::High,
                        LogMessage::new("bench", "overload").into(),
                    )
                    .await,
                );
            })
        })
    });
}

fn bench_on_request(c: &mut Criterion) {
    let rt = runtime();
    let bus = Arc::new(InMemoryEventBus::new());
    let ctx = RequestContext::builder()
        .config(DiscoveryConfig::new(Arc::new(DomainScope::for_domains([
            "example.com",
        ]))))
        .bus(bus.clone())
        .build()
        .expect("context");

    let service = DiscoveryService::builder()
        .identity(SourceIdentity::new(SourceType::Api, "Bench"))
        .adapter(StaticSource::new([
            "a.example.com",
            "*.b.example.com",
            "c.example.com%2F",
        ]))
        .min_interval(Duration::ZERO)
        .build()
        .expect("service");
    rt.block_on(service.start()).expect("start");

    c.bench_function("discovery/on_request", |b| {
        b.iter(|| {
            rt.block_on(async {
                black_box(
                    service
                        .on_request(&ctx, DiscoveryRequest::new("www.example.com", "example.com"))
                        .await,
                );
            })
        })
    });
}

criterion_group!(
    benches,
    bench_publish_fanout,
    bench_log_overload,
    bench_on_request
);
criterion_main!(benches);
