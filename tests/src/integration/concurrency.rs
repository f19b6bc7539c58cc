//! # Concurrency Tests
//!
//! Many services handling many requests over a small bus:
//!
//! ```text
//! [dispatch] ──request (Low)──→ [Event Bus] ──→ N × DiscoveryService
//!                                    ↑                  │
//!                                    └── new-name/log ──┘
//!                                    │
//!                                    ↓
//!                           [consumer] (drains new-name)
//! ```
//!
//! ## Test Categories
//!
//! 1. **No deadlock**: blocked publishers on both sides still make progress
//! 2. **Gate accounting**: adapters run once per request that passes the gates
//! 3. **Overload**: log events are shed, new-name events are not
//! 4. **Ordering**: higher priority is received first

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    use shared_bus::{EventFilter, EventPublisher, EventTopic, InMemoryEventBus, Priority};
    use shared_types::{
        DiscoveryConfig, DiscoveryRequest, DomainScope, LogMessage, Service, SourceError,
        SourceIdentity, SourceType,
    };
    use st_01_discovery::{
        DiscoveryService, RequestContext, RequestOutcome, ServiceRegistry, StaticSource,
    };

    const SERVICES: usize = 4;
    const REQUESTS: usize = 20;
    const NAMES_PER_CALL: usize = 3;

    fn context(bus: &Arc<InMemoryEventBus>) -> RequestContext {
        RequestContext::builder()
            .config(DiscoveryConfig::new(Arc::new(DomainScope::for_domains([
                "example.com",
            ]))))
            .bus(bus.clone())
            .build()
            .expect("context")
    }

    fn service(name: &str, source: StaticSource) -> DiscoveryService {
        DiscoveryService::builder()
            .identity(SourceIdentity::new(SourceType::Api, name))
            .adapter(source)
            .min_interval(Duration::ZERO)
            .build()
            .expect("service")
    }

    /// Even requests are in scope, odd ones are not.
    fn request(i: usize) -> DiscoveryRequest {
        if i % 2 == 0 {
            DiscoveryRequest::new(format!("host{i}.example.com"), "example.com")
        } else {
            DiscoveryRequest::new(format!("host{i}.example.org"), "example.org")
        }
    }

    // =============================================================================
    // NO DEADLOCK + GATE ACCOUNTING
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_services_many_requests_small_bus() {
        let bus = Arc::new(InMemoryEventBus::with_capacity(4));
        let ctx = context(&bus);

        // Unread log subscriber: must never stall publishers.
        let _logs = bus.subscribe(EventFilter::topic(EventTopic::Log));
        let mut names = bus.subscribe(EventFilter::topic(EventTopic::NewName));

        let mut registry = ServiceRegistry::new();
        let mut sources = Vec::new();
        for i in 0..SERVICES {
            let source = StaticSource::new(
                (0..NAMES_PER_CALL).map(|n| format!("s{i}-n{n}.example.com")),
            );
            sources.push(source.clone());
            registry.register(service(&format!("Service{i}"), source));
        }
        let failing = StaticSource::failing(SourceError::Http { status: 503 });
        registry.register(service("Failing", failing.clone()));

        registry.start_all().await.expect("start");
        let handles = registry.spawn_all(&ctx, bus.as_ref());

        let in_scope = (0..REQUESTS).filter(|i| i % 2 == 0).count();
        let expected = SERVICES * in_scope * NAMES_PER_CALL;

        let consumer = tokio::spawn(async move {
            let mut received = 0;
            while received < expected {
                match names.recv().await {
                    Some(_) => received += 1,
                    None => break,
                }
            }
            received
        });

        for i in 0..REQUESTS {
            let receivers = registry.dispatch(&ctx, request(i)).await;
            assert_eq!(receivers, SERVICES + 1);
        }

        let received = timeout(Duration::from_secs(30), consumer)
            .await
            .expect("no deadlock")
            .expect("consumer");
        assert_eq!(received, expected);

        registry.stop_all().await;
        for handle in handles {
            timeout(Duration::from_secs(5), handle)
                .await
                .expect("loop ended")
                .expect("task")
                .expect("run");
        }

        for source in &sources {
            assert_eq!(source.invocations(), in_scope);
        }
        assert_eq!(failing.invocations(), in_scope);

        for service in registry.services() {
            let metrics = service.metrics_snapshot();
            assert_eq!(metrics.requests_received, REQUESTS as u64);
            assert_eq!(metrics.dropped_out_of_scope, (REQUESTS - in_scope) as u64);
            assert_eq!(metrics.adapter_invocations, in_scope as u64);
        }

        // More failures than the log mailbox holds.
        assert!(bus.events_dropped() > 0);
    }

    /// Concurrent callers of one service are spaced by its limiter.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_limiter() {
        let bus = Arc::new(InMemoryEventBus::new());
        let ctx = context(&bus);

        let source = StaticSource::new(["a.example.com"]);
        let service = Arc::new(
            DiscoveryService::builder()
                .identity(SourceIdentity::new(SourceType::Api, "Spaced"))
                .adapter(source.clone())
                .min_interval(Duration::from_millis(50))
                .build()
                .expect("service"),
        );
        service.start().await.expect("start");

        let started = tokio::time::Instant::now();
        let calls: Vec<_> = (0..4)
            .map(|_| {
                let service = service.clone();
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    service
                        .on_request(&ctx, DiscoveryRequest::new("www.example.com", "example.com"))
                        .await
                })
            })
            .collect();

        for call in calls {
            assert_eq!(call.await.expect("task"), RequestOutcome::Published(1));
        }
        assert_eq!(source.invocations(), 4);
        // Three gaps of at least 50ms between four calls.
        assert!(started.elapsed() >= Duration::from_millis(150));
    }

    // =============================================================================
    // OVERLOAD
    // =============================================================================

    /// A full mailbox sheds log events but delivers every new-name event.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_log_flood_never_loses_names() {
        let bus = Arc::new(InMemoryEventBus::with_capacity(2));
        let mut sub = bus.subscribe(EventFilter::all());

        let names = {
            let bus = bus.clone();
            tokio::spawn(async move {
                for i in 0..5 {
                    bus.publish(
                        EventTopic::NewName,
                        Priority::High,
                        DiscoveryRequest::new(format!("n{i}.example.com"), "example.com").into(),
                    )
                    .await;
                }
            })
        };

        // Logs never wait, whatever the mailbox holds.
        for i in 0..50 {
            timeout(
                Duration::from_secs(1),
                bus.publish(
                    EventTopic::Log,
                    Priority::High,
                    LogMessage::new("flood", format!("line {i}")).into(),
                ),
            )
            .await
            .expect("log publish never blocks");
        }

        let mut received = Vec::new();
        while received.len() < 5 {
            let event = timeout(Duration::from_secs(5), sub.recv())
                .await
                .expect("timeout")
                .expect("bus open");
            received.extend(event.into_request().map(|r| r.name));
        }
        names.await.expect("publisher");

        assert_eq!(
            received,
            [
                "n0.example.com",
                "n1.example.com",
                "n2.example.com",
                "n3.example.com",
                "n4.example.com"
            ]
        );
        assert!(bus.events_dropped() > 0);
    }

    // =============================================================================
    // ORDERING AND STREAMS
    // =============================================================================

    /// Names published at High are received before a queued Low request.
    #[tokio::test]
    async fn test_priority_across_topics() {
        let bus = Arc::new(InMemoryEventBus::new());
        let ctx = context(&bus);
        let mut all = bus.subscribe(EventFilter::all());

        let service = service("Fixture", StaticSource::new(["a.example.com", "b.example.com"]));
        service.start().await.expect("start");

        bus.publish(
            EventTopic::Request,
            Priority::Low,
            DiscoveryRequest::new("queued.example.com", "example.com").into(),
        )
        .await;
        service
            .on_request(&ctx, DiscoveryRequest::new("www.example.com", "example.com"))
            .await;

        let mut order = Vec::new();
        while let Ok(Some(event)) = all.try_recv() {
            order.push((event.topic, event.into_request().map(|r| r.name)));
        }
        assert_eq!(
            order,
            [
                (EventTopic::NewName, Some("a.example.com".to_string())),
                (EventTopic::NewName, Some("b.example.com".to_string())),
                (EventTopic::Request, Some("queued.example.com".to_string())),
            ]
        );
    }

    /// A subscriber joining after publication sees only later events.
    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_names() {
        let bus = Arc::new(InMemoryEventBus::new());
        let ctx = context(&bus);
        let service = service("Fixture", StaticSource::new(["a.example.com"]));
        service.start().await.expect("start");

        let _early = bus.subscribe(EventFilter::topic(EventTopic::NewName));
        service
            .on_request(&ctx, DiscoveryRequest::new("one.example.com", "example.com"))
            .await;

        let mut late = bus.subscribe(EventFilter::topic(EventTopic::NewName));
        assert!(matches!(late.try_recv(), Ok(None)));

        service
            .on_request(&ctx, DiscoveryRequest::new("two.example.com", "example.com"))
            .await;
        assert_eq!(late.len(), 1);
    }

    /// The stream view of a subscription drives a consumer with combinators.
    #[tokio::test]
    async fn test_event_stream_consumer() {
        let bus = Arc::new(InMemoryEventBus::new());
        let ctx = context(&bus);
        let stream = bus.event_stream(EventFilter::topic(EventTopic::NewName));

        let mut registry = ServiceRegistry::new();
        registry.register(service(
            "Fixture",
            StaticSource::new(["a.example.com", "", "b.example.com"]),
        ));
        registry.start_all().await.expect("start");
        let handles = registry.spawn_all(&ctx, bus.as_ref());

        registry
            .dispatch(&ctx, DiscoveryRequest::new("www.example.com", "example.com"))
            .await;

        let names: Vec<String> = timeout(
            Duration::from_secs(5),
            stream
                .filter_map(|event| async move { event.into_request().map(|r| r.name) })
                .take(2)
                .collect(),
        )
        .await
        .expect("timeout");
        assert_eq!(names, ["a.example.com", "b.example.com"]);

        registry.stop_all().await;
        for handle in handles {
            handle.await.expect("task").expect("run");
        }
    }
}
