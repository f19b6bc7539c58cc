//! # Integration Test Flows
//!
//! Tests that st-01-discovery services, the st-02 archive source and the
//! shared-bus work together.
//!
//! ## Flows Tested:
//!
//! 1. **request → service → new-name**: names found by a source reach every
//!    `new-name` subscriber, tagged with the service that found them
//! 2. **request → service → log**: a failing source yields one log event
//! 3. **Archive over HTTP**: capture index page → extracted names → bus
//! 4. **Scope**: out-of-scope requests never reach the source

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    // Shared infrastructure
    use shared_bus::{
        BusEvent, EventFilter, EventPublisher, EventTopic, InMemoryEventBus, Priority,
        Subscription,
    };
    use shared_types::{
        DiscoveryConfig, DiscoveryRequest, DomainScope, Service, SourceError, SourceIdentity,
        SourceType,
    };

    // Discovery
    use st_01_discovery::{
        DiscoveryService, RequestContext, RequestOutcome, ServiceRegistry, StaticSource,
    };
    use st_02_archive_source::{ArchiveConfig, ArchiveSource};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn example_scope() -> DomainScope {
        DomainScope::for_domains(["example.com"])
    }

    fn context(bus: &Arc<InMemoryEventBus>, scope: DomainScope) -> RequestContext {
        RequestContext::builder()
            .config(DiscoveryConfig::new(Arc::new(scope)))
            .bus(bus.clone())
            .build()
            .expect("context")
    }

    fn static_service(name: &str, source: StaticSource) -> DiscoveryService {
        DiscoveryService::builder()
            .identity(SourceIdentity::new(SourceType::Api, name))
            .adapter(source)
            .min_interval(Duration::ZERO)
            .build()
            .expect("service")
    }

    async fn next_event(sub: &mut Subscription) -> BusEvent {
        timeout(Duration::from_secs(5), sub.recv())
            .await
            .expect("timeout")
            .expect("bus open")
    }

    /// Serve one HTTP response with `body`, then close.
    async fn serve_once(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: text/html\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
        });
        format!("http://{addr}/wayback/archive")
    }

    // =============================================================================
    // INTEGRATION TESTS: REQUEST → NEW-NAME
    // =============================================================================

    /// Names from the source are published on new-name with provenance.
    #[tokio::test]
    async fn test_request_publishes_tagged_names() {
        let bus = Arc::new(InMemoryEventBus::new());
        let ctx = context(&bus, example_scope());
        let mut names = bus.subscribe(EventFilter::topic(EventTopic::NewName));

        let source = StaticSource::new(["old.example.com", "www.example.com"]);
        let service = static_service("Fixture", source.clone());
        service.start().await.expect("start");

        let outcome = service
            .on_request(&ctx, DiscoveryRequest::new("www.example.com", "example.com"))
            .await;
        assert_eq!(outcome, RequestOutcome::Published(2));

        let mut found = Vec::new();
        for _ in 0..2 {
            let event = next_event(&mut names).await;
            assert_eq!(event.priority, Priority::High);
            let request = event.into_request().expect("request payload");
            assert_eq!(request.domain, "example.com");
            assert_eq!(request.tag, Some(SourceType::Api));
            assert_eq!(request.source, "Fixture");
            found.push(request.name);
        }
        assert_eq!(found, ["old.example.com", "www.example.com"]);
        assert_eq!(
            source.calls(),
            [("www.example.com".to_string(), "example.com".to_string())]
        );
    }

    /// Every new-name subscriber receives every name.
    #[tokio::test]
    async fn test_fanout_to_multiple_subscribers() {
        let bus = Arc::new(InMemoryEventBus::new());
        let ctx = context(&bus, example_scope());
        let mut first = bus.subscribe(EventFilter::topic(EventTopic::NewName));
        let mut second = bus.subscribe(EventFilter::topic(EventTopic::NewName));
        let mut logs = bus.subscribe(EventFilter::topic(EventTopic::Log));

        let service = static_service("Fixture", StaticSource::new(["a.example.com"]));
        service.start().await.expect("start");
        service
            .on_request(&ctx, DiscoveryRequest::new("example.com", "example.com"))
            .await;

        for sub in [&mut first, &mut second] {
            let event = next_event(sub).await;
            assert_eq!(
                event.as_request().map(|r| r.name.as_str()),
                Some("a.example.com")
            );
        }
        assert!(matches!(logs.try_recv(), Ok(None)));
    }

    // =============================================================================
    // INTEGRATION TESTS: REQUEST → LOG
    // =============================================================================

    /// A failing source publishes one log event and no names.
    #[tokio::test]
    async fn test_source_failure_publishes_log() {
        let bus = Arc::new(InMemoryEventBus::new());
        let ctx = context(&bus, example_scope());
        let mut names = bus.subscribe(EventFilter::topic(EventTopic::NewName));
        let mut logs = bus.subscribe(EventFilter::topic(EventTopic::Log));

        let service = static_service("Flaky", StaticSource::failing(SourceError::Timeout));
        service.start().await.expect("start");

        let outcome = service
            .on_request(&ctx, DiscoveryRequest::new("www.example.com", "example.com"))
            .await;
        assert_eq!(outcome, RequestOutcome::Failed);

        let event = next_event(&mut logs).await;
        assert_eq!(event.priority, Priority::High);
        let log = event.as_log().expect("log payload");
        assert_eq!(log.source, "Flaky");
        assert_eq!(log.to_string(), "Flaky: request timed out");

        assert!(matches!(names.try_recv(), Ok(None)));
        assert!(matches!(logs.try_recv(), Ok(None)));
    }

    // =============================================================================
    // INTEGRATION TESTS: SCOPE
    // =============================================================================

    /// Out-of-scope and blacklisted requests never reach the source.
    #[tokio::test]
    async fn test_scope_gates_source_calls() {
        let bus = Arc::new(InMemoryEventBus::new());
        let ctx = context(
            &bus,
            example_scope().with_blacklisted("internal.example.com"),
        );
        let mut names = bus.subscribe(EventFilter::topic(EventTopic::NewName));

        let source = StaticSource::new(["x.example.com"]);
        let service = static_service("Fixture", source.clone());
        service.start().await.expect("start");

        for name in ["www.example.org", "db.internal.example.com"] {
            let outcome = service
                .on_request(&ctx, DiscoveryRequest::new(name, "example.com"))
                .await;
            assert!(matches!(outcome, RequestOutcome::Dropped(_)), "{name}");
        }

        assert_eq!(source.invocations(), 0);
        assert!(matches!(names.try_recv(), Ok(None)));
        assert_eq!(service.metrics_snapshot().dropped_out_of_scope, 2);
    }

    // =============================================================================
    // INTEGRATION TESTS: ARCHIVE OVER HTTP
    // =============================================================================

    /// The archive source extracts names from a capture index page and the
    /// service publishes the in-scope ones.
    #[tokio::test]
    async fn test_archive_source_end_to_end() {
        let base_url = serve_once(
            r#"<html><body>
              <a href="/wayback/archive/20100101/http://www.example.com/">www.example.com</a>
              <a href="/wayback/archive/20110101/http://old.example.com/page">OLD.example.com</a>
              <a href="/wayback/archive/20120101/http://www.example.com/again">dup</a>
              <a href="http://www.webarchive.org.uk/about">about</a>
            </body></html>"#,
        )
        .await;

        let config = ArchiveConfig::default()
            .with_base_url(&base_url)
            .expect("base url");
        let source = ArchiveSource::new(config).expect("client");
        let service = DiscoveryService::builder()
            .identity(ArchiveSource::identity())
            .adapter(source)
            .min_interval(Duration::ZERO)
            .build()
            .expect("service");
        service.start().await.expect("start");

        let bus = Arc::new(InMemoryEventBus::new());
        let ctx = context(&bus, example_scope());
        let mut names = bus.subscribe(EventFilter::topic(EventTopic::NewName));

        let outcome = service
            .on_request(&ctx, DiscoveryRequest::new("www.example.com", "example.com"))
            .await;
        assert_eq!(outcome, RequestOutcome::Published(2));

        let mut found = Vec::new();
        for _ in 0..2 {
            let request = next_event(&mut names).await.into_request().expect("request");
            assert_eq!(request.tag, Some(SourceType::Archive));
            assert_eq!(request.source, "OpenUKArchive");
            found.push(request.name);
        }
        assert_eq!(found, ["www.example.com", "old.example.com"]);
    }

    // =============================================================================
    // INTEGRATION TESTS: REGISTRY WIRING
    // =============================================================================

    /// Requests dispatched through the registry reach every spawned service
    /// and the loops end when the bus closes.
    #[tokio::test]
    async fn test_registry_dispatch_and_bus_close() {
        let bus = Arc::new(InMemoryEventBus::new());
        let ctx = context(&bus, example_scope());
        let mut names = bus.subscribe(EventFilter::topic(EventTopic::NewName));

        let mut registry = ServiceRegistry::new();
        registry.register(static_service("Alpha", StaticSource::new(["a.example.com"])));
        registry.register(static_service("Beta", StaticSource::new(["b.example.com"])));
        registry.start_all().await.expect("start");
        let handles = registry.spawn_all(&ctx, bus.as_ref());

        let receivers = registry
            .dispatch(&ctx, DiscoveryRequest::new("www.example.com", "example.com"))
            .await;
        assert_eq!(receivers, 2);

        let mut found = Vec::new();
        for _ in 0..2 {
            found.extend(next_event(&mut names).await.into_request().map(|r| r.name));
        }
        found.sort();
        assert_eq!(found, ["a.example.com", "b.example.com"]);

        bus.close();
        for handle in handles {
            timeout(Duration::from_secs(5), handle)
                .await
                .expect("loop ended")
                .expect("task")
                .expect("run");
        }
        for service in registry.services() {
            assert_eq!(service.state(), shared_types::ServiceState::Started);
        }
    }

    /// Events published on a topic nobody subscribes to are simply dropped.
    #[tokio::test]
    async fn test_request_topic_without_services() {
        let bus = Arc::new(InMemoryEventBus::new());
        let receivers = bus
            .publish(
                EventTopic::Request,
                Priority::Low,
                DiscoveryRequest::new("www.example.com", "example.com").into(),
            )
            .await;
        assert_eq!(receivers, 0);
        assert_eq!(bus.events_published(), 1);
    }
}
