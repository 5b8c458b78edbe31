//! Broadcast Tower Integration Tests
//!
//! Drives the public API end to end:
//! - Store semantics through the library types
//! - HTTP routes through the API router with in-memory bodies
//! - A real listener through the shared accept loop

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::CONTENT_TYPE;
use hyper::{Request, StatusCode};

use broadcast_tower::api::{ApiRouter, ResponseBody};
use broadcast_tower::clock::ManualClock;
use broadcast_tower::config::TowerConfig;
use broadcast_tower::metrics::TowerMetrics;
use broadcast_tower::service::BroadcastService;

fn service_with(
    budget: u64,
    config: TowerConfig,
    clock: Arc<ManualClock>,
) -> Arc<BroadcastService> {
    Arc::new(BroadcastService::with_clock(
        config,
        budget,
        TowerMetrics::new().unwrap(),
        clock,
    ))
}

async fn body_string(body: ResponseBody) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// =============================================================================
// Store Tests
// =============================================================================

mod store_tests {
    use super::*;
    use assert_matches::assert_matches;
    use broadcast_tower::api::parse_broadcast;
    use broadcast_tower::store::{query, BoundedStore, Entry, MessageQuery, Order};
    use broadcast_tower::ValidationError;

    #[test]
    fn test_budget_eviction_scenario() {
        let mut store = BoundedStore::new(40);
        store.insert(Entry::new(1, "abc"));
        store.insert(Entry::new(2, "defgh"));
        assert_eq!(store.total_size(), 24);

        let evicted = store.insert(Entry::new(3, "x".repeat(25)));
        assert_eq!(evicted, 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.total_size(), 33);
    }

    #[test]
    fn test_query_filters_compose() {
        let mut store = BoundedStore::new(10_000);
        let inserts = [
            (10, "alpha"),
            (20, "beta"),
            (30, "alps"),
            (40, "gamma"),
            (50, "alpine"),
        ];
        for (ts, text) in inserts {
            store.insert(Entry::new(ts, text));
        }

        let params = MessageQuery::new()
            .starts_with("al")
            .since(20)
            .until(50)
            .order(Order::Asc);
        let texts: Vec<&str> = query(store.snapshot(), &params, 100)
            .map(Entry::text)
            .collect();
        assert_eq!(texts, vec!["alps", "alpine"]);

        let params = MessageQuery::new().starts_with("al").limit(2);
        let texts: Vec<&str> = query(store.snapshot(), &params, 100)
            .map(Entry::text)
            .collect();
        assert_eq!(texts, vec!["alpine", "alps"]);
    }

    #[test]
    fn test_broadcast_validation_errors() {
        let json = Some("application/json");
        assert_matches!(
            parse_broadcast(json, br#"{}"#, 10),
            Err(ValidationError::MissingMessage)
        );
        assert_matches!(
            parse_broadcast(json, br#"{"messageText":"0123456789A"}"#, 10),
            Err(ValidationError::MessageTooLarge {
                size: 11,
                limit: 10,
            })
        );
        assert_matches!(
            parse_broadcast(json, b"{not json", 10),
            Err(ValidationError::MalformedBody(_))
        );
        assert_matches!(
            parse_broadcast(Some("text/plain"), b"messageText=hi", 10),
            Err(ValidationError::MissingMessage)
        );
    }
}

// =============================================================================
// HTTP Router Tests
// =============================================================================

mod router_tests {
    use super::*;

    struct Harness {
        router: ApiRouter,
        clock: Arc<ManualClock>,
        service: Arc<BroadcastService>,
    }

    impl Harness {
        fn new(budget: u64, config: TowerConfig) -> Self {
            let clock = Arc::new(ManualClock::new(1_000));
            let service = service_with(budget, config, clock.clone());
            Self {
                router: ApiRouter::new(service.clone()),
                clock,
                service,
            }
        }

        async fn broadcast_json(&self, json: &str) -> (StatusCode, String) {
            let req = Request::post("/api/v1/broadcast")
                .header(CONTENT_TYPE, "application/json")
                .body(Full::new(Bytes::from(json.to_owned())))
                .unwrap();
            let response = self.router.handle(req).await;
            (response.status(), body_string(response.into_body()).await)
        }

        async fn broadcast(&self, text: &str) -> String {
            let json = serde_json::json!({ "messageText": text }).to_string();
            let (status, body) = self.broadcast_json(&json).await;
            assert_eq!(status, StatusCode::CREATED);
            body
        }

        async fn get(&self, uri: &str) -> (StatusCode, String) {
            let req = Request::get(uri).body(Full::new(Bytes::new())).unwrap();
            let response = self.router.handle(req).await;
            (response.status(), body_string(response.into_body()).await)
        }
    }

    #[tokio::test]
    async fn test_broadcast_then_read() {
        let harness = Harness::new(1_024, TowerConfig::default());

        assert_eq!(harness.broadcast("hello").await, "1000|hello");

        let (status, body) = harness.get("/api/v1/messages").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "1000|hello");
    }

    #[tokio::test]
    async fn test_empty_store_reads_empty_body() {
        let harness = Harness::new(1_024, TowerConfig::default());
        let (status, body) = harness.get("/api/v1/messages").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "");
    }

    #[tokio::test]
    async fn test_form_broadcast() {
        let harness = Harness::new(1_024, TowerConfig::default());
        let req = Request::post("/api/v1/broadcast")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Full::new(Bytes::from_static(b"messageText=hello+there%21")))
            .unwrap();
        let response = harness.router.handle(req).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_string(response.into_body()).await, "1000|hello there!");
    }

    #[tokio::test]
    async fn test_order_prefix_and_range() {
        let harness = Harness::new(10_000, TowerConfig::default());
        for (i, text) in ["apple", "banana", "apricot", "cherry"].iter().enumerate() {
            harness.clock.set(100 + i as i64);
            harness.broadcast(text).await;
        }

        let (_, body) = harness.get("/api/v1/messages?startsWith=ap").await;
        assert_eq!(body, "102|apricot\n100|apple");

        let (_, body) = harness.get("/api/v1/messages?order=asc&limit=2").await;
        assert_eq!(body, "100|apple\n101|banana");

        let (_, body) = harness
            .get("/api/v1/messages?timestampFrom=101&timestampTo=102")
            .await;
        assert_eq!(body, "102|apricot\n101|banana");

        let (_, body) = harness
            .get("/api/v1/messages?timestampFrom=&limit=&unknown=1")
            .await;
        assert_eq!(body.lines().count(), 4);
    }

    #[tokio::test]
    async fn test_zero_timestamps_are_real_bounds() {
        let harness = Harness::new(1_024, TowerConfig::default());
        harness.broadcast("a").await;
        harness.clock.advance(1);
        harness.broadcast("b").await;

        let (status, body) = harness.get("/api/v1/messages?timestampTo=0").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "");

        let (_, body) = harness.get("/api/v1/messages?timestampFrom=0").await;
        assert_eq!(body, "1001|b\n1000|a");
    }

    #[tokio::test]
    async fn test_limit_clamped_to_configured_max() {
        let config = TowerConfig {
            max_messages_per_query: 2,
            ..Default::default()
        };
        let harness = Harness::new(10_000, config);
        for i in 0..5 {
            harness.clock.set(i);
            harness.broadcast(&format!("m{}", i)).await;
        }

        let (status, body) = harness.get("/api/v1/messages?limit=50").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "4|m4\n3|m3");
    }

    #[tokio::test]
    async fn test_invalid_requests_fail() {
        let config = TowerConfig {
            max_message_size_bytes: 5,
            ..Default::default()
        };
        let harness = Harness::new(1_024, config);

        for json in [r#"{}"#, r#"{"messageText":"toolong"}"#, "nope"] {
            let (status, body) = harness.broadcast_json(json).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, "failure");
        }

        for uri in [
            "/api/v1/messages?order=sideways",
            "/api/v1/messages?limit=0",
            "/api/v1/messages?limit=abc",
            "/api/v1/messages?timestampFrom=yesterday",
            "/api/v1/messages?startsWith=abcdef",
            "/api/v1/messages?order=asc&order=desc",
        ] {
            let (status, body) = harness.get(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body, "failure");
        }

        assert_eq!(harness.service.metrics().rejections("broadcast"), 3);
        assert_eq!(harness.service.metrics().rejections("messages"), 6);
        assert_eq!(harness.service.diagnostics().entry_count, 0);
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let config = TowerConfig {
            max_message_size_bytes: 4,
            ..Default::default()
        };
        let harness = Harness::new(1_024, config);
        let json = format!(r#"{{"messageText":"{}"}}"#, "x".repeat(64 * 1024));
        let (status, _) = harness.broadcast_json(&json).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_budget_eviction_over_http() {
        let harness = Harness::new(40, TowerConfig::default());
        harness.broadcast("abc").await;
        harness.clock.advance(1);
        harness.broadcast("defgh").await;
        harness.clock.advance(1);
        harness.broadcast(&"x".repeat(25)).await;

        let (_, body) = harness.get("/api/v1/messages").await;
        assert_eq!(body, format!("1002|{}", "x".repeat(25)));
    }

    #[tokio::test]
    async fn test_status_page_and_not_found() {
        let harness = Harness::new(1_024, TowerConfig::default());
        harness.broadcast("abc").await;

        let (status, html) = harness.get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains(broadcast_tower::VERSION));
        assert!(html.contains("<td>1</td>"));
        assert!(html.contains("<td>11</td>"));
        assert!(html.contains("<td>1024</td>"));
        assert!(!html.contains("{{"));

        let (status, body) = harness.get("/api/v2/messages").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "not found");

        let req = Request::delete("/api/v1/broadcast")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = harness.router.handle(req).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

// =============================================================================
// Server Tests
// =============================================================================

mod server_tests {
    use super::*;
    use broadcast_tower::api::serve;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio_util::sync::CancellationToken;

    async fn roundtrip(addr: std::net::SocketAddr, raw: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_api_over_tcp() {
        let clock = Arc::new(ManualClock::new(7));
        let service = service_with(1_024, TowerConfig::default(), clock);
        let router = ApiRouter::new(service);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();

        let server = tokio::spawn(serve(
            "api",
            listener,
            move |req| {
                let router = router.clone();
                async move { router.handle(req).await }
            },
            shutdown.clone(),
        ));

        let body = r#"{"messageText":"over the wire"}"#;
        let request = format!(
            "POST /api/v1/broadcast HTTP/1.1\r\n\
             host: localhost\r\n\
             content-type: application/json\r\n\
             content-length: {}\r\n\
             connection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let response = roundtrip(addr, &request).await;
        assert!(response.starts_with("HTTP/1.1 201"));
        assert!(response.ends_with("7|over the wire"));

        let request = "GET /api/v1/messages HTTP/1.1\r\n\
                       host: localhost\r\n\
                       connection: close\r\n\r\n";
        let response = roundtrip(addr, request).await;
        assert!(response.starts_with("HTTP/1.1 200"));
        let lower = response.to_lowercase();
        assert!(lower.contains("transfer-encoding: chunked"));
        assert!(response.contains("7|over the wire"));

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}
