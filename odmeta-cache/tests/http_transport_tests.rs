mod common;

use common::*;
use odmeta_cache::{
    CacheConfig, ExponentialBackoff, FetchError, HttpSchemaTransport, HttpTransportConfig,
    MetadataCache, SchemaTransport,
};
use odmeta_codec::KeyFormat;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport_for(server: &MockServer) -> HttpSchemaTransport {
    HttpSchemaTransport::new(HttpTransportConfig {
        base_url: server.uri(),
        ..Default::default()
    })
    .unwrap()
}

fn fast_backoff(max_retries: u32) -> Arc<ExponentialBackoff> {
    Arc::new(ExponentialBackoff {
        max_retries,
        initial_delay_ms: 1,
        max_delay_ms: 5,
        multiplier: 2.0,
    })
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap_or_default().len()
}

// ── Config defaults ─────────────────────────────────────────────

#[test]
fn http_config_default() {
    let cfg = HttpTransportConfig::default();
    assert_eq!(cfg.base_url, "http://localhost:8080");
    assert_eq!(cfg.metadata_path, "metadata/entities");
    assert_eq!(cfg.bearer_token, None);
    assert_eq!(cfg.request_timeout_secs, 30);
}

#[test]
fn http_config_serde_roundtrip() {
    let cfg = HttpTransportConfig {
        base_url: "https://erp.example.com".to_string(),
        bearer_token: Some("token".to_string()),
        ..Default::default()
    };
    let json = serde_json::to_string(&cfg).unwrap();
    let deserialized: HttpTransportConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, cfg);
}

#[test]
fn entity_url_joins_and_encodes() {
    let transport = HttpSchemaTransport::new(HttpTransportConfig {
        base_url: "https://erp.example.com/".to_string(),
        metadata_path: "/api/metadata/".to_string(),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(
        transport.entity_url(" Sales Orders "),
        "https://erp.example.com/api/metadata/Sales%20Orders"
    );
    assert_eq!(transport.name(), "http");
}

// ── Fetching ────────────────────────────────────────────────────

#[tokio::test]
async fn fetches_and_decodes_schema_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metadata/entities/CustomersV3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(customers_doc()))
        .mount(&server)
        .await;

    let doc = transport_for(&server)
        .fetch_entity_schema("CustomersV3")
        .await
        .unwrap();
    assert_eq!(doc, customers_doc());
}

#[tokio::test]
async fn decodes_wire_shaped_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metadata/entities/Workers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Workers",
            "version": "W/\"9\"",
            "public_entity_set_name": "Workers",
            "keys": [{"name": "PersonnelNumber", "type": "string"}],
            "properties": [
                {"name": "HireDate", "type": "date"},
                {"name": "Status", "type": "enum", "enum_name": "HcmWorkerStatus"}
            ]
        })))
        .mount(&server)
        .await;

    let doc = transport_for(&server)
        .fetch_entity_schema("Workers")
        .await
        .unwrap();
    assert_eq!(doc.entity_set_name.as_deref(), Some("Workers"));
    assert!(doc.keys[0].mandatory);
    assert_eq!(doc.properties.len(), 2);
}

#[tokio::test]
async fn sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metadata/entities/Workers"))
        .and(header("Authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(workers_doc()))
        .mount(&server)
        .await;

    let transport = HttpSchemaTransport::new(HttpTransportConfig {
        base_url: server.uri(),
        bearer_token: Some("s3cret".to_string()),
        ..Default::default()
    })
    .unwrap();

    assert!(transport.fetch_entity_schema("Workers").await.is_ok());
}

// ── Status mapping ──────────────────────────────────────────────

async fn fetch_with_status(status: u16, body: &str) -> FetchError {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    transport_for(&server)
        .fetch_entity_schema("Anything")
        .await
        .unwrap_err()
}

#[tokio::test]
async fn not_found_maps_to_not_found() {
    assert_eq!(
        fetch_with_status(404, "").await,
        FetchError::NotFound("Anything".into())
    );
}

#[tokio::test]
async fn unauthorized_and_forbidden_map_to_auth() {
    assert!(matches!(fetch_with_status(401, "").await, FetchError::Auth(_)));
    assert!(matches!(fetch_with_status(403, "").await, FetchError::Auth(_)));
}

#[tokio::test]
async fn server_errors_and_throttling_are_retryable() {
    for status in [429u16, 500, 503] {
        let err = fetch_with_status(status, "busy").await;
        assert_eq!(
            err,
            FetchError::Status {
                status,
                message: "busy".into(),
                retryable: true
            }
        );
        assert!(err.is_retryable());
    }
}

#[tokio::test]
async fn client_errors_are_not_retryable() {
    let err = fetch_with_status(400, "bad request").await;
    assert_eq!(
        err,
        FetchError::Status {
            status: 400,
            message: "bad request".into(),
            retryable: false
        }
    );
}

#[tokio::test]
async fn undecodable_body_is_malformed() {
    assert!(matches!(
        fetch_with_status(200, "<html>login</html>").await,
        FetchError::Malformed(_)
    ));
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let transport = HttpSchemaTransport::new(HttpTransportConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        ..Default::default()
    })
    .unwrap();

    let err = transport.fetch_entity_schema("Workers").await.unwrap_err();
    assert!(matches!(err, FetchError::Network(_)));
    assert!(err.is_retryable());
}

// ── Retries ─────────────────────────────────────────────────────

#[tokio::test]
async fn retries_transient_failures_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(workers_doc()))
        .mount(&server)
        .await;

    let transport = transport_for(&server).with_retry_policy(fast_backoff(3));
    let doc = transport.fetch_entity_schema("Workers").await.unwrap();

    assert_eq!(doc, workers_doc());
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn gives_up_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let transport = transport_for(&server).with_retry_policy(fast_backoff(2));
    let err = transport.fetch_entity_schema("Workers").await.unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 502, .. }));
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn does_not_retry_permanent_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let transport = transport_for(&server).with_retry_policy(fast_backoff(5));
    let err = transport.fetch_entity_schema("Workers").await.unwrap_err();

    assert_eq!(err, FetchError::NotFound("Workers".into()));
    assert_eq!(request_count(&server).await, 1);
}

// ── End to end ──────────────────────────────────────────────────

#[tokio::test]
async fn cache_over_http_builds_key_predicates() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metadata/entities/LedgerEntriesSet"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ledger_doc()))
        .expect(1)
        .mount(&server)
        .await;

    let cache = MetadataCache::new(Arc::new(transport_for(&server)), CacheConfig::default());
    let values = json!({
        "CompanyId": "001",
        "RecordId": 123456789012345i64,
        "EffectiveDate": "2023-12-25",
        "Priority": 1,
        "IsActive": "Yes"
    });
    let values = values.as_object().unwrap();

    let first = cache
        .key_predicate("LedgerEntriesSet", values, KeyFormat::Named)
        .await
        .unwrap();
    let second = cache
        .key_predicate("ledgerentries", values, KeyFormat::Named)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(
        first,
        "CompanyId='001',RecordId=123456789012345,EffectiveDate=2023-12-25,Priority=1,IsActive=Yes"
    );
}

#[tokio::test]
async fn cache_over_http_reports_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let cache = MetadataCache::new(Arc::new(transport_for(&server)), CacheConfig::default());
    assert!(cache.get_schema("Vendors").await.unwrap_err().is_not_found());
}
