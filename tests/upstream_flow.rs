use axum::Json;
use axum::body::{Body, to_bytes};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use http::Request;
use license_server::app::{AppState, build_router};
use license_server::config::environment::{AppConfig, AuthScope, EndpointFamily, LookupMode};
use license_server::module::license::schema::VerificationVerdict;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

#[derive(Debug, Clone, Default)]
struct SeenRequest {
    path_and_query: String,
    date: Option<String>,
    authorization: Option<String>,
}

#[derive(Clone)]
struct StubUpstream {
    status: StatusCode,
    body: Arc<Value>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

async fn stub_handler(
    State(stub): State<StubUpstream>,
    uri: Uri,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned)
    };
    stub.seen.lock().expect("seen lock").push(SeenRequest {
        path_and_query: uri
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_default(),
        date: header("date"),
        authorization: header("authorization"),
    });
    (stub.status, Json(stub.body.as_ref().clone()))
}

/// Binds a stub upstream on an ephemeral port and returns its base URL plus
/// the log of requests it received.
async fn spawn_upstream(status: StatusCode, body: Value) -> (String, Arc<Mutex<Vec<SeenRequest>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let stub = StubUpstream {
        status,
        body: Arc::new(body),
        seen: seen.clone(),
    };
    let app = axum::Router::new()
        .fallback(stub_handler)
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub upstream");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{addr}"), seen)
}

fn test_config(base_url: &str) -> AppConfig {
    AppConfig {
        rust_env: "test".to_string(),
        api_host: "127.0.0.1".to_string(),
        api_port: 0,
        product_id: Some("22411".to_string()),
        freemius_public_key: Some("pk_test_public".to_string()),
        freemius_secret_key: Some("sk_test_secret".to_string()),
        freemius_api_key: None,
        freemius_api_base_url: base_url.to_string(),
        freemius_endpoint_family: EndpointFamily::Plugins,
        freemius_auth_scope: AuthScope::Product,
        freemius_lookup_mode: LookupMode::Hmac,
        upstream_timeout_seconds: 2,
        debug_errors: false,
    }
}

async fn post_verify(config: AppConfig, license_key: &str) -> (StatusCode, Vec<u8>) {
    let app = build_router(AppState::new(config));
    let request = Request::builder()
        .method("POST")
        .uri("/verify")
        .header("content-type", "application/json")
        .body(Body::from(json!({"licenseKey": license_key}).to_string()))
        .expect("build request");

    let response = app.oneshot(request).await.expect("request failed");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    (status, body.to_vec())
}

fn active_license_body() -> Value {
    json!({
        "licenses": [{
            "key": "ABC-123",
            "is_cancelled": false,
            "is_expired": false,
            "plan_title": "Pro Yearly",
            "expiration": "2030-01-01T00:00:00Z"
        }]
    })
}

#[tokio::test]
async fn active_license_yields_valid_verdict() {
    let (base_url, seen) = spawn_upstream(StatusCode::OK, active_license_body()).await;

    let (status, body) = post_verify(test_config(&base_url), "ABC-123").await;
    assert_eq!(status, StatusCode::OK);

    let verdict: VerificationVerdict = serde_json::from_slice(&body).expect("decode verdict");
    assert!(verdict.valid);
    assert_eq!(verdict.plan, "Pro Yearly");
    assert_eq!(verdict.expiry.as_deref(), Some("2030-01-01T00:00:00.000Z"));
    assert_eq!(verdict.reason, "");

    let seen = seen.lock().expect("seen lock");
    assert_eq!(seen.len(), 1);
    assert_eq!(
        seen[0].path_and_query,
        "/v1/plugins/22411/licenses.json?filter=key=ABC-123&count=1"
    );
    assert!(seen[0].date.is_some(), "signed request must carry Date");
    let authorization = seen[0].authorization.as_deref().expect("authorization");
    assert!(authorization.starts_with("FS 22411:pk_test_public:"));
}

#[tokio::test]
async fn account_scope_signs_without_scope_id() {
    let (base_url, seen) = spawn_upstream(StatusCode::OK, active_license_body()).await;
    let mut config = test_config(&base_url);
    config.freemius_auth_scope = AuthScope::Account;

    let (status, _) = post_verify(config, "ABC-123").await;
    assert_eq!(status, StatusCode::OK);

    let seen = seen.lock().expect("seen lock");
    let authorization = seen[0].authorization.as_deref().expect("authorization");
    assert!(authorization.starts_with("FS pk_test_public:"));
}

#[tokio::test]
async fn products_family_changes_the_lookup_path() {
    let (base_url, seen) = spawn_upstream(StatusCode::OK, active_license_body()).await;
    let mut config = test_config(&base_url);
    config.freemius_endpoint_family = EndpointFamily::Products;

    let (status, _) = post_verify(config, "ABC-123").await;
    assert_eq!(status, StatusCode::OK);

    let seen = seen.lock().expect("seen lock");
    assert_eq!(
        seen[0].path_and_query,
        "/v1/products/22411/licenses.json?filter=key=ABC-123&count=1"
    );
}

#[tokio::test]
async fn api_key_mode_sends_a_bearer_token() {
    let (base_url, seen) = spawn_upstream(StatusCode::OK, active_license_body()).await;
    let mut config = test_config(&base_url);
    config.freemius_lookup_mode = LookupMode::ApiKey;
    config.freemius_api_key = Some("tok_test".to_string());

    let (status, body) = post_verify(config, "ABC-123").await;
    assert_eq!(status, StatusCode::OK);
    let verdict: VerificationVerdict = serde_json::from_slice(&body).expect("decode verdict");
    assert!(verdict.valid);

    let seen = seen.lock().expect("seen lock");
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer tok_test"));
    assert!(seen[0].date.is_none());
}

#[tokio::test]
async fn cancelled_license_is_invalid() {
    let body = json!({
        "licenses": [{
            "key": "ABC-123",
            "is_cancelled": true,
            "is_expired": true,
            "plan_title": "Pro Yearly"
        }]
    });
    let (base_url, _) = spawn_upstream(StatusCode::OK, body).await;

    let (status, body) = post_verify(test_config(&base_url), "ABC-123").await;
    assert_eq!(status, StatusCode::OK);
    let verdict: VerificationVerdict = serde_json::from_slice(&body).expect("decode verdict");
    assert!(!verdict.valid);
    assert_eq!(verdict.reason, "License Cancelled");
}

#[tokio::test]
async fn expired_license_is_invalid() {
    let body = json!({
        "licenses": [{
            "key": "ABC-123",
            "is_cancelled": false,
            "is_expired": true
        }]
    });
    let (base_url, _) = spawn_upstream(StatusCode::OK, body).await;

    let (status, body) = post_verify(test_config(&base_url), "ABC-123").await;
    assert_eq!(status, StatusCode::OK);
    let verdict: VerificationVerdict = serde_json::from_slice(&body).expect("decode verdict");
    assert!(!verdict.valid);
    assert_eq!(verdict.reason, "License Expired");
}

#[tokio::test]
async fn empty_license_list_reports_not_found() {
    let (base_url, _) = spawn_upstream(StatusCode::OK, json!({"licenses": []})).await;

    let (status, body) = post_verify(test_config(&base_url), "NOPE-000").await;
    assert_eq!(status, StatusCode::OK);

    let payload: Value = serde_json::from_slice(&body).expect("decode verdict");
    assert_eq!(payload["valid"], json!(false));
    assert_eq!(payload["reason"], json!("License Not Found"));
    assert_eq!(payload["expiry"], Value::Null);
}

#[tokio::test]
async fn upstream_error_status_reports_server_error_verdict() {
    let (base_url, _) = spawn_upstream(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": "upstream exploded"}),
    )
    .await;

    let (status, body) = post_verify(test_config(&base_url), "ABC-123").await;
    assert_eq!(status, StatusCode::OK);
    let verdict: VerificationVerdict = serde_json::from_slice(&body).expect("decode verdict");
    assert!(!verdict.valid);
    assert_eq!(verdict.reason, "Verification Server Error");
}

#[tokio::test]
async fn unreachable_upstream_reports_server_error_verdict() {
    // Bind then drop a listener so the port is closed.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("probe addr");
    drop(listener);

    let (status, body) = post_verify(test_config(&format!("http://{addr}")), "ABC-123").await;
    assert_eq!(status, StatusCode::OK);
    let verdict: VerificationVerdict = serde_json::from_slice(&body).expect("decode verdict");
    assert!(!verdict.valid);
    assert_eq!(verdict.reason, "Verification Server Error");
}
