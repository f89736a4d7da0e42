use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use payguard::audit::MemoryAuditSink;
use payguard::config::{GatewayConfig, ServerConfig};
use payguard::server::{build_router, GatewayState, REQUEST_ID_HEADER};
use payguard_agent_auth::prelude::*;
use payguard_core_types::{AgentId, KeyId, ManualClock};
use payguard_execution_firewall::FirewallConfig;
use serde_json::{json, Value};
use tower::ServiceExt;

const NOW: i64 = 1_700_000_000;
const HOST: &str = "payguard.test";

struct Harness {
    app: Router,
    audit: Arc<MemoryAuditSink>,
    signer: RequestSigner,
}

fn harness(auth_enabled: bool) -> Harness {
    let pair = generate_keypair();
    let mut auth = AuthenticatorConfig::enabled();
    auth.enabled = auth_enabled;
    auth.keys = vec![AgentKeyRecord {
        key_id: KeyId::new("kid-1"),
        agent_id: AgentId::new("agent-1"),
        public_key: pair.public_key.clone(),
        status: KeyStatus::Active,
    }];
    auth.allow_rules = vec![AllowRule {
        agent_id: AgentId::new("agent-1"),
        method: "POST".into(),
        path: "/v1/transfers".into(),
    }];
    let config = GatewayConfig {
        server: ServerConfig::default(),
        auth,
        firewall: FirewallConfig::default(),
        policies: Vec::new(),
        policy_file: None,
    };

    let audit = Arc::new(MemoryAuditSink::new());
    let clock = ManualClock::at_unix(NOW);
    let state = GatewayState::from_config(&config, Arc::new(clock), audit.clone()).unwrap();
    let signer = RequestSigner::new(
        KeyId::new("kid-1"),
        AgentId::new("agent-1"),
        decode_signing_key(&pair.secret_key).unwrap(),
    );
    Harness {
        app: build_router(state, false),
        audit,
        signer,
    }
}

fn transfer_body(value: u128) -> Vec<u8> {
    json!({
        "tx": {"chain_id": 8453, "from": "0xAgentWallet", "to": "0xMerchant", "value": value.to_string()}
    })
    .to_string()
    .into_bytes()
}

fn to_request(envelope: &SignedRequestEnvelope) -> Request<Body> {
    let mut builder = Request::builder()
        .method(envelope.method())
        .uri(envelope.path_and_query())
        .header("host", envelope.host());
    for (name, value) in envelope.headers() {
        builder = builder.header(name, value);
    }
    builder.body(Body::from(envelope.body().to_vec())).unwrap()
}

fn signed_transfer(h: &Harness, value: u128, nonce: &str) -> Request<Body> {
    let mut envelope = SignedRequestEnvelope::new("POST", "/v1/transfers", HOST)
        .with_body(transfer_body(value));
    h.signer.sign_with_nonce(&mut envelope, NOW, nonce).unwrap();
    to_request(&envelope)
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1 << 20).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn healthz_is_open() {
    let h = harness(true);
    let request = Request::builder()
        .uri("/healthz")
        .header("host", HOST)
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn signed_transfer_is_approved_and_audited() {
    let h = harness(true);
    let (status, body) = call(&h.app, signed_transfer(&h, 1_000_000, "AAAAAAAAAAAAAAAAAAAAAA==")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["agent_id"], "agent-1");
    assert_eq!(body["decision"]["decision"], "APPROVED");
    assert_eq!(body["decision"]["risk_level"], 1);
    assert!(body["request_id"].as_str().is_some());

    let records = h.audit.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].agent_id, Some(AgentId::new("agent-1")));
    assert_eq!(records[0].key_id, Some(KeyId::new("kid-1")));
}

#[tokio::test]
async fn replayed_request_is_unauthorized() {
    let h = harness(true);
    let nonce = "AQEBAQEBAQEBAQEBAQEBAQ==";
    let (first, _) = call(&h.app, signed_transfer(&h, 1_000_000, nonce)).await;
    assert_eq!(first, StatusCode::OK);

    let mut replay = signed_transfer(&h, 1_000_000, nonce);
    replay
        .headers_mut()
        .insert(REQUEST_ID_HEADER, "req-replay".parse().unwrap());
    let (status, body) = call(&h.app, replay).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "replay_detected");
    assert_eq!(body["request_id"], "req-replay");
    assert_eq!(h.audit.len(), 1);
}

#[tokio::test]
async fn rejected_decision_is_still_ok() {
    let h = harness(true);
    let (status, body) = call(&h.app, signed_transfer(&h, 200_000_000, "AgICAgICAgICAgICAgICAg==")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["decision"]["decision"], "REJECTED");
    assert_eq!(body["decision"]["remaining_daily_budget"], "0");
    assert_eq!(h.audit.len(), 1);
}

#[tokio::test]
async fn budget_follows_the_signing_agent_not_the_payer_field() {
    let h = harness(true);
    let (_, first) = call(&h.app, signed_transfer(&h, 60_000_000, "AwMDAwMDAwMDAwMDAwMDAw==")).await;
    assert_eq!(first["decision"]["decision"], "APPROVED");

    let body = json!({
        "tx": {"chain_id": 8453, "from": "0xOtherWallet", "to": "0xMerchant", "value": "50000000"}
    })
    .to_string()
    .into_bytes();
    let mut envelope = SignedRequestEnvelope::new("POST", "/v1/transfers", HOST).with_body(body);
    h.signer
        .sign_with_nonce(&mut envelope, NOW, "BAQEBAQEBAQEBAQEBAQEBA==")
        .unwrap();
    let (status, second) = call(&h.app, to_request(&envelope)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["decision"]["decision"], "REJECTED");
    assert_eq!(second["decision"]["remaining_daily_budget"], "0");
}

#[tokio::test]
async fn malformed_json_is_invalid_request() {
    let h = harness(true);
    let mut envelope =
        SignedRequestEnvelope::new("POST", "/v1/transfers", HOST).with_body(b"{not json".to_vec());
    h.signer
        .sign_with_nonce(&mut envelope, NOW, "AwMDAwMDAwMDAwMDAwMDAw==")
        .unwrap();
    let (status, body) = call(&h.app, to_request(&envelope)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
    assert!(h.audit.is_empty());
}

#[tokio::test]
async fn unsigned_transfer_is_missing_header() {
    let h = harness(true);
    let request = Request::builder()
        .method("POST")
        .uri("/v1/transfers")
        .header("host", HOST)
        .body(Body::from(transfer_body(1)))
        .unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    let bytes = to_bytes(response.into_body(), 1 << 20).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "missing_header");
}

#[tokio::test]
async fn tampered_body_is_rejected() {
    let h = harness(true);
    let mut request = signed_transfer(&h, 1_000_000, "BAQEBAQEBAQEBAQEBAQEBA==");
    *request.body_mut() = Body::from(transfer_body(9_000_000));
    let (status, body) = call(&h.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_digest");
}

#[tokio::test]
async fn disabled_gate_passes_unsigned_requests_through() {
    let h = harness(false);
    let request = Request::builder()
        .method("POST")
        .uri("/v1/transfers")
        .header("host", HOST)
        .body(Body::from(transfer_body(1_000_000)))
        .unwrap();
    let (status, body) = call(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("agent_id").is_none());
    assert_eq!(body["decision"]["decision"], "APPROVED");
    assert_eq!(h.audit.records()[0].agent_id, None);
}
