use serde_json::json;
use payguard_errors::prelude::*;

#[test]
fn build_and_render_public() {
    let err = ErrorBuilder::new(codes::REPLAY_DETECTED)
        .dev_msg("nonce bm9uY2U= already seen for agent-7")
        .meta_kv("agent_id", json!("agent-7"))
        .request_id("req-123")
        .build();

    let body = serde_json::to_value(err.to_public()).unwrap();
    assert_eq!(
        body,
        json!({
            "error": "replay_detected",
            "message": "This nonce has already been used.",
            "request_id": "req-123"
        })
    );

    let audit = err.to_audit();
    assert_eq!(audit.http_status, 401);
    assert_eq!(audit.kind, "Unauthenticated");
    assert!(audit.message_dev.unwrap().contains("agent-7"));
}

#[test]
fn user_message_overrides_default() {
    let err = ErrorBuilder::new(codes::MISSING_HEADER)
        .user_msg("missing x-nonce header")
        .build();
    assert_eq!(err.message_user, "missing x-nonce header");
    assert_eq!(err.http_status, 400);
    assert!(err.to_public().request_id.is_none());
}

#[cfg(feature = "http")]
#[test]
fn http_status_mapping() {
    let err = ErrorBuilder::new(codes::NOT_ALLOWED).build();
    let status = payguard_errors::mapping_http::to_http_status(&err);
    assert_eq!(status.as_u16(), 403);
}
