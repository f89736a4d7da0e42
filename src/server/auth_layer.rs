use axum::body::{to_bytes, Body, Bytes};
use axum::extract::{Request, State};
use axum::http::header::HOST;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use payguard_agent_auth::{AuthOutcome, SignedRequestEnvelope};
use payguard_core_types::RequestId;
use tracing::{debug, info, warn};

use super::state::GatewayState;
use crate::errors::GatewayError;

/// Buffers the body, runs the authenticator and hands the rebuilt request on with the
/// [`payguard_agent_auth::AuthenticatedAgent`] attached. Routes behind this layer never see a
/// request that failed a check.
pub async fn authenticate_agent(
    State(state): State<GatewayState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, GatewayError> {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .cloned()
        .unwrap_or_else(RequestId::new);
    let (mut parts, body) = request.into_parts();
    let body = to_bytes(body, state.max_body_bytes).await.map_err(|err| {
        GatewayError::invalid_request(format!("request body rejected: {err}"))
            .with_request_id(request_id.as_str())
    })?;

    let envelope = envelope_from_parts(&parts, &body);
    match state.authenticator.authenticate(&envelope) {
        Ok(AuthOutcome::Authenticated(agent)) => {
            debug!(
                request_id = %request_id,
                agent_id = %agent.agent_id,
                key_id = %agent.key_id,
                "agent authenticated"
            );
            parts.extensions.insert(agent);
        }
        Ok(AuthOutcome::Bypassed) => {}
        Err(err) => {
            let rejection = GatewayError::from(err).with_request_id(request_id.as_str());
            if rejection.inner().severity.is_alerting() {
                warn!(
                    request_id = %request_id,
                    code = rejection.code(),
                    method = %parts.method,
                    path = parts.uri.path(),
                    error = %rejection,
                    "request authentication failed"
                );
            } else {
                info!(
                    request_id = %request_id,
                    code = rejection.code(),
                    method = %parts.method,
                    path = parts.uri.path(),
                    "request authentication failed"
                );
            }
            return Err(rejection);
        }
    }

    Ok(next.run(Request::from_parts(parts, Body::from(body))).await)
}

/// Host comes from the transport (`Host` header, else the URI authority), never from a signed
/// header value.
pub fn envelope_from_parts(parts: &Parts, body: &Bytes) -> SignedRequestEnvelope {
    let host = parts
        .headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| parts.uri.authority().map(|authority| authority.to_string()))
        .unwrap_or_default();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());

    let mut envelope = SignedRequestEnvelope::new(parts.method.as_str(), path_and_query, host)
        .with_body(body.to_vec());
    for (name, value) in parts.headers.iter() {
        if let Ok(value) = value.to_str() {
            envelope = envelope.with_header(name.as_str(), value);
        }
    }
    envelope
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[test]
    fn envelope_keeps_target_and_transport_host() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/v1/transfers?dry=1")
            .header(HOST, "payguard.test")
            .header("x-agent-id", "agent-1")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();
        let envelope = envelope_from_parts(&parts, &Bytes::from_static(b"{}"));
        assert_eq!(envelope.request_target(), "post /v1/transfers?dry=1");
        assert_eq!(envelope.host(), "payguard.test");
        assert_eq!(envelope.header("x-agent-id"), Some("agent-1"));
        assert_eq!(envelope.body(), b"{}");
    }

    #[test]
    fn absolute_uri_supplies_host_when_header_is_missing() {
        let request = Request::builder()
            .uri("http://gateway.local:8080/healthz")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();
        let envelope = envelope_from_parts(&parts, &Bytes::new());
        assert_eq!(envelope.host(), "gateway.local:8080");
        assert_eq!(envelope.path_and_query(), "/healthz");
    }
}
