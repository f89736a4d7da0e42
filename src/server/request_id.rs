use axum::body::Body;
use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use payguard_core_types::RequestId;

use super::REQUEST_ID_HEADER;

const MAX_REQUEST_ID_LEN: usize = 128;

/// Reuses a well-formed inbound `x-request-id` or mints one, exposes it as an extension and echoes
/// it on the response.
pub async fn assign_request_id(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty() && value.len() <= MAX_REQUEST_ID_LEN)
        .map(|value| RequestId(value.to_string()))
        .unwrap_or_else(RequestId::new);
    request.extensions_mut().insert(request_id.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
