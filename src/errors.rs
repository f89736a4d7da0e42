//! HTTP-facing error type. Wraps an [`ErrorObj`] and renders the public `{error, message,
//! request_id}` body with the registered status.

use std::fmt;

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use payguard_agent_auth::AuthError;
use payguard_errors::mapping_http::to_http_status;
use payguard_errors::prelude::*;

use crate::server::REQUEST_ID_HEADER;

#[derive(Debug, Clone)]
pub struct GatewayError {
    inner: ErrorObj,
}

impl GatewayError {
    pub fn new(code: ErrorCode, dev_message: impl Into<String>) -> Self {
        Self {
            inner: ErrorBuilder::new(code).dev_msg(dev_message).build(),
        }
    }

    pub fn invalid_request(dev_message: impl Into<String>) -> Self {
        Self::new(codes::INVALID_REQUEST, dev_message)
    }

    pub fn internal(dev_message: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL_ERROR, dev_message)
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.inner = self.inner.with_request_id(request_id);
        self
    }

    pub fn code(&self) -> &'static str {
        self.inner.code.as_str()
    }

    pub fn status(&self) -> StatusCode {
        to_http_status(&self.inner)
    }

    pub fn inner(&self) -> &ErrorObj {
        &self.inner
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl std::error::Error for GatewayError {}

impl From<AuthError> for GatewayError {
    fn from(value: AuthError) -> Self {
        Self {
            inner: value.to_error_obj(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let request_id = self.inner.request_id.clone();
        let mut response = (status, Json(self.inner.to_public())).into_response();
        if let Some(value) = request_id.and_then(|id| HeaderValue::from_str(&id).ok()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_keep_code_and_status() {
        let err = GatewayError::from(AuthError::ReplayDetected {
            agent_id: "agent-1".into(),
        })
        .with_request_id("req-1");
        assert_eq!(err.code(), "replay_detected");
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.inner().to_public().request_id.as_deref(), Some("req-1"));
    }

    #[test]
    fn invalid_request_is_a_bad_request() {
        let err = GatewayError::invalid_request("expected value at line 1");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(!err.inner().message_user.contains("line 1"));
    }
}
