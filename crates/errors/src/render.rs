use crate::{kind::ErrorKind, model::ErrorObj, severity::Severity};
use serde::Serialize;
use serde_json::{Map, Value};

/// Body returned to the caller: `{ error, message, request_id }`.
#[derive(Debug, Serialize)]
pub struct PublicErrorView {
    pub error: &'static str,
    pub message: String,
    pub request_id: Option<String>,
}

/// Internal view with developer detail, for logs only.
#[derive(Debug, Serialize)]
pub struct AuditErrorView {
    pub code: &'static str,
    pub kind: &'static str,
    pub http_status: u16,
    pub severity: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_dev: Option<String>,
    pub meta: Map<String, Value>,
}

impl ErrorObj {
    pub fn to_public(&self) -> PublicErrorView {
        PublicErrorView {
            error: self.code.0,
            message: self.message_user.clone(),
            request_id: self.request_id.clone(),
        }
    }

    pub fn to_audit(&self) -> AuditErrorView {
        AuditErrorView {
            code: self.code.0,
            kind: ErrorKind::as_str(self.kind),
            http_status: self.http_status,
            severity: Severity::as_str(self.severity),
            message_dev: self.message_dev.clone(),
            meta: self.meta.clone(),
        }
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }
}
