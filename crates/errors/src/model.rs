use crate::{
    code::{spec_of, ErrorCode},
    kind::ErrorKind,
    severity::Severity,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

#[derive(Clone, Debug, Serialize)]
pub struct ErrorObj {
    pub code: ErrorCode,
    pub kind: ErrorKind,
    pub message_user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_dev: Option<String>,
    pub http_status: u16,
    pub severity: Severity,
    #[serde(default)]
    pub meta: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl fmt::Display for ErrorObj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message_dev {
            Some(dev) => write!(f, "{}: {}", self.code.0, dev),
            None => write!(f, "{}: {}", self.code.0, self.message_user),
        }
    }
}

pub struct ErrorBuilder {
    code: ErrorCode,
    message_user: Option<String>,
    message_dev: Option<String>,
    meta: Map<String, Value>,
    request_id: Option<String>,
}

impl ErrorBuilder {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            message_user: None,
            message_dev: None,
            meta: Map::new(),
            request_id: None,
        }
    }

    pub fn user_msg(mut self, message: impl Into<String>) -> Self {
        self.message_user = Some(message.into());
        self
    }

    pub fn dev_msg(mut self, message: impl Into<String>) -> Self {
        self.message_dev = Some(message.into());
        self
    }

    pub fn meta_kv(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn build(self) -> ErrorObj {
        let spec = spec_of(self.code);
        ErrorObj {
            code: spec.code,
            kind: spec.kind,
            message_user: self
                .message_user
                .unwrap_or_else(|| spec.default_message.to_string()),
            message_dev: self.message_dev,
            http_status: spec.http_status,
            severity: spec.severity,
            meta: self.meta,
            request_id: self.request_id,
        }
    }
}
