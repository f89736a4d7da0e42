use crate::{kind::ErrorKind, severity::Severity};
use once_cell::sync::Lazy;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

#[derive(Clone, Debug)]
pub struct CodeSpec {
    pub code: ErrorCode,
    pub kind: ErrorKind,
    pub http_status: u16,
    pub severity: Severity,
    pub default_message: &'static str,
}

pub mod codes {
    use super::ErrorCode;

    pub const MISSING_HEADER: ErrorCode = ErrorCode("missing_header");
    pub const INVALID_HEADER_FORMAT: ErrorCode = ErrorCode("invalid_header_format");
    pub const INVALID_DIGEST: ErrorCode = ErrorCode("invalid_digest");
    pub const UNKNOWN_KID: ErrorCode = ErrorCode("unknown_kid");
    pub const KID_NOT_OWNED: ErrorCode = ErrorCode("kid_not_owned");
    pub const TIMESTAMP_SKEW: ErrorCode = ErrorCode("timestamp_skew");
    pub const REPLAY_DETECTED: ErrorCode = ErrorCode("replay_detected");
    pub const INVALID_SIGNATURE: ErrorCode = ErrorCode("invalid_signature");
    pub const NOT_ALLOWED: ErrorCode = ErrorCode("not_allowed");
    pub const INVALID_REQUEST: ErrorCode = ErrorCode("invalid_request");
    pub const INTERNAL_ERROR: ErrorCode = ErrorCode("internal_error");
}

static INTERNAL_SPEC: CodeSpec = CodeSpec {
    code: codes::INTERNAL_ERROR,
    kind: ErrorKind::Internal,
    http_status: 500,
    severity: Severity::Critical,
    default_message: "Internal error. Please retry later.",
};

pub static REGISTRY: Lazy<HashMap<&'static str, CodeSpec>> = Lazy::new(|| {
    use codes::*;

    let mut map = HashMap::new();
    let mut add = |spec: CodeSpec| {
        let key = spec.code.0;
        if map.insert(key, spec).is_some() {
            panic!("duplicate error code: {}", key);
        }
    };

    add(CodeSpec {
        code: MISSING_HEADER,
        kind: ErrorKind::InvalidRequest,
        http_status: 400,
        severity: Severity::Info,
        default_message: "A required authentication header is missing.",
    });
    add(CodeSpec {
        code: INVALID_HEADER_FORMAT,
        kind: ErrorKind::InvalidRequest,
        http_status: 400,
        severity: Severity::Info,
        default_message: "An authentication header is malformed.",
    });
    add(CodeSpec {
        code: INVALID_DIGEST,
        kind: ErrorKind::InvalidRequest,
        http_status: 400,
        severity: Severity::Warn,
        default_message: "The request body does not match its content digest.",
    });
    add(CodeSpec {
        code: UNKNOWN_KID,
        kind: ErrorKind::Unauthenticated,
        http_status: 401,
        severity: Severity::Warn,
        default_message: "The signing key is unknown or disabled.",
    });
    add(CodeSpec {
        code: KID_NOT_OWNED,
        kind: ErrorKind::Unauthenticated,
        http_status: 401,
        severity: Severity::Warn,
        default_message: "The signing key does not belong to the calling agent.",
    });
    add(CodeSpec {
        code: TIMESTAMP_SKEW,
        kind: ErrorKind::Unauthenticated,
        http_status: 401,
        severity: Severity::Info,
        default_message: "The request timestamp is outside the accepted window.",
    });
    add(CodeSpec {
        code: REPLAY_DETECTED,
        kind: ErrorKind::Unauthenticated,
        http_status: 401,
        severity: Severity::Warn,
        default_message: "This nonce has already been used.",
    });
    add(CodeSpec {
        code: INVALID_SIGNATURE,
        kind: ErrorKind::Unauthenticated,
        http_status: 401,
        severity: Severity::Warn,
        default_message: "The request signature is invalid.",
    });
    add(CodeSpec {
        code: NOT_ALLOWED,
        kind: ErrorKind::Forbidden,
        http_status: 403,
        severity: Severity::Warn,
        default_message: "The agent is not allowed to call this operation.",
    });
    add(CodeSpec {
        code: INVALID_REQUEST,
        kind: ErrorKind::InvalidRequest,
        http_status: 400,
        severity: Severity::Info,
        default_message: "The request payload is invalid.",
    });
    add(INTERNAL_SPEC.clone());

    map
});

pub fn spec_of(code: ErrorCode) -> &'static CodeSpec {
    REGISTRY.get(code.0).unwrap_or(&INTERNAL_SPEC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_codes_map_to_their_status() {
        assert_eq!(spec_of(codes::MISSING_HEADER).http_status, 400);
        assert_eq!(spec_of(codes::REPLAY_DETECTED).http_status, 401);
        assert_eq!(spec_of(codes::NOT_ALLOWED).http_status, 403);
        assert_eq!(spec_of(codes::INTERNAL_ERROR).http_status, 500);
    }

    #[test]
    fn unregistered_codes_fall_back_to_internal() {
        let spec = spec_of(ErrorCode("does_not_exist"));
        assert_eq!(spec.code, codes::INTERNAL_ERROR);
    }
}
