use payguard_errors::prelude::*;
use thiserror::Error;

/// Terminal rejection of a signed request. Each variant maps to one stable wire code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing header: {0}")]
    MissingHeader(String),
    #[error("invalid header format: {0}")]
    InvalidHeaderFormat(String),
    #[error("unknown or disabled key id: {0}")]
    UnknownKid(String),
    #[error("key {kid} is not owned by agent {agent_id}")]
    KidNotOwned { kid: String, agent_id: String },
    #[error("timestamp skew of {skew_seconds}s exceeds window of {window_seconds}s")]
    TimestampSkew {
        skew_seconds: i64,
        window_seconds: u64,
    },
    #[error("nonce already used by agent {agent_id}")]
    ReplayDetected { agent_id: String },
    #[error("invalid digest: {0}")]
    InvalidDigest(String),
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
    #[error("agent {agent_id} may not call {method} {path}")]
    NotAllowed {
        agent_id: String,
        method: String,
        path: String,
    },
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AuthError::MissingHeader(_) => codes::MISSING_HEADER,
            AuthError::InvalidHeaderFormat(_) => codes::INVALID_HEADER_FORMAT,
            AuthError::UnknownKid(_) => codes::UNKNOWN_KID,
            AuthError::KidNotOwned { .. } => codes::KID_NOT_OWNED,
            AuthError::TimestampSkew { .. } => codes::TIMESTAMP_SKEW,
            AuthError::ReplayDetected { .. } => codes::REPLAY_DETECTED,
            AuthError::InvalidDigest(_) => codes::INVALID_DIGEST,
            AuthError::InvalidSignature(_) => codes::INVALID_SIGNATURE,
            AuthError::NotAllowed { .. } => codes::NOT_ALLOWED,
            AuthError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    pub fn http_status(&self) -> u16 {
        spec_of(self.code()).http_status
    }

    /// Public message uses the registry default; the variant detail only goes to the dev message.
    pub fn to_error_obj(&self) -> ErrorObj {
        ErrorBuilder::new(self.code())
            .dev_msg(self.to_string())
            .build()
    }
}

impl From<AuthError> for ErrorObj {
    fn from(value: AuthError) -> Self {
        value.to_error_obj()
    }
}
