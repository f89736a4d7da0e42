use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyStoreError {
    #[error("policy store unavailable: {0}")]
    Unavailable(String),
    #[error("policy store timed out after {0} ms")]
    Timeout(u64),
    #[error("invalid policy: {0}")]
    Invalid(String),
    #[error("io error: {0}")]
    Io(String),
}
