use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::encoding;
use crate::errors::AuthError;

const SHA256_LABEL: &str = "sha-256";

/// `content-digest` value for `body`: `sha-256=:<base64>:`.
pub fn content_digest(body: &[u8]) -> String {
    let hash = Sha256::digest(body);
    format!("{SHA256_LABEL}=:{}:", encoding::encode(&hash))
}

/// Checks a `content-digest` header against the raw body. Only sha-256 is accepted.
pub fn verify_content_digest(header: &str, body: &[u8]) -> Result<(), AuthError> {
    let (alg, encoded) = header
        .trim()
        .split_once('=')
        .ok_or_else(|| AuthError::InvalidDigest("content-digest is malformed".into()))?;
    if !alg.trim().eq_ignore_ascii_case(SHA256_LABEL) {
        return Err(AuthError::InvalidDigest(format!(
            "unsupported digest algorithm {}",
            alg.trim()
        )));
    }
    let encoded = encoded
        .trim()
        .strip_prefix(':')
        .and_then(|value| value.strip_suffix(':'))
        .ok_or_else(|| AuthError::InvalidDigest("content-digest is malformed".into()))?;
    let expected = encoding::decode(encoded)
        .map_err(|_| AuthError::InvalidDigest("content-digest is not base64".into()))?;

    let actual = Sha256::digest(body);
    if expected.len() != actual.len() || !bool::from(actual.as_slice().ct_eq(&expected)) {
        return Err(AuthError::InvalidDigest(
            "body does not match content-digest".into(),
        ));
    }
    Ok(())
}
