use ed25519_dalek::{Signer, SigningKey};
use payguard_core_types::{AgentId, KeyId};
use rand_core::{OsRng, RngCore};

use crate::canonical::signing_string;
use crate::digest::content_digest;
use crate::encoding;
use crate::envelope::SignedRequestEnvelope;
use crate::errors::AuthError;
use crate::headers::{
    SignatureParams, AGENT_ID_HEADER, CONTENT_DIGEST_HEADER, MANDATORY_SIGNED_HEADERS,
    NONCE_HEADER, SIGNATURE_ALGORITHM, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};

const NONCE_BYTES: usize = 16;

/// Agent-side counterpart of the authenticator: stamps and signs outgoing requests.
#[derive(Clone)]
pub struct RequestSigner {
    key_id: KeyId,
    agent_id: AgentId,
    signing_key: SigningKey,
    signed_headers: Option<Vec<String>>,
}

impl RequestSigner {
    pub fn new(key_id: KeyId, agent_id: AgentId, signing_key: SigningKey) -> Self {
        Self {
            key_id,
            agent_id,
            signing_key,
            signed_headers: None,
        }
    }

    /// Overrides the signed header list. Mostly useful for exercising verifier rejections.
    pub fn with_signed_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.signed_headers = Some(
            headers
                .into_iter()
                .map(|h| h.into().to_ascii_lowercase())
                .collect(),
        );
        self
    }

    pub fn key_id(&self) -> &KeyId {
        &self.key_id
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    pub fn verifying_key(&self) -> ed25519_dalek::VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn sign(&self, envelope: &mut SignedRequestEnvelope, timestamp: i64) -> Result<(), AuthError> {
        self.sign_with_nonce(envelope, timestamp, &fresh_nonce())
    }

    /// Sets identity, timestamp, nonce and (when a body is required) digest headers, then the
    /// `signature` header over them.
    pub fn sign_with_nonce(
        &self,
        envelope: &mut SignedRequestEnvelope,
        timestamp: i64,
        nonce: &str,
    ) -> Result<(), AuthError> {
        envelope.set_header(AGENT_ID_HEADER, self.agent_id.as_str());
        envelope.set_header(TIMESTAMP_HEADER, timestamp.to_string());
        envelope.set_header(NONCE_HEADER, nonce);
        if envelope.requires_digest() {
            let digest = content_digest(envelope.body());
            envelope.set_header(CONTENT_DIGEST_HEADER, digest);
        }

        let headers = self
            .signed_headers
            .clone()
            .unwrap_or_else(|| default_signed_headers(envelope));
        let message = signing_string(envelope, &headers)?;
        let signature = self.signing_key.sign(message.as_bytes());

        let params = SignatureParams {
            key_id: self.key_id.0.clone(),
            alg: SIGNATURE_ALGORITHM.to_string(),
            headers,
            signature: signature.to_bytes().to_vec(),
        };
        envelope.set_header(SIGNATURE_HEADER, params.to_header_value());
        Ok(())
    }
}

pub fn default_signed_headers(envelope: &SignedRequestEnvelope) -> Vec<String> {
    let mut headers: Vec<String> = MANDATORY_SIGNED_HEADERS
        .iter()
        .map(|h| h.to_string())
        .collect();
    if envelope.header(CONTENT_DIGEST_HEADER).is_some() {
        headers.push(CONTENT_DIGEST_HEADER.to_string());
    }
    headers
}

/// 16 random bytes, standard base64.
pub fn fresh_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    OsRng.fill_bytes(&mut bytes);
    encoding::encode(&bytes)
}
