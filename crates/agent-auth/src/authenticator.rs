use std::sync::Arc;

use chrono::{DateTime, Utc};
use ed25519_dalek::Signature;
use payguard_core_types::{window_duration, AgentId, KeyId, SharedClock};
use serde::Serialize;
use tracing::{debug, warn};

use crate::allow::AllowList;
use crate::canonical::signing_string;
use crate::config::AuthenticatorConfig;
use crate::digest::verify_content_digest;
use crate::envelope::SignedRequestEnvelope;
use crate::errors::AuthError;
use crate::headers::{
    parse_timestamp, validate_nonce, SignatureParams, AGENT_ID_HEADER, CONTENT_DIGEST_HEADER,
    MANDATORY_SIGNED_HEADERS, NONCE_HEADER, SIGNATURE_ALGORITHM, SIGNATURE_HEADER,
    TIMESTAMP_HEADER,
};
use crate::registry::{KeyRegistry, KeyRegistryError, StaticKeyRegistry};
use crate::replay::ReplayCache;

/// Identity attached to a request that passed every check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthenticatedAgent {
    pub agent_id: AgentId,
    pub key_id: KeyId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(AuthenticatedAgent),
    /// The gate is disabled by configuration; the request was not inspected.
    Bypassed,
}

impl AuthOutcome {
    pub fn agent(&self) -> Option<&AuthenticatedAgent> {
        match self {
            AuthOutcome::Authenticated(agent) => Some(agent),
            AuthOutcome::Bypassed => None,
        }
    }
}

/// Verifies signed agent requests against the key registry and the replay cache.
#[derive(Clone)]
pub struct RequestAuthenticator {
    enabled: bool,
    window_seconds: u64,
    registry: Arc<dyn KeyRegistry>,
    allow_list: AllowList,
    replay: ReplayCache,
    clock: SharedClock,
}

impl RequestAuthenticator {
    pub fn new(
        config: &AuthenticatorConfig,
        registry: Arc<dyn KeyRegistry>,
        replay: ReplayCache,
        clock: SharedClock,
    ) -> Self {
        if !config.enabled {
            warn!("request authentication is disabled; signed headers will not be checked");
        }
        Self {
            enabled: config.enabled,
            window_seconds: config.timestamp_window_seconds,
            registry,
            allow_list: AllowList::new(&config.allow_rules),
            replay: replay.with_ttl_at_least(window_duration(config.timestamp_window_seconds)),
            clock,
        }
    }

    /// Static registry and in-memory replay cache built from configuration.
    pub fn from_config(
        config: &AuthenticatorConfig,
        clock: SharedClock,
    ) -> Result<Self, KeyRegistryError> {
        let registry = StaticKeyRegistry::from_records(&config.keys)?;
        let ttl = window_duration(config.effective_replay_ttl_seconds());
        Ok(Self::new(
            config,
            Arc::new(registry),
            ReplayCache::in_memory(ttl),
            clock,
        ))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn window_seconds(&self) -> u64 {
        self.window_seconds
    }

    pub fn replay_cache(&self) -> &ReplayCache {
        &self.replay
    }

    /// Runs the ordered checks; the first failure wins.
    pub fn authenticate(&self, envelope: &SignedRequestEnvelope) -> Result<AuthOutcome, AuthError> {
        if !self.enabled {
            return Ok(AuthOutcome::Bypassed);
        }

        let agent_raw = require(envelope, AGENT_ID_HEADER)?;
        let timestamp_raw = require(envelope, TIMESTAMP_HEADER)?;
        let nonce = require(envelope, NONCE_HEADER)?;
        let signature_raw = require(envelope, SIGNATURE_HEADER)?;

        let params = SignatureParams::parse(signature_raw)?;
        let timestamp = parse_timestamp(timestamp_raw)?;
        validate_nonce(nonce)?;
        if params.alg != SIGNATURE_ALGORITHM {
            return Err(AuthError::InvalidSignature(format!(
                "unsupported algorithm {}",
                params.alg
            )));
        }

        let agent_id = AgentId::new(agent_raw);
        let key = match self.registry.resolve(&params.key_id) {
            Some(key) if key.is_active() => key,
            _ => return Err(AuthError::UnknownKid(params.key_id.clone())),
        };
        if key.agent_id != agent_id {
            return Err(AuthError::KidNotOwned {
                kid: params.key_id.clone(),
                agent_id: agent_id.0.clone(),
            });
        }

        let now = self.clock.now();
        let skew = (i128::from(now.timestamp()) - i128::from(timestamp)).abs();
        if skew > i128::from(self.window_seconds) {
            return Err(AuthError::TimestampSkew {
                skew_seconds: i64::try_from(skew).unwrap_or(i64::MAX),
                window_seconds: self.window_seconds,
            });
        }

        // Claimed before digest and signature checks; a forged request can burn a nonce.
        let signed_at = DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or(now);
        self.replay.claim(&agent_id, nonce, signed_at, now)?;

        self.check_body(envelope, &params)?;

        for mandatory in MANDATORY_SIGNED_HEADERS {
            if !params.covers(mandatory) {
                return Err(AuthError::InvalidSignature(format!(
                    "{mandatory} is not signed"
                )));
            }
        }

        let message = signing_string(envelope, &params.headers)?;
        let signature = Signature::from_slice(&params.signature)
            .map_err(|_| AuthError::InvalidSignature("signature must be 64 bytes".into()))?;
        key.verifying_key
            .verify_strict(message.as_bytes(), &signature)
            .map_err(|_| AuthError::InvalidSignature("verification failed".into()))?;

        if !self
            .allow_list
            .permits(&agent_id, envelope.method(), envelope.path())
        {
            return Err(AuthError::NotAllowed {
                agent_id: agent_id.0.clone(),
                method: envelope.method().to_string(),
                path: envelope.path().to_string(),
            });
        }

        debug!(agent_id = %agent_id, key_id = %key.key_id, "request authenticated");
        Ok(AuthOutcome::Authenticated(AuthenticatedAgent {
            agent_id,
            key_id: key.key_id,
        }))
    }

    fn check_body(
        &self,
        envelope: &SignedRequestEnvelope,
        params: &SignatureParams,
    ) -> Result<(), AuthError> {
        let digest = envelope.header(CONTENT_DIGEST_HEADER);
        if envelope.requires_digest() {
            let digest = digest.ok_or_else(|| {
                AuthError::InvalidDigest(format!(
                    "{} requests must send content-digest",
                    envelope.method()
                ))
            })?;
            verify_content_digest(digest, envelope.body())?;
            if !params.covers(CONTENT_DIGEST_HEADER) {
                return Err(AuthError::InvalidSignature(
                    "content-digest is not signed".into(),
                ));
            }
            return Ok(());
        }

        match digest {
            Some(digest) => verify_content_digest(digest, envelope.body()),
            None if params.covers(CONTENT_DIGEST_HEADER) => Err(AuthError::InvalidHeaderFormat(
                "signed content-digest is absent".into(),
            )),
            None => Ok(()),
        }
    }
}

fn require<'a>(envelope: &'a SignedRequestEnvelope, name: &str) -> Result<&'a str, AuthError> {
    match envelope.header(name) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim()),
        _ => Err(AuthError::MissingHeader(name.to_string())),
    }
}
